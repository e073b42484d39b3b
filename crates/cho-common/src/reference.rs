//! Seeded reference data shared by migrations and the in-memory backend.

/// The nine barangays served by the health office.
pub const BARANGAYS: [&str; 9] = [
    "Poblacion",
    "San Isidro",
    "San Roque",
    "Santa Cruz",
    "San Jose",
    "Bagong Silang",
    "Mabini",
    "Rizal",
    "Del Pilar",
];

/// Age brackets used across M1 and M2 forms.
pub const AGE_CATEGORIES: [&str; 20] = [
    "0-6 days",
    "7-28 days",
    "29 days-11 months",
    "1-4",
    "5-9",
    "10-14",
    "15-19",
    "20-24",
    "25-29",
    "30-34",
    "35-39",
    "40-44",
    "45-49",
    "50-54",
    "55-59",
    "60-64",
    "65-69",
    "70+",
    "20-49",
    "10-49",
];

/// Family planning methods listed on the M1 form.
pub const FP_METHODS: [&str; 14] = [
    "BTL",
    "NSV",
    "Condom",
    "Pills-POP",
    "Pills-COC",
    "Injectables (DMPA/POI)",
    "Implant",
    "IUD-Interval",
    "IUD-PP",
    "NFP-LAM",
    "NFP-BBT",
    "NFP-CMM",
    "NFP-STM",
    "NFP-SDM",
];

pub const APPOINTMENT_CATEGORIES: [&str; 6] = [
    "General Consultation",
    "Prenatal Check-up",
    "Immunization",
    "Family Planning",
    "Dental",
    "Laboratory",
];

pub fn is_fp_method(name: &str) -> bool {
    FP_METHODS.iter().any(|m| m.eq_ignore_ascii_case(name.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_sets_have_no_duplicates() {
        for set in [&BARANGAYS[..], &AGE_CATEGORIES[..], &FP_METHODS[..]] {
            let mut names: Vec<&str> = set.to_vec();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), set.len());
        }
    }

    #[test]
    fn test_is_fp_method_ignores_case() {
        assert!(is_fp_method("pills-pop"));
        assert!(is_fp_method(" Condom "));
        assert!(!is_fp_method("Herbal"));
    }
}
