use std::collections::BTreeMap;

use cho_persistence::model::{DetailRow, ServiceDataRow};

use super::SexTotals;

/// period -> service -> indicator -> totals
pub type ServiceDataChart = BTreeMap<String, BTreeMap<String, BTreeMap<String, SexTotals>>>;

pub fn summarize(rows: &[ServiceDataRow]) -> ServiceDataChart {
    let mut chart = ServiceDataChart::new();
    for row in rows {
        chart
            .entry(row.period().key())
            .or_default()
            .entry(row.service_name.clone())
            .or_default()
            .entry(row.indicator.clone())
            .or_default()
            .add(row.male, row.female);
    }
    chart
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::fixtures::{JUNE, Labels};

    fn row(labels: Labels, service: &str, indicator: &str, male: i64, female: i64) -> ServiceDataRow {
        ServiceDataRow {
            id: 0,
            report_status_id: labels.0,
            report_status: labels.1.to_string(),
            barangay_id: labels.2,
            barangay_name: "Poblacion".to_string(),
            report_year: labels.3,
            report_month: labels.4,
            age_category: None,
            service_name: service.to_string(),
            indicator: indicator.to_string(),
            male,
            female,
            remarks: None,
        }
    }

    #[test]
    fn test_nested_service_indicator_totals() {
        let chart = summarize(&[
            row(JUNE, "Immunization", "BCG", 3, 4),
            row(JUNE, "Immunization", "BCG", 1, 0),
            row(JUNE, "Immunization", "Penta 1", 2, 2),
            row(JUNE, "Nutrition", "Vitamin A", 5, 6),
        ]);

        let june = &chart["2024-06"];
        assert_eq!(june["Immunization"]["BCG"].total, 8);
        assert_eq!(june["Immunization"]["Penta 1"].male, 2);
        assert_eq!(june["Nutrition"]["Vitamin A"].female, 6);
    }
}
