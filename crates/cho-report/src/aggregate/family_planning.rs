use std::collections::BTreeMap;

use serde::Serialize;

use cho_persistence::model::{DetailRow, FamilyPlanningRow};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FamilyPlanningTotals {
    pub current_users_beginning: i64,
    pub new_acceptors_previous_month: i64,
    pub other_acceptors_present_month: i64,
    pub drop_outs_present_month: i64,
    pub current_users_end: i64,
    pub new_acceptors_present_month: i64,
}

/// period -> fp method -> totals
pub type FamilyPlanningChart = BTreeMap<String, BTreeMap<String, FamilyPlanningTotals>>;

pub fn summarize(rows: &[FamilyPlanningRow]) -> FamilyPlanningChart {
    let mut chart = FamilyPlanningChart::new();
    for row in rows {
        let totals = chart
            .entry(row.period().key())
            .or_default()
            .entry(row.fp_method.clone())
            .or_default();
        totals.current_users_beginning = totals
            .current_users_beginning
            .saturating_add(row.current_users_beginning);
        totals.new_acceptors_previous_month = totals
            .new_acceptors_previous_month
            .saturating_add(row.new_acceptors_previous_month);
        totals.other_acceptors_present_month = totals
            .other_acceptors_present_month
            .saturating_add(row.other_acceptors_present_month);
        totals.drop_outs_present_month = totals
            .drop_outs_present_month
            .saturating_add(row.drop_outs_present_month);
        totals.current_users_end = totals.current_users_end.saturating_add(row.current_users_end);
        totals.new_acceptors_present_month = totals
            .new_acceptors_present_month
            .saturating_add(row.new_acceptors_present_month);
    }
    chart
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::fixtures::{JULY, JUNE, Labels};

    fn row(labels: Labels, age: &str, method: &str, users_end: i64, new_present: i64) -> FamilyPlanningRow {
        FamilyPlanningRow {
            id: 0,
            report_status_id: labels.0,
            report_status: labels.1.to_string(),
            barangay_id: labels.2,
            barangay_name: "Poblacion".to_string(),
            report_year: labels.3,
            report_month: labels.4,
            age_category: age.to_string(),
            fp_method: method.to_string(),
            current_users_beginning: 1,
            new_acceptors_previous_month: 0,
            other_acceptors_present_month: 0,
            drop_outs_present_month: 0,
            current_users_end: users_end,
            new_acceptors_present_month: new_present,
        }
    }

    #[test]
    fn test_groups_by_period_then_method() {
        let chart = summarize(&[
            row(JUNE, "15-19", "Condom", 4, 1),
            row(JUNE, "20-24", "Condom", 6, 2),
            row(JUNE, "20-24", "Implant", 1, 1),
            row(JULY, "20-24", "Condom", 5, 0),
        ]);

        assert_eq!(chart.len(), 2);
        let june = &chart["2024-06"];
        assert_eq!(june["Condom"].current_users_end, 10);
        assert_eq!(june["Condom"].new_acceptors_present_month, 3);
        assert_eq!(june["Condom"].current_users_beginning, 2);
        assert_eq!(june["Implant"].current_users_end, 1);
        assert_eq!(chart["2024-07"]["Condom"].current_users_end, 5);
    }

    #[test]
    fn test_counts_saturate() {
        let chart = summarize(&[
            row(JUNE, "20-24", "Condom", i64::MAX, 1),
            row(JUNE, "25-29", "Condom", 1, 1),
        ]);
        assert_eq!(chart["2024-06"]["Condom"].current_users_end, i64::MAX);
        assert_eq!(chart["2024-06"]["Condom"].new_acceptors_present_month, 2);
    }

    #[test]
    fn test_empty_input() {
        assert!(summarize(&[]).is_empty());
    }
}
