use std::collections::BTreeMap;

use serde::Serialize;

use cho_persistence::model::{DetailRow, MorbidityRow};

use super::SexTotals;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MorbidityTotals {
    #[serde(flatten)]
    pub totals: SexTotals,
    pub by_age_category: BTreeMap<String, SexTotals>,
}

/// period -> disease -> totals
pub type MorbidityChart = BTreeMap<String, BTreeMap<String, MorbidityTotals>>;

pub fn summarize(rows: &[MorbidityRow]) -> MorbidityChart {
    let mut chart = MorbidityChart::new();
    for row in rows {
        let disease = chart
            .entry(row.period().key())
            .or_default()
            .entry(row.disease_name.clone())
            .or_default();
        disease.totals.add(row.male, row.female);
        disease
            .by_age_category
            .entry(row.age_category.clone())
            .or_default()
            .add(row.male, row.female);
    }
    chart
}
