use std::collections::BTreeMap;

use serde::Serialize;

use cho_persistence::model::{DetailRow, WraRow};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WraTotals {
    pub population: i64,
    pub with_mfp_unmet_need: i64,
    pub accept_any_mfp: i64,
}

/// period -> age category -> totals
pub type WraChart = BTreeMap<String, BTreeMap<String, WraTotals>>;

pub fn summarize(rows: &[WraRow]) -> WraChart {
    let mut chart = WraChart::new();
    for row in rows {
        let totals = chart
            .entry(row.period().key())
            .or_default()
            .entry(row.age_category.clone())
            .or_default();
        totals.population = totals.population.saturating_add(row.population);
        totals.with_mfp_unmet_need = totals
            .with_mfp_unmet_need
            .saturating_add(row.with_mfp_unmet_need);
        totals.accept_any_mfp = totals.accept_any_mfp.saturating_add(row.accept_any_mfp);
    }
    chart
}
