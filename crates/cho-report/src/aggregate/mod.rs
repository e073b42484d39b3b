//! Chart aggregates over report detail rows
//!
//! Each reducer groups rows by report period (`YYYY-MM`) and then by the
//! sub-dimension its chart plots. Input rows are expected to be filtered
//! already; the reducers only add.

pub mod family_planning;
pub mod morbidity;
pub mod service_data;
pub mod wra;

use serde::Serialize;

pub use family_planning::{FamilyPlanningChart, FamilyPlanningTotals};
pub use morbidity::{MorbidityChart, MorbidityTotals};
pub use service_data::ServiceDataChart;
pub use wra::{WraChart, WraTotals};

/// Male and female counts with their sum; sums saturate at `i64::MAX`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SexTotals {
    pub male: i64,
    pub female: i64,
    pub total: i64,
}

impl SexTotals {
    pub fn add(&mut self, male: i64, female: i64) {
        self.male = self.male.saturating_add(male);
        self.female = self.female.saturating_add(female);
        self.total = self.total.saturating_add(male.saturating_add(female));
    }
}
