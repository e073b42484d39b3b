//! Barangay and reference-data persistence trait

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::model::{AgeCategoryInfo, BarangayInfo};

#[async_trait]
pub trait BarangayPersistence: Send + Sync {
    /// All barangays ordered by name
    async fn barangay_find_all(&self) -> anyhow::Result<Vec<BarangayInfo>>;

    async fn barangay_find_by_id(&self, id: i64) -> anyhow::Result<Option<BarangayInfo>>;

    async fn barangay_find_by_name(&self, name: &str) -> anyhow::Result<Option<BarangayInfo>>;

    async fn barangay_create(&self, name: &str, now: NaiveDateTime)
    -> anyhow::Result<BarangayInfo>;

    async fn barangay_update(
        &self,
        id: i64,
        name: &str,
        now: NaiveDateTime,
    ) -> anyhow::Result<Option<BarangayInfo>>;

    /// True when users or report submissions point at the barangay
    async fn barangay_is_referenced(&self, id: i64) -> anyhow::Result<bool>;

    async fn barangay_delete(&self, id: i64) -> anyhow::Result<bool>;

    /// Age categories ordered by id
    async fn age_category_find_all(&self) -> anyhow::Result<Vec<AgeCategoryInfo>>;
}
