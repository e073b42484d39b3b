//! Barangay maintenance

use std::sync::Arc;

use tracing::info;

use cho_common::{ChoError, Clock, validate_request};
use cho_persistence::PersistenceService;
use cho_persistence::model::{AgeCategoryInfo, BarangayInfo};

use crate::model::BarangayRequest;

#[derive(Clone)]
pub struct BarangayService {
    persistence: Arc<dyn PersistenceService>,
    clock: Arc<dyn Clock>,
}

impl BarangayService {
    pub fn new(persistence: Arc<dyn PersistenceService>, clock: Arc<dyn Clock>) -> Self {
        Self { persistence, clock }
    }

    pub async fn list(&self) -> anyhow::Result<Vec<BarangayInfo>> {
        self.persistence.barangay_find_all().await
    }

    pub async fn get(&self, id: i64) -> anyhow::Result<BarangayInfo> {
        self.persistence
            .barangay_find_by_id(id)
            .await?
            .ok_or_else(|| ChoError::NotFound(format!("barangay {}", id)).into())
    }

    pub async fn create(&self, request: BarangayRequest) -> anyhow::Result<BarangayInfo> {
        validate_request(&request)?;
        let barangay = self
            .persistence
            .barangay_create(request.name.trim(), self.clock.now())
            .await?;
        info!(barangay_id = barangay.id, name = %barangay.name, "barangay created");
        Ok(barangay)
    }

    pub async fn update(&self, id: i64, request: BarangayRequest) -> anyhow::Result<BarangayInfo> {
        validate_request(&request)?;
        self.persistence
            .barangay_update(id, request.name.trim(), self.clock.now())
            .await?
            .ok_or_else(|| ChoError::NotFound(format!("barangay {}", id)).into())
    }

    /// Barangays still referenced by users or submissions are kept.
    pub async fn delete(&self, id: i64) -> anyhow::Result<()> {
        self.get(id).await?;
        if self.persistence.barangay_is_referenced(id).await? {
            return Err(ChoError::Conflict(
                "The barangay is still referenced by users or report submissions.".to_string(),
            )
            .into());
        }
        self.persistence.barangay_delete(id).await?;
        info!(barangay_id = id, "barangay deleted");
        Ok(())
    }

    pub async fn age_categories(&self) -> anyhow::Result<Vec<AgeCategoryInfo>> {
        self.persistence.age_category_find_all().await
    }
}
