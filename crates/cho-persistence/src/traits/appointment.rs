//! Appointment persistence trait

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use crate::model::{
    AppointmentCategoryInfo, AppointmentInfo, AppointmentQuery, AppointmentStatus,
    NewAppointment, Page,
};

#[async_trait]
pub trait AppointmentPersistence: Send + Sync {
    async fn appointment_category_find_all(&self) -> anyhow::Result<Vec<AppointmentCategoryInfo>>;

    async fn appointment_category_find_by_id(
        &self,
        id: i64,
    ) -> anyhow::Result<Option<AppointmentCategoryInfo>>;

    /// A booking that is not cancelled for the same email, category and date
    async fn appointment_find_live(
        &self,
        email: &str,
        category_id: i64,
        date: NaiveDate,
    ) -> anyhow::Result<Option<AppointmentInfo>>;

    async fn appointment_create(
        &self,
        appointment: NewAppointment,
        now: NaiveDateTime,
    ) -> anyhow::Result<AppointmentInfo>;

    async fn appointment_find_by_id(&self, id: i64) -> anyhow::Result<Option<AppointmentInfo>>;

    /// Ordered by date, then time
    async fn appointment_find_page(
        &self,
        query: &AppointmentQuery,
        page_no: u64,
        page_size: u64,
    ) -> anyhow::Result<Page<AppointmentInfo>>;

    async fn appointment_update_status(
        &self,
        id: i64,
        status: AppointmentStatus,
        now: NaiveDateTime,
    ) -> anyhow::Result<Option<AppointmentInfo>>;
}
