//! Public appointment booking and staff follow-up

use std::sync::Arc;

use tracing::info;

use cho_common::period::parse_date;
use cho_common::{ChoError, Clock, DEFAULT_PAGE_SIZE, validate_request};
use cho_persistence::PersistenceService;
use cho_persistence::model::{
    AppointmentCategoryInfo, AppointmentInfo, AppointmentQuery, NewAppointment, Page,
};

use crate::model::{AppointmentListQuery, AppointmentStatusRequest, BookAppointmentRequest};

#[derive(Clone)]
pub struct AppointmentService {
    persistence: Arc<dyn PersistenceService>,
    clock: Arc<dyn Clock>,
}

impl AppointmentService {
    pub fn new(persistence: Arc<dyn PersistenceService>, clock: Arc<dyn Clock>) -> Self {
        Self { persistence, clock }
    }

    pub async fn categories(&self) -> anyhow::Result<Vec<AppointmentCategoryInfo>> {
        self.persistence.appointment_category_find_all().await
    }

    pub async fn book(&self, request: BookAppointmentRequest) -> anyhow::Result<AppointmentInfo> {
        validate_request(&request)?;
        let date = parse_date("appointment_date", &request.appointment_date)?;
        if date < self.clock.today() {
            return Err(ChoError::validation(
                "appointment_date",
                "The appointment date must be today or a later date.",
            )
            .into());
        }

        if self
            .persistence
            .appointment_category_find_by_id(request.appointment_category_id)
            .await?
            .is_none()
        {
            return Err(ChoError::validation(
                "appointment_category_id",
                "The selected appointment category is invalid.",
            )
            .into());
        }

        let email = request.email.trim().to_lowercase();
        if self
            .persistence
            .appointment_find_live(&email, request.appointment_category_id, date)
            .await?
            .is_some()
        {
            return Err(ChoError::DuplicateAppointment.into());
        }

        let appointment = self
            .persistence
            .appointment_create(
                NewAppointment {
                    appointment_category_id: request.appointment_category_id,
                    full_name: request.full_name.trim().to_string(),
                    email,
                    contact_number: request.contact_number.trim().to_string(),
                    appointment_date: date,
                    appointment_time: request.appointment_time,
                    notes: request.notes.filter(|n| !n.trim().is_empty()),
                },
                self.clock.now(),
            )
            .await?;

        info!(
            appointment_id = appointment.id,
            category = %appointment.category_name,
            date = %appointment.appointment_date,
            "appointment booked"
        );
        Ok(appointment)
    }

    pub async fn list(&self, query: AppointmentListQuery) -> anyhow::Result<Page<AppointmentInfo>> {
        let date = query
            .date
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .map(|d| parse_date("date", d))
            .transpose()?;
        self.persistence
            .appointment_find_page(
                &AppointmentQuery {
                    date,
                    category_id: query.category_id,
                    status: query.status,
                },
                query.page_no.unwrap_or(1).max(1),
                query.page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 500),
            )
            .await
    }

    pub async fn get(&self, id: i64) -> anyhow::Result<AppointmentInfo> {
        self.persistence
            .appointment_find_by_id(id)
            .await?
            .ok_or_else(|| ChoError::NotFound(format!("appointment {}", id)).into())
    }

    pub async fn update_status(
        &self,
        id: i64,
        request: AppointmentStatusRequest,
    ) -> anyhow::Result<AppointmentInfo> {
        let appointment = self
            .persistence
            .appointment_update_status(id, request.status, self.clock.now())
            .await?
            .ok_or_else(|| ChoError::NotFound(format!("appointment {}", id)))?;
        info!(appointment_id = id, status = %request.status, "appointment status updated");
        Ok(appointment)
    }
}
