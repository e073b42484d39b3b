//! Business services of the reporting workflow

mod appointment;
mod barangay;
mod report;
mod status;
mod submission;

pub use appointment::AppointmentService;
pub use barangay::BarangayService;
pub use report::ReportService;
pub use status::StatusService;
pub use submission::SubmissionService;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    use chrono::{NaiveDate, NaiveDateTime};

    use cho_auth::Principal;
    use cho_common::{ChoError, Clock, FixedClock};
    use cho_persistence::model::{NewUser, ReportType, Role, SubmissionQuery, UserInfo, UserStatus};
    use cho_persistence::{MemoryPersistService, SubmissionPersistence, UserPersistence};

    use super::*;
    use crate::model::{CreateSubmissionRequest, SubmitReportRequest, SubmitReportResult};
    use crate::notice::{DEFAULT_LEAD_DAYS, LogNoticeSender, NoticeJob};

    pub fn at(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(hour, 0, 0))
            .unwrap()
    }

    pub fn error_code(err: &anyhow::Error) -> &'static str {
        err.downcast_ref::<ChoError>()
            .unwrap_or_else(|| panic!("not a ChoError: {err}"))
            .error_code()
            .code
    }

    pub struct TestContext {
        pub persistence: Arc<MemoryPersistService>,
        pub clock: Arc<FixedClock>,
        pub admin: Principal,
        pub submissions: SubmissionService,
        pub statuses: StatusService,
        pub reports: ReportService,
        pub barangays: BarangayService,
        pub appointments: AppointmentService,
        users: AtomicU64,
    }

    impl TestContext {
        pub async fn new(now: NaiveDateTime) -> Self {
            let persistence = Arc::new(MemoryPersistService::seeded(now));
            let clock = Arc::new(FixedClock::new(now));
            let notice = Arc::new(NoticeJob::new(
                persistence.clone(),
                clock.clone(),
                Arc::new(LogNoticeSender),
                DEFAULT_LEAD_DAYS,
            ));
            let admin = persistence
                .user_create(
                    NewUser {
                        name: "Admin".to_string(),
                        email: "admin@cho.gov.ph".to_string(),
                        password_hash: "unused".to_string(),
                        role: Role::Admin,
                        barangay_id: None,
                    },
                    now,
                )
                .await
                .unwrap();

            Self {
                submissions: SubmissionService::new(
                    persistence.clone(),
                    clock.clone(),
                    Some(notice),
                ),
                statuses: StatusService::new(persistence.clone(), clock.clone()),
                reports: ReportService::new(persistence.clone()),
                barangays: BarangayService::new(persistence.clone(), clock.clone()),
                appointments: AppointmentService::new(persistence.clone(), clock.clone()),
                admin: Principal {
                    user: admin,
                    token_id: "admin-token".to_string(),
                },
                persistence,
                clock,
                users: AtomicU64::new(0),
            }
        }

        /// A context with the batch of one period already created
        pub async fn with_period(now: NaiveDateTime, year: i32, month: u32, due_date: &str) -> Self {
            let ctx = Self::new(now).await;
            ctx.submissions
                .create(
                    ctx.admin.id(),
                    CreateSubmissionRequest {
                        report_year: year,
                        report_month: month,
                        due_date: due_date.to_string(),
                    },
                )
                .await
                .unwrap();
            ctx
        }

        pub async fn user(&self, role: Role, barangay_id: Option<i64>) -> Principal {
            let n = self.users.fetch_add(1, Ordering::SeqCst);
            let user = self
                .persistence
                .user_create(
                    NewUser {
                        name: format!("User {n}"),
                        email: format!("user{n}@cho.gov.ph"),
                        password_hash: "unused".to_string(),
                        role,
                        barangay_id,
                    },
                    self.clock.now(),
                )
                .await
                .unwrap();
            Principal {
                token_id: format!("token-{n}"),
                user,
            }
        }

        /// An encoder record that lost its barangay
        pub fn orphan_encoder(&self) -> Principal {
            let now = self.clock.now();
            Principal {
                user: UserInfo {
                    id: 9_000,
                    name: "Orphan".to_string(),
                    email: "orphan@cho.gov.ph".to_string(),
                    password: String::new(),
                    role: Role::Encoder,
                    barangay_id: None,
                    barangay_name: None,
                    status: UserStatus::Active,
                    created_at: now,
                    updated_at: now,
                },
                token_id: "orphan-token".to_string(),
            }
        }

        pub async fn submission_id(&self, barangay_id: i64, report_type: &str) -> i64 {
            let report_type: ReportType = report_type.parse().unwrap();
            self.persistence
                .submission_find(&SubmissionQuery {
                    barangay_id: Some(barangay_id),
                    report_type: Some(report_type),
                    ..Default::default()
                })
                .await
                .unwrap()
                .first()
                .map(|row| row.id)
                .unwrap()
        }

        pub async fn submit_m1(
            &self,
            principal: &Principal,
            submission_id: i64,
        ) -> anyhow::Result<Vec<SubmitReportResult>> {
            let request: SubmitReportRequest = serde_json::from_value(serde_json::json!({
                "m1ReportId": submission_id,
                "m1Report": {
                    "wra": [{"age_category": "15-19", "population": 120}],
                    "familyPlanning": [{"age_category": "20-24", "fp_method": "Condom", "current_users_end": 4}],
                    "serviceData": [{"service_name": "Immunization", "indicator": "BCG", "male": 3, "female": 2}]
                }
            }))?;
            self.statuses.submit(principal, request).await
        }
    }
}
