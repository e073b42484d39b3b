//! Domain model types for the persistence abstraction layer
//!
//! These types are used as arguments and return values of the persistence
//! traits, decoupled from the storage backend. Joined read models derive
//! `FromQueryResult` so the SQL backend can select straight into them.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};

use cho_common::ChoError;
use cho_common::period::{ReportPeriod, is_late};

/// Declares a string-backed enum whose wire value is also its column value.
macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident => $value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $value)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($value => Ok($name::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($name), s)),
                }
            }
        }
    };
}

string_enum!(
    /// Account role
    Role {
        Admin => "admin",
        Encoder => "encoder",
    }
);

string_enum!(
    UserStatus {
        Active => "active",
        Disabled => "disabled",
    }
);

string_enum!(
    /// M1 carries program accomplishments, M2 carries morbidity
    ReportType {
        M1 => "m1",
        M2 => "m2",
    }
);

string_enum!(
    /// Lifecycle of a report submission slot
    SubmissionStatus {
        Pending => "pending",
        Submitted => "submitted",
        SubmittedLate => "submitted late",
    }
);

string_enum!(
    /// Approval state of a submission event
    ReportStatusKind {
        Pending => "pending",
        Overdue => "overdue",
        ForVerification => "for verification",
        Approved => "approved",
        Rejected => "rejected",
    }
);

string_enum!(
    AppointmentStatus {
        Pending => "pending",
        Confirmed => "confirmed",
        Completed => "completed",
        Cancelled => "cancelled",
    }
);

string_enum!(
    /// Storage mode for the persistence layer
    StorageMode {
        /// External database (MySQL/PostgreSQL via SeaORM)
        Sql => "sql",
        /// Process-local store, used for tests and demos
        Memory => "memory",
    }
);

impl SubmissionStatus {
    /// The state a pending submission moves to when submitted at `submitted_at`.
    pub fn resolve(submitted_at: NaiveDateTime, due_at: NaiveDateTime) -> Self {
        if is_late(submitted_at, due_at) {
            SubmissionStatus::SubmittedLate
        } else {
            SubmissionStatus::Submitted
        }
    }

    pub fn is_submitted(&self) -> bool {
        !matches!(self, SubmissionStatus::Pending)
    }
}

/// Parses a stored enum column, surfacing corrupt values as errors.
pub fn parse_column<T>(value: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    value.parse::<T>().map_err(|e| anyhow::anyhow!(e))
}

/// Generic paginated result
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub total_count: u64,
    pub page_number: u64,
    pub pages_available: u64,
    pub page_items: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(total_count: u64, page_number: u64, page_size: u64, page_items: Vec<T>) -> Self {
        Self {
            total_count,
            page_number,
            pages_available: if page_size > 0 {
                total_count.div_ceil(page_size)
            } else {
                0
            },
            page_items,
        }
    }

    pub fn empty() -> Self {
        Self {
            total_count: 0,
            page_number: 0,
            pages_available: 0,
            page_items: Vec::new(),
        }
    }
}

// ==================== Reference data ====================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarangayInfo {
    pub id: i64,
    pub name: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeCategoryInfo {
    pub id: i64,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentCategoryInfo {
    pub id: i64,
    pub name: String,
}

/// Age category name -> id, loaded once per submission transaction.
#[derive(Clone, Debug, Default)]
pub struct AgeCategoryMap {
    ids: HashMap<String, i64>,
}

impl AgeCategoryMap {
    pub fn new(categories: impl IntoIterator<Item = (String, i64)>) -> Self {
        Self {
            ids: categories
                .into_iter()
                .map(|(name, id)| (name.trim().to_lowercase(), id))
                .collect(),
        }
    }

    pub fn resolve(&self, name: &str) -> Result<i64, ChoError> {
        self.ids
            .get(&name.trim().to_lowercase())
            .copied()
            .ok_or_else(|| ChoError::InternalError(format!("Unknown age category: {}", name)))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

// ==================== Users & tokens ====================

/// User as returned from persistence. The password hash never leaves the server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    pub role: Role,
    pub barangay_id: Option<i64>,
    pub barangay_name: Option<String>,
    pub status: UserStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl UserInfo {
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }
}

#[derive(Clone, Debug, Default)]
pub struct UserQuery {
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
    pub barangay_id: Option<i64>,
    /// Substring of name or email
    pub search: Option<String>,
}

#[derive(Clone, Debug)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub barangay_id: Option<i64>,
}

/// Full replacement of the editable user columns; `password_hash` keeps the old hash when `None`.
#[derive(Clone, Debug)]
pub struct UserChanges {
    pub name: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub role: Role,
    pub barangay_id: Option<i64>,
}

/// Personal access token row backing an issued JWT
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenInfo {
    pub id: i64,
    pub user_id: i64,
    pub token_id: String,
    pub name: String,
    pub last_used_at: Option<NaiveDateTime>,
    pub expires_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Debug)]
pub struct NewToken {
    pub user_id: i64,
    pub token_id: String,
    pub name: String,
    pub expires_at: NaiveDateTime,
}

// ==================== Appointments ====================

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppointmentInfo {
    pub id: i64,
    pub appointment_category_id: i64,
    pub category_name: String,
    pub full_name: String,
    pub email: String,
    pub contact_number: String,
    pub appointment_date: NaiveDate,
    pub appointment_time: Option<NaiveTime>,
    pub notes: Option<String>,
    pub status: AppointmentStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Clone, Debug)]
pub struct NewAppointment {
    pub appointment_category_id: i64,
    pub full_name: String,
    pub email: String,
    pub contact_number: String,
    pub appointment_date: NaiveDate,
    pub appointment_time: Option<NaiveTime>,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct AppointmentQuery {
    pub date: Option<NaiveDate>,
    pub category_id: Option<i64>,
    pub status: Option<AppointmentStatus>,
}

// ==================== Submissions ====================

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TemplateInfo {
    pub id: i64,
    pub admin_id: i64,
    pub report_type: ReportType,
    pub report_year: i32,
    pub report_month: i32,
    pub created_at: NaiveDateTime,
}

/// A template pair plus its per-barangay fan-out, created in one transaction
#[derive(Clone, Debug)]
pub struct NewSubmissionBatch {
    pub admin_id: i64,
    pub period: ReportPeriod,
    pub due_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubmissionBatch {
    pub templates: Vec<TemplateInfo>,
    pub submissions_created: u64,
    pub due_at: NaiveDateTime,
}

/// Submission joined with its template, barangay and (once submitted) status row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, FromQueryResult)]
pub struct SubmissionRow {
    pub id: i64,
    pub report_submission_template_id: i64,
    pub barangay_id: i64,
    pub barangay_name: String,
    pub report_type: String,
    pub report_year: i32,
    pub report_month: i32,
    pub status: String,
    pub due_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub report_status_id: Option<i64>,
    pub report_status: Option<String>,
    pub submitted_at: Option<NaiveDateTime>,
    pub submitted_by: Option<i64>,
}

impl SubmissionRow {
    pub fn period(&self) -> ReportPeriod {
        ReportPeriod {
            year: self.report_year,
            month: self.report_month as u32,
        }
    }

    pub fn submission_status(&self) -> anyhow::Result<SubmissionStatus> {
        parse_column(&self.status)
    }

    pub fn report_type(&self) -> anyhow::Result<ReportType> {
        parse_column(&self.report_type)
    }
}

#[derive(Clone, Debug, Default)]
pub struct SubmissionQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub barangay_id: Option<i64>,
    pub report_type: Option<ReportType>,
    /// Matches any of these stored statuses; empty means all
    pub statuses: Vec<SubmissionStatus>,
    /// Only submissions due at or before this instant
    pub due_before: Option<NaiveDateTime>,
}

/// Earliest and latest report periods over all templates
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodBounds {
    pub min: Option<ReportPeriod>,
    pub max: Option<ReportPeriod>,
}

// ==================== Report statuses & details ====================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, FromQueryResult)]
pub struct StatusRow {
    pub id: i64,
    pub report_submission_id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub status: String,
    pub submitted_at: NaiveDateTime,
    pub admin_note: Option<String>,
    pub projected_population: Option<i64>,
    pub barangay_id: i64,
    pub barangay_name: String,
    pub report_type: String,
    pub report_year: i32,
    pub report_month: i32,
    pub submission_status: String,
    pub due_at: NaiveDateTime,
}

#[derive(Clone, Debug, Default)]
pub struct StatusQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub barangay_id: Option<i64>,
    pub status: Option<ReportStatusKind>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedBounds {
    pub earliest: Option<NaiveDateTime>,
    pub latest: Option<NaiveDateTime>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WraEntry {
    pub age_category: String,
    pub population: i64,
    pub with_mfp_unmet_need: i64,
    pub accept_any_mfp: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyPlanningEntry {
    pub age_category: String,
    pub fp_method: String,
    pub current_users_beginning: i64,
    pub new_acceptors_previous_month: i64,
    pub other_acceptors_present_month: i64,
    pub drop_outs_present_month: i64,
    pub current_users_end: i64,
    pub new_acceptors_present_month: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDataEntry {
    pub age_category: Option<String>,
    pub service_name: String,
    pub indicator: String,
    pub male: i64,
    pub female: i64,
    pub remarks: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MorbidityEntry {
    pub age_category: String,
    pub disease_name: String,
    pub male: i64,
    pub female: i64,
}

/// Detail rows of one report, by form type
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReportDetails {
    M1 {
        wra: Vec<WraEntry>,
        family_planning: Vec<FamilyPlanningEntry>,
        service_data: Vec<ServiceDataEntry>,
    },
    M2 {
        morbidity: Vec<MorbidityEntry>,
    },
}

impl ReportDetails {
    pub fn report_type(&self) -> ReportType {
        match self {
            ReportDetails::M1 { .. } => ReportType::M1,
            ReportDetails::M2 { .. } => ReportType::M2,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SubmitEntry {
    pub submission_id: i64,
    pub details: ReportDetails,
}

/// Everything one submit request writes, applied in a single transaction
#[derive(Clone, Debug)]
pub struct SubmitBundle {
    pub user_id: i64,
    pub submitted_at: NaiveDateTime,
    pub projected_population: Option<i64>,
    pub entries: Vec<SubmitEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitOutcome {
    pub submission_id: i64,
    pub report_status_id: i64,
    pub status: SubmissionStatus,
}

/// Filters shared by the detail fetches
#[derive(Clone, Debug, Default)]
pub struct DetailQuery {
    pub barangay_id: Option<i64>,
    pub year: Option<i32>,
    /// Inclusive period window
    pub range: Option<(ReportPeriod, ReportPeriod)>,
    pub exclude_rejected: bool,
}

impl DetailQuery {
    /// Applies the filters that are not expressible as plain column equality.
    pub fn accepts(&self, period: ReportPeriod, report_status: &str) -> bool {
        if let Some((start, end)) = &self.range
            && !period.within(start, end)
        {
            return false;
        }
        !(self.exclude_rejected && report_status == ReportStatusKind::Rejected.as_str())
    }
}

/// Labels every detail row carries.
pub trait DetailRow {
    fn period(&self) -> ReportPeriod;
    fn barangay_id(&self) -> i64;
    fn report_status(&self) -> &str;
}

macro_rules! detail_row {
    ($(#[$meta:meta])* $name:ident { $($field:ident : $ty:ty),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, FromQueryResult)]
        pub struct $name {
            pub id: i64,
            pub report_status_id: i64,
            pub report_status: String,
            pub barangay_id: i64,
            pub barangay_name: String,
            pub report_year: i32,
            pub report_month: i32,
            $(pub $field: $ty,)+
        }

        impl DetailRow for $name {
            fn period(&self) -> ReportPeriod {
                ReportPeriod {
                    year: self.report_year,
                    month: self.report_month as u32,
                }
            }

            fn barangay_id(&self) -> i64 {
                self.barangay_id
            }

            fn report_status(&self) -> &str {
                &self.report_status
            }
        }
    };
}

detail_row!(FamilyPlanningRow {
    age_category: String,
    fp_method: String,
    current_users_beginning: i64,
    new_acceptors_previous_month: i64,
    other_acceptors_present_month: i64,
    drop_outs_present_month: i64,
    current_users_end: i64,
    new_acceptors_present_month: i64,
});

detail_row!(MorbidityRow {
    age_category: String,
    disease_name: String,
    male: i64,
    female: i64,
});

detail_row!(ServiceDataRow {
    age_category: Option<String>,
    service_name: String,
    indicator: String,
    male: i64,
    female: i64,
    remarks: Option<String>,
});

detail_row!(
    /// Women of reproductive age
    WraRow {
        age_category: String,
        population: i64,
        with_mfp_unmet_need: i64,
        accept_any_mfp: i64,
    }
);
