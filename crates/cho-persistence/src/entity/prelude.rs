//! `SeaORM` Entity prelude

pub use super::age_categories::Entity as AgeCategories;
pub use super::appointment_categories::Entity as AppointmentCategories;
pub use super::appointments::Entity as Appointments;
pub use super::barangays::Entity as Barangays;
pub use super::family_planning_reports::Entity as FamilyPlanningReports;
pub use super::morbidity_reports::Entity as MorbidityReports;
pub use super::personal_access_tokens::Entity as PersonalAccessTokens;
pub use super::report_statuses::Entity as ReportStatuses;
pub use super::report_submission_templates::Entity as ReportSubmissionTemplates;
pub use super::report_submissions::Entity as ReportSubmissions;
pub use super::service_data::Entity as ServiceData;
pub use super::users::Entity as Users;
pub use super::women_of_reproductive_ages::Entity as WomenOfReproductiveAges;
