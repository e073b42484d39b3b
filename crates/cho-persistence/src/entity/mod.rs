//! `SeaORM` entities

pub mod prelude;

pub mod age_categories;
pub mod appointment_categories;
pub mod appointments;
pub mod barangays;
pub mod family_planning_reports;
pub mod morbidity_reports;
pub mod personal_access_tokens;
pub mod report_statuses;
pub mod report_submission_templates;
pub mod report_submissions;
pub mod service_data;
pub mod users;
pub mod women_of_reproductive_ages;
