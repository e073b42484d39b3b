//! HTTP handlers

pub mod appointment;
pub mod auth;
pub mod barangay;
pub mod health;
pub mod report;
pub mod route;
pub mod status;
pub mod submission;
pub mod user;
