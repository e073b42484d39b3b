use actix_web::{Scope, web};

pub fn routes(context_path: &str) -> Scope {
    web::scope(context_path)
        // sessions
        .service(super::auth::login)
        .service(super::auth::logout)
        .service(super::auth::check)
        .service(super::auth::current_user)
        // reference data
        .service(super::barangay::list)
        .service(super::barangay::get)
        .service(super::barangay::create)
        .service(super::barangay::update)
        .service(super::barangay::remove)
        .service(super::barangay::age_categories)
        // accounts
        .service(super::user::search_page)
        .service(super::user::get)
        .service(super::user::create)
        .service(super::user::update)
        .service(super::user::disable)
        // appointments
        .service(super::appointment::categories)
        .service(super::appointment::book)
        .service(super::appointment::list)
        .service(super::appointment::get)
        .service(super::appointment::update_status)
        // report submissions
        .service(super::submission::create)
        .service(super::submission::filter)
        .service(super::submission::min_max)
        .service(super::submission::pending)
        .service(super::submission::barangay_reports)
        .service(super::status::submit)
        .service(super::status::report_status)
        .service(super::status::min_max)
        .service(super::status::review)
        // aggregates
        .service(super::report::family_planning)
        .service(super::report::family_planning_filtered)
        .service(super::report::morbidity)
        .service(super::report::morbidity_filtered)
        .service(super::report::service_data)
        .service(super::report::service_data_filtered)
        .service(super::report::wra)
        .service(super::report::wra_filtered)
}
