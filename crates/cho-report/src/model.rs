//! Request and response bodies of the report endpoints

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use cho_common::period::tardy_days;
use cho_common::reference::is_fp_method;
use cho_common::validation::{invalid, validate_email, validate_not_blank};
use cho_common::{ChoError, ReportPeriod};
use cho_persistence::model::{
    AppointmentStatus, FamilyPlanningEntry, MorbidityEntry, ReportDetails, ReportStatusKind,
    ServiceDataEntry, SubmissionRow, SubmissionStatus, WraEntry,
};

// ==================== Submissions ====================

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSubmissionRequest {
    #[validate(range(
        min = 2000,
        max = 2100,
        message = "The report year must be between 2000 and 2100."
    ))]
    pub report_year: i32,
    #[validate(range(min = 1, max = 12, message = "The report month must be between 1 and 12."))]
    pub report_month: u32,
    /// `YYYY-MM-DD`; the deadline is the end of that day
    #[validate(custom(function = "validate_not_blank"))]
    pub due_date: String,
}

/// Body of `POST /submissions/month-year`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmissionFilterRequest {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub barangay_id: Option<i64>,
    pub status: Option<String>,
}

/// Query of `GET /submissions/barangay-reports`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BarangayReportsQuery {
    pub barangay_id: Option<i64>,
}

/// A submission row as the API returns it
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionView {
    #[serde(flatten)]
    pub row: SubmissionRow,
    /// Calendar days between deadline and submission; absent until submitted
    pub tardy_days: Option<i64>,
}

impl From<SubmissionRow> for SubmissionView {
    fn from(row: SubmissionRow) -> Self {
        let tardy_days = row.submitted_at.map(|at| tardy_days(at, row.due_at));
        Self { row, tardy_days }
    }
}

// ==================== Report submit ====================

fn validate_fp_method(value: &str) -> Result<(), ValidationError> {
    if is_fp_method(value) {
        Ok(())
    } else {
        Err(invalid("fp_method", "The selected fp method is invalid."))
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct WraInput {
    #[validate(custom(function = "validate_not_blank"))]
    pub age_category: String,
    #[validate(range(min = 0, max = 1_000_000, message = "The population must be between 0 and 1000000."))]
    pub population: i64,
    #[validate(range(min = 0, max = 1_000_000, message = "The value must be between 0 and 1000000."))]
    #[serde(default)]
    pub with_mfp_unmet_need: i64,
    #[validate(range(min = 0, max = 1_000_000, message = "The value must be between 0 and 1000000."))]
    #[serde(default)]
    pub accept_any_mfp: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct FamilyPlanningInput {
    #[validate(custom(function = "validate_not_blank"))]
    pub age_category: String,
    #[validate(custom(function = "validate_fp_method"))]
    pub fp_method: String,
    #[validate(range(min = 0, max = 1_000_000, message = "The value must be between 0 and 1000000."))]
    #[serde(default)]
    pub current_users_beginning: i64,
    #[validate(range(min = 0, max = 1_000_000, message = "The value must be between 0 and 1000000."))]
    #[serde(default)]
    pub new_acceptors_previous_month: i64,
    #[validate(range(min = 0, max = 1_000_000, message = "The value must be between 0 and 1000000."))]
    #[serde(default)]
    pub other_acceptors_present_month: i64,
    #[validate(range(min = 0, max = 1_000_000, message = "The value must be between 0 and 1000000."))]
    #[serde(default)]
    pub drop_outs_present_month: i64,
    #[validate(range(min = 0, max = 1_000_000, message = "The value must be between 0 and 1000000."))]
    #[serde(default)]
    pub current_users_end: i64,
    #[validate(range(min = 0, max = 1_000_000, message = "The value must be between 0 and 1000000."))]
    #[serde(default)]
    pub new_acceptors_present_month: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ServiceDataInput {
    pub age_category: Option<String>,
    #[validate(custom(function = "validate_not_blank"))]
    pub service_name: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub indicator: String,
    #[validate(range(min = 0, max = 1_000_000, message = "The value must be between 0 and 1000000."))]
    #[serde(default)]
    pub male: i64,
    #[validate(range(min = 0, max = 1_000_000, message = "The value must be between 0 and 1000000."))]
    #[serde(default)]
    pub female: i64,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MorbidityInput {
    #[validate(custom(function = "validate_not_blank"))]
    pub age_category: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub disease_name: String,
    #[validate(range(min = 0, max = 1_000_000, message = "The value must be between 0 and 1000000."))]
    #[serde(default)]
    pub male: i64,
    #[validate(range(min = 0, max = 1_000_000, message = "The value must be between 0 and 1000000."))]
    #[serde(default)]
    pub female: i64,
}

/// M1 form: women of reproductive age, family planning and service data
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct M1Report {
    #[validate(nested)]
    #[serde(default)]
    pub wra: Vec<WraInput>,
    #[validate(nested)]
    #[serde(default)]
    pub family_planning: Vec<FamilyPlanningInput>,
    #[validate(nested)]
    #[serde(default)]
    pub service_data: Vec<ServiceDataInput>,
}

/// M2 form: morbidity
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct M2Report {
    #[validate(nested)]
    #[serde(default)]
    pub morbidity: Vec<MorbidityInput>,
}

/// Body of `POST /statuses/submit/report`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReportRequest {
    #[validate(nested)]
    pub m1_report: Option<M1Report>,
    #[validate(nested)]
    pub m2_report: Option<M2Report>,
    pub m1_report_id: Option<i64>,
    pub m2_report_id: Option<i64>,
    #[validate(range(min = 0, message = "The projected population must be at least 0."))]
    pub projected_population: Option<i64>,
}

impl SubmitReportRequest {
    /// Checks the rules between fields that the derived validators cannot.
    pub fn check_ids(&self) -> Result<(), ChoError> {
        if self.m1_report_id.is_none() && self.m2_report_id.is_none() {
            return Err(ChoError::validation(
                "m1ReportId",
                "At least one of m1ReportId or m2ReportId is required.",
            ));
        }
        if self.m1_report.is_some() && self.m1_report_id.is_none() {
            return Err(ChoError::validation(
                "m1ReportId",
                "The m1ReportId field is required when m1Report is present.",
            ));
        }
        if self.m2_report.is_some() && self.m2_report_id.is_none() {
            return Err(ChoError::validation(
                "m2ReportId",
                "The m2ReportId field is required when m2Report is present.",
            ));
        }
        Ok(())
    }

    pub fn m1_details(&self) -> ReportDetails {
        let report = self.m1_report.clone().unwrap_or_default();
        ReportDetails::M1 {
            wra: report
                .wra
                .into_iter()
                .map(|w| WraEntry {
                    age_category: w.age_category,
                    population: w.population,
                    with_mfp_unmet_need: w.with_mfp_unmet_need,
                    accept_any_mfp: w.accept_any_mfp,
                })
                .collect(),
            family_planning: report
                .family_planning
                .into_iter()
                .map(|f| FamilyPlanningEntry {
                    age_category: f.age_category,
                    fp_method: f.fp_method.trim().to_string(),
                    current_users_beginning: f.current_users_beginning,
                    new_acceptors_previous_month: f.new_acceptors_previous_month,
                    other_acceptors_present_month: f.other_acceptors_present_month,
                    drop_outs_present_month: f.drop_outs_present_month,
                    current_users_end: f.current_users_end,
                    new_acceptors_present_month: f.new_acceptors_present_month,
                })
                .collect(),
            service_data: report
                .service_data
                .into_iter()
                .map(|s| ServiceDataEntry {
                    age_category: s.age_category.filter(|c| !c.trim().is_empty()),
                    service_name: s.service_name.trim().to_string(),
                    indicator: s.indicator.trim().to_string(),
                    male: s.male,
                    female: s.female,
                    remarks: s.remarks,
                })
                .collect(),
        }
    }

    pub fn m2_details(&self) -> ReportDetails {
        let report = self.m2_report.clone().unwrap_or_default();
        ReportDetails::M2 {
            morbidity: report
                .morbidity
                .into_iter()
                .map(|m| MorbidityEntry {
                    age_category: m.age_category,
                    disease_name: m.disease_name.trim().to_string(),
                    male: m.male,
                    female: m.female,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitReportResult {
    pub report_status_id: i64,
    pub submission_id: i64,
    pub status: SubmissionStatus,
    pub submitted_at: NaiveDateTime,
}

// ==================== Statuses ====================

/// Body of `POST /statuses/report-status`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusFilterRequest {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub barangay_id: Option<i64>,
    pub status: Option<ReportStatusKind>,
}

/// Body of `PUT /statuses/review/{id}`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReviewRequest {
    pub status: ReportStatusKind,
    #[validate(length(max = 1000, message = "The admin note may not be greater than 1000 characters."))]
    pub admin_note: Option<String>,
}

// ==================== Aggregates ====================

/// Body of the raw `*-reports` endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawReportRequest {
    pub barangay_id: Option<i64>,
    pub year: Option<i32>,
}

/// Body of the `*-reports/filtered` endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportFilterRequest {
    pub barangay_id: Option<i64>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    #[serde(alias = "endYear")]
    pub end_year: Option<i32>,
    #[serde(alias = "endMonth")]
    pub end_month: Option<u32>,
}

impl ReportFilterRequest {
    /// The inclusive period window. `year` and `month` are required; the end
    /// defaults to the start.
    pub fn window(&self) -> Result<(ReportPeriod, ReportPeriod), ChoError> {
        let year = self.year.ok_or_else(|| ChoError::parameter_missing("year"))?;
        let month = self
            .month
            .ok_or_else(|| ChoError::parameter_missing("month"))?;
        let start = ReportPeriod::new(year, month)?;
        let end = match (self.end_year, self.end_month) {
            (None, None) => start,
            (end_year, end_month) => ReportPeriod::new(
                end_year.unwrap_or(year),
                end_month.unwrap_or(month),
            )?,
        };
        if end < start {
            return Err(ChoError::validation(
                "endMonth",
                "The end period must not be before the start period.",
            ));
        }
        Ok((start, end))
    }
}

/// Chart payload: totals keyed by period
#[derive(Debug, Clone, Serialize)]
pub struct FilteredReport<T> {
    pub barangay_id: Option<i64>,
    pub start: ReportPeriod,
    pub end: ReportPeriod,
    pub periods: T,
}

// ==================== Barangays & appointments ====================

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BarangayRequest {
    #[validate(
        custom(function = "validate_not_blank"),
        length(max = 255, message = "The name may not be greater than 255 characters.")
    )]
    pub name: String,
}

/// Body of the public `POST /appointments`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BookAppointmentRequest {
    pub appointment_category_id: i64,
    #[validate(
        custom(function = "validate_not_blank"),
        length(max = 255, message = "The full name may not be greater than 255 characters.")
    )]
    pub full_name: String,
    #[validate(custom(function = "validate_email"))]
    pub email: String,
    #[validate(
        custom(function = "validate_not_blank"),
        length(max = 32, message = "The contact number may not be greater than 32 characters.")
    )]
    pub contact_number: String,
    /// `YYYY-MM-DD`
    #[validate(custom(function = "validate_not_blank"))]
    pub appointment_date: String,
    pub appointment_time: Option<NaiveTime>,
    #[validate(length(max = 1000, message = "The notes may not be greater than 1000 characters."))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentListQuery {
    pub date: Option<String>,
    pub category_id: Option<i64>,
    pub status: Option<AppointmentStatus>,
    #[serde(alias = "pageNo")]
    pub page_no: Option<u64>,
    #[serde(alias = "pageSize")]
    pub page_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppointmentStatusRequest {
    pub status: AppointmentStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use cho_common::validate_request;

    fn submit_json(value: serde_json::Value) -> SubmitReportRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_submit_request_camel_case_shape() {
        let request = submit_json(serde_json::json!({
            "m1ReportId": 4,
            "projectedPopulation": 1200,
            "m1Report": {
                "wra": [{"age_category": "15-19", "population": 40}],
                "familyPlanning": [{"age_category": "20-24", "fp_method": "Condom", "current_users_end": 3}],
                "serviceData": []
            }
        }));
        assert_eq!(request.m1_report_id, Some(4));
        assert!(request.check_ids().is_ok());
        assert!(validate_request(&request).is_ok());

        match request.m1_details() {
            ReportDetails::M1 {
                wra,
                family_planning,
                service_data,
            } => {
                assert_eq!(wra[0].with_mfp_unmet_need, 0);
                assert_eq!(family_planning[0].current_users_end, 3);
                assert!(service_data.is_empty());
            }
            other => panic!("unexpected details {:?}", other),
        }
    }

    #[test]
    fn test_submit_request_id_rules() {
        let err = submit_json(serde_json::json!({})).check_ids().unwrap_err();
        assert!(err.to_string().contains("At least one"));

        let err = submit_json(serde_json::json!({"m1ReportId": 1, "m2Report": {"morbidity": []}}))
            .check_ids()
            .unwrap_err();
        assert!(matches!(err, ChoError::Validation { ref errors, .. } if errors.contains_key("m2ReportId")));
    }

    #[test]
    fn test_negative_counts_are_rejected_with_nested_keys() {
        let request = submit_json(serde_json::json!({
            "m2ReportId": 2,
            "m2Report": {"morbidity": [
                {"age_category": "1-4", "disease_name": "Dengue", "male": 1, "female": 2},
                {"age_category": "1-4", "disease_name": "Dengue", "male": -1, "female": 0}
            ]}
        }));
        match validate_request(&request).unwrap_err() {
            ChoError::Validation { errors, .. } => {
                assert!(errors.keys().any(|k| k.ends_with("morbidity.1.male")));
                assert!(!errors.keys().any(|k| k.contains("morbidity.0")));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_oversized_counts_are_rejected() {
        let request = submit_json(serde_json::json!({
            "m1ReportId": 1,
            "m2ReportId": 2,
            "m1Report": {
                "wra": [{"age_category": "15-19", "population": 1_000_000}],
                "familyPlanning": [{"age_category": "20-24", "fp_method": "Condom", "current_users_end": i64::MAX}]
            },
            "m2Report": {"morbidity": [
                {"age_category": "1-4", "disease_name": "Dengue", "male": 1_000_001, "female": 0}
            ]}
        }));
        match validate_request(&request).unwrap_err() {
            ChoError::Validation { errors, .. } => {
                assert!(errors.keys().any(|k| k.ends_with("family_planning.0.current_users_end")));
                assert!(errors.keys().any(|k| k.ends_with("morbidity.0.male")));
                // the upper bound itself is allowed
                assert!(!errors.keys().any(|k| k.contains("wra")));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_unknown_fp_method_is_rejected() {
        let request = submit_json(serde_json::json!({
            "m1ReportId": 1,
            "m1Report": {"familyPlanning": [{"age_category": "20-24", "fp_method": "Herbal"}]}
        }));
        assert!(validate_request(&request).is_err());
    }

    #[test]
    fn test_filter_window() {
        let request = ReportFilterRequest {
            year: Some(2024),
            month: Some(3),
            ..Default::default()
        };
        let (start, end) = request.window().unwrap();
        assert_eq!(start, end);

        let request: ReportFilterRequest = serde_json::from_value(serde_json::json!({
            "year": 2024, "month": 3, "endYear": 2024, "endMonth": 8
        }))
        .unwrap();
        let (start, end) = request.window().unwrap();
        assert_eq!(end.ordinal() - start.ordinal(), 5);

        let missing = ReportFilterRequest {
            year: Some(2024),
            ..Default::default()
        };
        assert_eq!(
            missing.window().unwrap_err().to_string(),
            "Required parameter 'month' is missing"
        );
    }

    #[test]
    fn test_submission_view_tardy_days() {
        let due_at = cho_common::period::end_of_day(
            chrono::NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
        );
        let row = SubmissionRow {
            id: 1,
            report_submission_template_id: 1,
            barangay_id: 1,
            barangay_name: "Poblacion".to_string(),
            report_type: "m1".to_string(),
            report_year: 2024,
            report_month: 6,
            status: "submitted late".to_string(),
            due_at,
            created_at: due_at,
            report_status_id: Some(1),
            report_status: Some("approved".to_string()),
            submitted_at: chrono::NaiveDate::from_ymd_opt(2024, 6, 15)
                .and_then(|d| d.and_hms_opt(9, 0, 0)),
            submitted_by: Some(2),
        };
        let view = SubmissionView::from(row);
        assert_eq!(view.tardy_days, Some(5));
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["tardy_days"], 5);
        assert_eq!(json["barangay_name"], "Poblacion");
    }
}
