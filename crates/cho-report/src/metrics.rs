//! Counters recorded by the report services
//!
//! The server installs the Prometheus recorder and describes these names;
//! without a recorder the macros are no-ops.

use metrics::counter;

pub const SUBMISSIONS_CREATED: &str = "cho_submissions_created_total";
pub const REPORTS_SUBMITTED: &str = "cho_reports_submitted_total";
pub const NOTICES_SENT: &str = "cho_notices_sent_total";
pub const NOTICES_FAILED: &str = "cho_notices_failed_total";

pub fn record_submissions_created(count: u64) {
    counter!(SUBMISSIONS_CREATED).increment(count);
}

pub fn record_report_submitted(status: &'static str) {
    counter!(REPORTS_SUBMITTED, "status" => status).increment(1);
}

pub fn record_notice(sender: &'static str, ok: bool) {
    if ok {
        counter!(NOTICES_SENT, "sender" => sender).increment(1);
    } else {
        counter!(NOTICES_FAILED, "sender" => sender).increment(1);
    }
}
