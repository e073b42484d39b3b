//! Reporting periods and due-date arithmetic

use std::fmt::{Display, Formatter};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::ChoError;

pub const MIN_REPORT_YEAR: i32 = 2000;
pub const MAX_REPORT_YEAR: i32 = 2100;

/// A reporting month, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReportPeriod {
    pub year: i32,
    pub month: u32,
}

impl ReportPeriod {
    pub fn new(year: i32, month: u32) -> Result<Self, ChoError> {
        if !(1..=12).contains(&month) {
            return Err(ChoError::validation(
                "month",
                "The month must be between 1 and 12.",
            ));
        }
        if !(MIN_REPORT_YEAR..=MAX_REPORT_YEAR).contains(&year) {
            return Err(ChoError::validation(
                "year",
                format!(
                    "The year must be between {} and {}.",
                    MIN_REPORT_YEAR, MAX_REPORT_YEAR
                ),
            ));
        }
        Ok(Self { year, month })
    }

    /// Months since year 0; lets ranges compare with plain integers.
    pub fn ordinal(&self) -> i64 {
        self.year as i64 * 12 + (self.month as i64 - 1)
    }

    pub fn key(&self) -> String {
        self.to_string()
    }

    /// True when `self` falls inside `[start, end]`.
    pub fn within(&self, start: &ReportPeriod, end: &ReportPeriod) -> bool {
        self.ordinal() >= start.ordinal() && self.ordinal() <= end.ordinal()
    }
}

impl Display for ReportPeriod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Due dates are entered as calendar days; the deadline is the last second of that day.
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN))
}

/// A submission is late when it lands strictly after the deadline.
pub fn is_late(submitted_at: NaiveDateTime, due_at: NaiveDateTime) -> bool {
    submitted_at > due_at
}

/// Calendar-day difference between submission and deadline, like SQL `DATEDIFF`.
pub fn tardy_days(submitted_at: NaiveDateTime, due_at: NaiveDateTime) -> i64 {
    (submitted_at.date() - due_at.date()).num_days()
}

/// Parses `YYYY-MM-DD`, reporting failures against `field`.
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, ChoError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        ChoError::validation(
            field,
            format!("The {} must be a valid date (YYYY-MM-DD).", field),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(h, min, 0))
            .unwrap()
    }

    #[test]
    fn test_period_display_and_order() {
        let june = ReportPeriod::new(2024, 6).unwrap();
        let jan_next = ReportPeriod::new(2025, 1).unwrap();
        assert_eq!(june.to_string(), "2024-06");
        assert!(june < jan_next);
        assert_eq!(jan_next.ordinal() - june.ordinal(), 7);
    }

    #[test]
    fn test_period_rejects_bad_month() {
        let err = ReportPeriod::new(2024, 13).unwrap_err();
        assert!(matches!(err, ChoError::Validation { .. }));
        assert!(ReportPeriod::new(2024, 0).is_err());
        assert!(ReportPeriod::new(1999, 5).is_err());
    }

    #[test]
    fn test_within_range() {
        let start = ReportPeriod::new(2024, 3).unwrap();
        let end = ReportPeriod::new(2024, 8).unwrap();
        assert!(ReportPeriod::new(2024, 3).unwrap().within(&start, &end));
        assert!(ReportPeriod::new(2024, 8).unwrap().within(&start, &end));
        assert!(!ReportPeriod::new(2024, 9).unwrap().within(&start, &end));
    }

    #[test]
    fn test_due_date_scenario() {
        let due_at = end_of_day(NaiveDate::from_ymd_opt(2024, 6, 10).unwrap());
        let submitted_at = at(2024, 6, 15, 9, 30);
        assert!(is_late(submitted_at, due_at));
        assert_eq!(tardy_days(submitted_at, due_at), 5);
    }

    #[test]
    fn test_submission_on_due_day_is_on_time() {
        let due_at = end_of_day(NaiveDate::from_ymd_opt(2024, 6, 10).unwrap());
        let submitted_at = at(2024, 6, 10, 17, 45);
        assert!(!is_late(submitted_at, due_at));
        assert_eq!(tardy_days(submitted_at, due_at), 0);
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("due_date", "2024-06-10").unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
        );
        assert!(parse_date("due_date", "06/10/2024").is_err());
    }

    proptest! {
        #[test]
        fn prop_late_iff_after_deadline(offset_minutes in -20_000i64..20_000) {
            let due_at = end_of_day(NaiveDate::from_ymd_opt(2024, 6, 10).unwrap());
            let submitted_at = due_at + chrono::Duration::minutes(offset_minutes);
            prop_assert_eq!(is_late(submitted_at, due_at), offset_minutes > 0);
            if offset_minutes > 0 {
                prop_assert!(tardy_days(submitted_at, due_at) >= 1);
            } else {
                prop_assert!(tardy_days(submitted_at, due_at) <= 0);
            }
        }

        #[test]
        fn prop_ordinal_preserves_order(y1 in 2000i32..2100, m1 in 1u32..=12, y2 in 2000i32..2100, m2 in 1u32..=12) {
            let a = ReportPeriod::new(y1, m1).unwrap();
            let b = ReportPeriod::new(y2, m2).unwrap();
            prop_assert_eq!(a.cmp(&b), a.ordinal().cmp(&b.ordinal()));
        }
    }
}
