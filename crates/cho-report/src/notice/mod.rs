//! Pending-submission notices
//!
//! The job scans pending report submissions, groups them per barangay and
//! hands one notice per barangay to a [`NoticeSender`]. It is run from the
//! `notice` CLI command, from the in-process scheduler and inline after a
//! submission batch is created.

pub mod sender;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use cho_common::{Clock, ReportPeriod};
use cho_persistence::PersistenceService;
use cho_persistence::model::{SubmissionQuery, SubmissionRow, SubmissionStatus};

use crate::metrics;

pub use sender::{LogNoticeSender, WebhookNoticeSender};

pub const DEFAULT_LEAD_DAYS: i64 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recipient {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoticeItem {
    pub submission_id: i64,
    pub report_type: String,
    pub period: ReportPeriod,
    pub due_at: NaiveDateTime,
    pub overdue: bool,
}

/// One reminder for the encoders of a barangay
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub barangay_id: i64,
    pub barangay_name: String,
    pub recipients: Vec<Recipient>,
    pub items: Vec<NoticeItem>,
    pub generated_at: NaiveDateTime,
}

/// Notice delivery channel
#[async_trait]
pub trait NoticeSender: Send + Sync {
    fn name(&self) -> &'static str;

    async fn send(&self, notice: &Notice) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NoticeSummary {
    pub pending: usize,
    pub notices_sent: usize,
    pub notices_failed: usize,
    /// Barangays with pending work but no active encoder
    pub without_recipients: usize,
}

pub struct NoticeJob {
    persistence: Arc<dyn PersistenceService>,
    clock: Arc<dyn Clock>,
    sender: Arc<dyn NoticeSender>,
    lead_days: i64,
    running: Mutex<()>,
}

impl NoticeJob {
    pub fn new(
        persistence: Arc<dyn PersistenceService>,
        clock: Arc<dyn Clock>,
        sender: Arc<dyn NoticeSender>,
        lead_days: i64,
    ) -> Self {
        Self {
            persistence,
            clock,
            sender,
            lead_days,
            running: Mutex::new(()),
        }
    }

    /// Runs the job, waiting for an in-flight run to finish first.
    pub async fn run(&self, check: bool) -> anyhow::Result<NoticeSummary> {
        let _guard = self.running.lock().await;
        self.execute(check).await
    }

    /// Runs the job unless a run is already in progress, in which case this
    /// trigger is skipped and `None` is returned.
    pub async fn run_without_overlapping(
        &self,
        check: bool,
    ) -> Option<anyhow::Result<NoticeSummary>> {
        let _guard = self.running.try_lock().ok()?;
        Some(self.execute(check).await)
    }

    async fn execute(&self, check: bool) -> anyhow::Result<NoticeSummary> {
        let now = self.clock.now();
        let query = SubmissionQuery {
            statuses: vec![SubmissionStatus::Pending],
            // --check narrows to submissions due soon or already overdue
            due_before: check.then(|| now + chrono::Duration::days(self.lead_days)),
            ..Default::default()
        };
        let pending = self.persistence.submission_find(&query).await?;

        let mut summary = NoticeSummary {
            pending: pending.len(),
            ..Default::default()
        };

        for (barangay_id, rows) in group_by_barangay(pending) {
            let recipients: Vec<Recipient> = self
                .persistence
                .user_find_active_encoders(barangay_id)
                .await?
                .into_iter()
                .map(|u| Recipient {
                    name: u.name,
                    email: u.email,
                })
                .collect();

            if recipients.is_empty() {
                warn!(barangay_id, "pending submissions but no active encoder to notify");
                summary.without_recipients += 1;
                continue;
            }

            let notice = build_notice(barangay_id, rows, recipients, now);
            match self.sender.send(&notice).await {
                Ok(()) => {
                    summary.notices_sent += 1;
                    metrics::record_notice(self.sender.name(), true);
                }
                Err(e) => {
                    warn!(barangay_id, error = %e, "failed to send notice");
                    summary.notices_failed += 1;
                    metrics::record_notice(self.sender.name(), false);
                }
            }
        }

        info!(
            check,
            pending = summary.pending,
            sent = summary.notices_sent,
            failed = summary.notices_failed,
            "notice run finished"
        );
        Ok(summary)
    }
}

fn group_by_barangay(rows: Vec<SubmissionRow>) -> BTreeMap<i64, Vec<SubmissionRow>> {
    let mut groups: BTreeMap<i64, Vec<SubmissionRow>> = BTreeMap::new();
    for row in rows {
        groups.entry(row.barangay_id).or_default().push(row);
    }
    groups
}

fn build_notice(
    barangay_id: i64,
    rows: Vec<SubmissionRow>,
    recipients: Vec<Recipient>,
    now: NaiveDateTime,
) -> Notice {
    let barangay_name = rows
        .first()
        .map(|r| r.barangay_name.clone())
        .unwrap_or_default();
    let mut items: Vec<NoticeItem> = rows
        .into_iter()
        .map(|r| NoticeItem {
            submission_id: r.id,
            period: r.period(),
            overdue: r.due_at < now,
            due_at: r.due_at,
            report_type: r.report_type,
        })
        .collect();
    items.sort_by(|a, b| a.due_at.cmp(&b.due_at).then(a.report_type.cmp(&b.report_type)));

    Notice {
        barangay_id,
        barangay_name,
        recipients,
        items,
        generated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use cho_common::FixedClock;
    use cho_persistence::model::{NewSubmissionBatch, NewUser, Role};
    use cho_persistence::{MemoryPersistService, SubmissionPersistence, UserPersistence};

    /// Collects notices in memory
    #[derive(Default)]
    struct Recorder {
        notices: std::sync::Mutex<Vec<Notice>>,
        fail: bool,
    }

    #[async_trait]
    impl NoticeSender for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        async fn send(&self, notice: &Notice) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("relay unavailable");
            }
            self.notices.lock().unwrap().push(notice.clone());
            Ok(())
        }
    }

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(6, 0, 0))
            .unwrap()
    }

    async fn seed(persistence: &MemoryPersistService) {
        for (email, barangay_id) in [("a@cho.gov.ph", 1), ("b@cho.gov.ph", 2)] {
            persistence
                .user_create(
                    NewUser {
                        name: email.to_string(),
                        email: email.to_string(),
                        password_hash: String::new(),
                        role: Role::Encoder,
                        barangay_id: Some(barangay_id),
                    },
                    at(2024, 1, 1),
                )
                .await
                .unwrap();
        }
        for (month, due_day) in [(5, 10), (6, 30)] {
            persistence
                .submission_create_batch(NewSubmissionBatch {
                    admin_id: 1,
                    period: ReportPeriod::new(2024, month).unwrap(),
                    due_at: cho_common::period::end_of_day(
                        NaiveDate::from_ymd_opt(2024, month, due_day).unwrap(),
                    ),
                    created_at: at(2024, 1, 1),
                })
                .await
                .unwrap();
        }
    }

    fn job(persistence: Arc<MemoryPersistService>, sender: Arc<Recorder>) -> NoticeJob {
        NoticeJob::new(
            persistence,
            Arc::new(FixedClock::new(at(2024, 6, 12))),
            sender,
            DEFAULT_LEAD_DAYS,
        )
    }

    #[tokio::test]
    async fn test_full_run_notifies_each_barangay_with_encoders() {
        let persistence = Arc::new(MemoryPersistService::seeded(at(2024, 1, 1)));
        seed(&persistence).await;
        let sender = Arc::new(Recorder::default());

        let summary = job(persistence, sender.clone()).run(false).await.unwrap();
        // 9 barangays x 2 types x 2 months
        assert_eq!(summary.pending, 36);
        assert_eq!(summary.notices_sent, 2);
        assert_eq!(summary.without_recipients, 7);

        let notices = sender.notices.lock().unwrap();
        assert_eq!(notices[0].barangay_id, 1);
        assert_eq!(notices[0].items.len(), 4);
        assert!(notices[0].items[0].overdue);
        assert!(!notices[0].items[3].overdue);
        assert_eq!(notices[0].recipients[0].email, "a@cho.gov.ph");
    }

    #[tokio::test]
    async fn test_check_mode_only_includes_due_soon_or_overdue() {
        let persistence = Arc::new(MemoryPersistService::seeded(at(2024, 1, 1)));
        seed(&persistence).await;
        let sender = Arc::new(Recorder::default());

        let summary = job(persistence, sender.clone()).run(true).await.unwrap();
        // Only May (overdue) qualifies; June is due in 18 days.
        assert_eq!(summary.pending, 18);
        let notices = sender.notices.lock().unwrap();
        assert!(notices.iter().all(|n| n.items.iter().all(|i| i.overdue)));
    }

    #[tokio::test]
    async fn test_sender_failures_are_counted() {
        let persistence = Arc::new(MemoryPersistService::seeded(at(2024, 1, 1)));
        seed(&persistence).await;
        let sender = Arc::new(Recorder {
            fail: true,
            ..Default::default()
        });

        let summary = job(persistence, sender).run(false).await.unwrap();
        assert_eq!(summary.notices_sent, 0);
        assert_eq!(summary.notices_failed, 2);
    }

    #[tokio::test]
    async fn test_overlapping_trigger_is_skipped() {
        let persistence = Arc::new(MemoryPersistService::seeded(at(2024, 1, 1)));
        let job = job(persistence, Arc::new(Recorder::default()));

        let guard = job.running.lock().await;
        assert!(job.run_without_overlapping(true).await.is_none());
        drop(guard);
        let summary = job.run_without_overlapping(true).await.unwrap().unwrap();
        assert_eq!(summary.pending, 0);
    }
}
