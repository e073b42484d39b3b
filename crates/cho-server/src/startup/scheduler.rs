//! Twice-daily trigger of the pending report notice job

use std::sync::Arc;

use chrono::{DateTime, Duration, Local, NaiveDateTime, NaiveTime, TimeZone};
use tracing::{error, info, warn};

use cho_report::NoticeJob;

use super::ShutdownSignal;

/// Next wall-clock instant strictly after `now` that falls on one of `times`.
///
/// The result may not exist locally; see [`resolve_next_fire`].
pub fn next_fire(now: NaiveDateTime, times: &[NaiveTime]) -> Option<NaiveDateTime> {
    (0..=1)
        .flat_map(|offset| {
            let day = now.date() + Duration::days(offset);
            times.iter().map(move |t| day.and_time(*t))
        })
        .filter(|candidate| *candidate > now)
        .min()
}

/// Next fire time after `now` that `resolve` can map to a real instant.
///
/// A candidate the resolver rejects (a DST gap) is skipped and the search
/// moves on to the following trigger time.
pub fn resolve_next_fire<T>(
    now: NaiveDateTime,
    times: &[NaiveTime],
    resolve: impl Fn(NaiveDateTime) -> Option<T>,
) -> Option<T> {
    let mut cursor = now;
    // every trigger time over a week, so a persistent gap cannot spin forever
    for _ in 0..times.len() * 7 {
        let candidate = next_fire(cursor, times)?;
        if let Some(resolved) = resolve(candidate) {
            return Some(resolved);
        }
        warn!(%candidate, "Notice trigger time does not exist locally, skipping");
        cursor = candidate;
    }
    None
}

fn to_local(naive: NaiveDateTime) -> Option<DateTime<Local>> {
    Local.from_local_datetime(&naive).earliest()
}

/// Spawns the scheduler loop. Each trigger runs the job in check mode; a
/// trigger that finds a run in progress is skipped.
pub fn start_notice_scheduler(
    job: Arc<NoticeJob>,
    times: Vec<NaiveTime>,
    shutdown: ShutdownSignal,
) -> Option<tokio::task::JoinHandle<()>> {
    if times.is_empty() {
        warn!("Notice scheduler has no trigger times configured");
        return None;
    }

    let mut shutdown_rx = shutdown.subscribe();
    Some(tokio::spawn(async move {
        info!(times = ?times, "Notice scheduler started");
        loop {
            let now = Local::now();
            let Some(next) = resolve_next_fire(now.naive_local(), &times, to_local) else {
                error!("Could not compute the next notice run, stopping scheduler");
                return;
            };
            let wait = (next - now).to_std().unwrap_or_default();

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = shutdown_rx.recv() => {
                    info!("Notice scheduler stopped");
                    return;
                }
            }

            match job.run_without_overlapping(true).await {
                None => warn!("Previous notice run still in progress, skipping this trigger"),
                Some(Ok(summary)) => info!(
                    pending = summary.pending,
                    sent = summary.notices_sent,
                    failed = summary.notices_failed,
                    "Scheduled notice run finished"
                ),
                Some(Err(e)) => error!(error = %e, "Scheduled notice run failed"),
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate};

    fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn times() -> Vec<NaiveTime> {
        vec![
            NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
        ]
    }

    #[test]
    fn test_next_fire_same_day() {
        assert_eq!(next_fire(at(10, 5, 0), &times()), Some(at(10, 6, 0)));
        assert_eq!(next_fire(at(10, 12, 30), &times()), Some(at(10, 18, 0)));
    }

    #[test]
    fn test_next_fire_rolls_to_next_day() {
        assert_eq!(next_fire(at(10, 18, 0), &times()), Some(at(11, 6, 0)));
        assert_eq!(next_fire(at(10, 23, 59), &times()), Some(at(11, 6, 0)));
    }

    #[test]
    fn test_next_fire_without_times() {
        assert_eq!(next_fire(at(10, 8, 0), &[]), None);
        assert_eq!(resolve_next_fire(at(10, 8, 0), &[], Some), None);
    }

    // America/New_York springs forward on 2024-03-10: 02:00-03:00 never happens
    fn new_york_march(naive: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
        let gap_start = NaiveDate::from_ymd_opt(2024, 3, 10)?.and_hms_opt(2, 0, 0)?;
        let gap_end = gap_start + Duration::hours(1);
        let offset = if naive < gap_start {
            FixedOffset::west_opt(5 * 3600)?
        } else if naive < gap_end {
            return None;
        } else {
            FixedOffset::west_opt(4 * 3600)?
        };
        offset.from_local_datetime(&naive).single()
    }

    fn march(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_trigger_in_dst_gap_moves_to_next_time() {
        let times = vec![
            NaiveTime::from_hms_opt(2, 30, 0).unwrap(),
            NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
        ];

        let next = resolve_next_fire(march(10, 1, 0), &times, new_york_march).unwrap();
        assert_eq!(next.naive_local(), march(10, 18, 0));
        assert_eq!(next.offset().utc_minus_local(), 4 * 3600);

        // the same time the next day exists again
        let next = resolve_next_fire(march(10, 18, 0), &times, new_york_march).unwrap();
        assert_eq!(next.naive_local(), march(11, 2, 30));
    }

    #[test]
    fn test_only_trigger_in_dst_gap_waits_a_day() {
        let times = vec![NaiveTime::from_hms_opt(2, 30, 0).unwrap()];
        let next = resolve_next_fire(march(9, 23, 0), &times, new_york_march).unwrap();
        assert_eq!(next.naive_local(), march(11, 2, 30));
    }

    #[test]
    fn test_unresolvable_times_give_up() {
        let times = times();
        let never = |_: NaiveDateTime| None::<NaiveDateTime>;
        assert_eq!(resolve_next_fire(at(10, 8, 0), &times, never), None);
    }
}
