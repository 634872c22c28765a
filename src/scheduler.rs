// src/scheduler.rs
//! Daily jobs in local time: the morning report and the optional midnight reset.
//!
//! Time math is pure (`next_run`, `day_range`, `report_title`) so it can be
//! tested without sleeping; the spawned loops only sleep and call into `AppState`.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use metrics::gauge;
use tokio::task::JoinHandle;

use crate::app::AppState;
use crate::notify::Destination;

pub const REPORT_TITLE_PREFIX: &str = "COLUMNS";

/// Resolve a local wall-clock time. Times skipped by a DST jump move forward
/// by the size of the gap (tried in 1h steps); ambiguous times take the
/// earlier instant.
fn resolve_local(tz: Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    let mut probe = naive;
    for _ in 0..4 {
        match tz.from_local_datetime(&probe) {
            LocalResult::Single(t) => return t.with_timezone(&Utc),
            LocalResult::Ambiguous(early, _) => return early.with_timezone(&Utc),
            LocalResult::None => probe += Duration::hours(1),
        }
    }
    // No zone has a gap this wide; read the wall time as UTC.
    Utc.from_utc_datetime(&naive)
}

fn at_local(tz: Tz, date: NaiveDate, hour: u32, minute: u32) -> DateTime<Utc> {
    let naive = date
        .and_hms_opt(hour.min(23), minute.min(59), 0)
        .unwrap_or_else(|| date.and_time(chrono::NaiveTime::MIN));
    resolve_local(tz, naive)
}

/// First instant strictly after `now` at `hour:minute` local time.
pub fn next_run(now: DateTime<Utc>, tz: Tz, hour: u32, minute: u32) -> DateTime<Utc> {
    let mut date = now.with_timezone(&tz).date_naive();
    loop {
        let candidate = at_local(tz, date, hour, minute);
        if candidate > now {
            return candidate;
        }
        date = match date.succ_opt() {
            Some(d) => d,
            None => return candidate,
        };
    }
}

/// Local calendar day containing `now`, as an inclusive UTC range
/// `[local midnight, next local midnight - 1ns]`.
pub fn day_range(now: DateTime<Utc>, tz: Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    let date = now.with_timezone(&tz).date_naive();
    let start = at_local(tz, date, 0, 0);
    let end = match date.succ_opt() {
        Some(next) => at_local(tz, next, 0, 0),
        None => start + Duration::days(1),
    };
    (start, end - Duration::nanoseconds(1))
}

/// `COLUMNS / Fri 17 Oct 2025 – 08:30`
pub fn report_title(now: DateTime<Utc>, tz: Tz) -> String {
    let local = now.with_timezone(&tz);
    format!("{REPORT_TITLE_PREFIX} / {}", local.format("%a %d %b %Y – %H:%M"))
}

fn until(target: DateTime<Utc>) -> std::time::Duration {
    (target - Utc::now()).to_std().unwrap_or_default()
}

/// Sends today's report to the summary destination every day at the
/// configured local time.
pub fn spawn_daily_report(state: AppState) -> JoinHandle<()> {
    tokio::spawn(async move {
        let s = state.settings().clone();
        loop {
            let next = next_run(Utc::now(), s.tz, s.report_hour, s.report_minute);
            tracing::info!(target: "scheduler", next = %next.with_timezone(&s.tz), "daily report scheduled");
            tokio::time::sleep(until(next)).await;

            let outcome = state.send_today_report(Destination::Summary, Utc::now()).await;
            tracing::info!(target: "scheduler", delivered = outcome.is_delivered(), "daily report tick");
        }
    })
}

/// Clears the entry store at local midnight.
pub fn spawn_midnight_reset(state: AppState) -> JoinHandle<()> {
    tokio::spawn(async move {
        let tz = state.settings().tz;
        loop {
            let next = next_run(Utc::now(), tz, 0, 0);
            tokio::time::sleep(until(next)).await;

            let dropped = state.pipeline().store().len();
            state.pipeline().store().clear();
            gauge!("entry_store_size").set(0.0);
            tracing::info!(target: "scheduler", dropped, "entry store reset");
        }
    })
}

/// Spawns the report loop, plus the reset loop when enabled.
pub fn spawn_all(state: &AppState) -> Vec<JoinHandle<()>> {
    let mut handles = vec![spawn_daily_report(state.clone())];
    if state.settings().reset_daily {
        handles.push(spawn_midnight_reset(state.clone()));
    }
    handles
}
