// src/scheduler.rs
//! Daily wall-clock schedule: run a job at fixed local times.

use std::future::Future;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Days, Local, NaiveTime, TimeZone};
use metrics::{counter, gauge};
use tracing::{info, warn};

/// Parse `HH:MM` strings into sorted, distinct times of day.
pub fn parse_schedule_times(raw: &[String]) -> Result<Vec<NaiveTime>> {
    let mut out = Vec::with_capacity(raw.len());
    for s in raw {
        let s = s.trim();
        if s.is_empty() {
            continue;
        }
        let t = NaiveTime::parse_from_str(s, "%H:%M")
            .map_err(|e| anyhow!("invalid schedule time `{s}` (expected HH:MM): {e}"))?;
        out.push(t);
    }
    out.sort();
    out.dedup();
    Ok(out)
}

/// Earliest scheduled instant strictly after `now`: later today, or the
/// first time tomorrow. `times` must be sorted and non-empty.
pub fn next_fire<Tz: TimeZone>(now: &DateTime<Tz>, times: &[NaiveTime]) -> Option<DateTime<Tz>> {
    let tz = now.timezone();
    let today = now.date_naive();
    let tomorrow = today.checked_add_days(Days::new(1))?;
    let day_after = tomorrow.checked_add_days(Days::new(1))?;

    [today, tomorrow, day_after]
        .into_iter()
        .flat_map(|d| times.iter().map(move |t| d.and_time(*t)))
        // Skips local times that fall into a DST gap.
        .filter_map(|naive| tz.from_local_datetime(&naive).earliest())
        .find(|at| at > now)
}

/// Run `job` at every configured local time, forever.
pub async fn run_daily<F, Fut>(times: Vec<NaiveTime>, mut job: F) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    if times.is_empty() {
        return Err(anyhow!("no schedule times configured (set SCHEDULE_TIMES)"));
    }
    let times = {
        let mut t = times;
        t.sort();
        t.dedup();
        t
    };

    loop {
        let now = Local::now();
        let Some(at) = next_fire(&now, &times) else {
            return Err(anyhow!("could not compute next schedule time after {now}"));
        };
        let wait = at.signed_duration_since(now).to_std().unwrap_or_default();
        info!(next_run = %at.to_rfc3339(), wait_secs = wait.as_secs(), "scheduler sleeping");
        gauge!("scheduler_next_run_ts").set(at.timestamp() as f64);
        tokio::time::sleep(wait).await;

        // Late wakeups (suspend, clock jumps) still run once.
        if Local::now() < at {
            warn!("scheduler woke early; re-arming");
            continue;
        }
        counter!("scheduler_runs_total").increment(1);
        job().await;
    }
}
