//! Attendance reconciliation jobs.
//!
//! Each job runs on its own task and its own trigger; a failing run is
//! logged and the job waits for its next trigger.

use std::future::Future;

use chrono::{DateTime, Duration, FixedOffset, NaiveTime, Timelike, Utc};
use tracing::{error, info};

use crate::config::SchedulerConfig;
use crate::error::StoreResult;
use crate::repository::Store;
use crate::utils::time::office_now;

pub mod jobs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Once a day at the given wall-clock time.
    Daily(NaiveTime),
    /// At the top of every hour.
    Hourly,
}

impl Schedule {
    /// The first trigger strictly after `now`.
    pub fn next_after(&self, now: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
        let into_second = Duration::nanoseconds(i64::from(now.nanosecond() % 1_000_000_000));
        let now_secs = i64::from(now.num_seconds_from_midnight());

        let wait = match self {
            Schedule::Daily(at) => {
                let delta = i64::from(at.num_seconds_from_midnight()) - now_secs;
                if delta > 0 { delta } else { delta + 86_400 }
            }
            Schedule::Hourly => 3_600 - now_secs % 3_600,
        };

        now - into_second + Duration::seconds(wait)
    }
}

fn spawn_job<F, Fut>(name: &'static str, schedule: Schedule, offset: FixedOffset, mut job: F)
where
    F: FnMut(DateTime<FixedOffset>) -> Fut + 'static,
    Fut: Future<Output = StoreResult<u64>> + 'static,
{
    actix_web::rt::spawn(async move {
        loop {
            let now = office_now(offset);
            let next = schedule.next_after(now);
            let wait = (next - now).to_std().unwrap_or_default();
            info!(job = name, next = %next, "Job scheduled");

            actix_web::rt::time::sleep(wait).await;

            match job(next).await {
                Ok(affected) => info!(job = name, affected, "Job finished"),
                Err(e) => error!(job = name, error = %e, "Job failed"),
            }
        }
    });
}

/// Starts the auto clock-out, absence marking and audit retention jobs.
pub fn spawn<S: Store>(store: S, config: SchedulerConfig) {
    if !config.enabled {
        info!("Scheduler disabled");
        return;
    }

    let offset = config.utc_offset;

    let clock_out_store = store.clone();
    let end_of_day = config.auto_clock_out_at;
    spawn_job("auto_clock_out", Schedule::Daily(end_of_day), offset, move |fired| {
        let store = clock_out_store.clone();
        async move { jobs::auto_clock_out(&store, fired.date_naive(), end_of_day).await }
    });

    let absence_store = store.clone();
    let rest_day = config.rest_day;
    spawn_job("auto_absence", Schedule::Daily(config.absence_check_at), offset, move |fired| {
        let store = absence_store.clone();
        async move { jobs::mark_absentees(&store, fired.date_naive(), rest_day).await }
    });

    let retention_hours = config.audit_retention_hours;
    spawn_job("audit_retention", Schedule::Hourly, offset, move |fired| {
        let store = store.clone();
        async move { jobs::purge_audit(&store, fired.with_timezone(&Utc), retention_hours).await }
    });
}
