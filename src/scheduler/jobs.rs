use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use tracing::{debug, info};

use crate::error::StoreResult;
use crate::model::attendance::{ClosedSession, append_remark, work_hours};
use crate::repository::{AttendanceRepository, AuditRepository, HolidayRepository};

pub const AUTO_CLOCK_OUT_REMARK: &str = "Auto Clock-out";
pub const AUTO_ABSENT_REMARK: &str = "Auto-marked absent by system";

/// Closes every open non-admin session on `date` at `end_of_day`.
pub async fn auto_clock_out<S: AttendanceRepository>(
    store: &S,
    date: NaiveDate,
    end_of_day: NaiveTime,
) -> StoreResult<u64> {
    let sessions = store.open_sessions(date).await?;
    if sessions.is_empty() {
        debug!(%date, "No open sessions to close");
        return Ok(0);
    }

    let closed: Vec<ClosedSession> = sessions
        .into_iter()
        .map(|s| ClosedSession {
            id: s.id,
            employee_id: s.employee_id,
            check_out: end_of_day,
            work_hours: work_hours(s.check_in, end_of_day),
            remarks: Some(append_remark(s.remarks.as_deref(), AUTO_CLOCK_OUT_REMARK)),
        })
        .collect();

    store.close_sessions(&closed).await
}

/// Marks every active employee without a record on `date` as Absent.
/// Does nothing on the rest day or on a holiday.
pub async fn mark_absentees<S: AttendanceRepository + HolidayRepository>(
    store: &S,
    date: NaiveDate,
    rest_day: Weekday,
) -> StoreResult<u64> {
    if date.weekday() == rest_day {
        info!(%date, "Rest day, skipping absence marking");
        return Ok(0);
    }
    if store.is_holiday(date).await? {
        info!(%date, "Holiday, skipping absence marking");
        return Ok(0);
    }

    store.mark_absent(date, AUTO_ABSENT_REMARK).await
}

/// Deletes audit entries older than the retention window.
pub async fn purge_audit<S: AuditRepository>(
    store: &S,
    now: DateTime<Utc>,
    retention_hours: i64,
) -> StoreResult<u64> {
    store.purge_audit_before(now - Duration::hours(retention_hours)).await
}
