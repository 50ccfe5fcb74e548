use chrono::{NaiveDate, NaiveTime};
use tracing::{error, info};

use crate::error::{ApiError, StoreError};
use crate::model::attendance::Attendance;
use crate::repository::AttendanceRepository;

pub async fn check_in<S: AttendanceRepository>(
    store: &S,
    employee_id: u64,
    date: NaiveDate,
    at: NaiveTime,
) -> Result<Attendance, ApiError> {
    let record = store.check_in(employee_id, date, at).await.map_err(|e| match e {
        StoreError::Conflict(_) => ApiError::Conflict("Attendance already recorded for today".to_string()),
        other => {
            error!(error = %other, employee_id, "Check-in failed");
            ApiError::from(other)
        }
    })?;

    info!(employee_id, %date, "Checked in");
    Ok(record)
}

pub async fn check_out<S: AttendanceRepository>(
    store: &S,
    employee_id: u64,
    date: NaiveDate,
    at: NaiveTime,
) -> Result<Attendance, ApiError> {
    let record = store
        .check_out(employee_id, date, at)
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, "Check-out failed");
            ApiError::from(e)
        })?
        .ok_or_else(|| ApiError::validation("No active check-in found for today"))?;

    info!(employee_id, work_hours = ?record.work_hours, "Checked out");
    Ok(record)
}
