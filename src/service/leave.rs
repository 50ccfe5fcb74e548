use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use strum::IntoEnumIterator;
use tracing::{error, info, instrument};

use super::{Actor, audit};
use crate::error::{ApiError, StoreError};
use crate::model::audit_log::NewAuditEntry;
use crate::model::leave_request::{LeaveCategory, LeaveRequest, NewLeave};
use crate::repository::{AuditRepository, LeaveRepository};

const ENTITY: &str = "leave_requests";

#[derive(Debug, Default, Deserialize)]
pub struct SubmitLeave {
    #[serde(alias = "category")]
    pub leave_type: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Balance {
    pub used: i64,
    pub total: i64,
    pub available: i64,
}

/// Per-category balances keyed by `sick`, `casual`, `privilege`.
pub type LeaveSummary = BTreeMap<&'static str, Balance>;

/// Checks a submission without touching the store.
pub fn validate_submission(employee_id: u64, input: SubmitLeave) -> Result<NewLeave, ApiError> {
    let (Some(leave_type), Some(start_date), Some(end_date), Some(reason)) =
        (input.leave_type, input.start_date, input.end_date, input.reason)
    else {
        return Err(ApiError::validation(
            "leave_type, start_date, end_date and reason are required",
        ));
    };

    let reason = reason.trim();
    if reason.is_empty() {
        return Err(ApiError::validation("reason must not be empty"));
    }

    let leave_type = LeaveCategory::from_input(&leave_type)
        .ok_or_else(|| ApiError::validation("Invalid leave type. Allowed: sick, casual, privilege"))?;

    if start_date > end_date {
        return Err(ApiError::validation("start_date cannot be after end_date"));
    }

    Ok(NewLeave {
        employee_id,
        leave_type,
        start_date,
        end_date,
        reason: reason.to_string(),
    })
}

#[instrument(name = "leave_submit", skip(store, actor, input))]
pub async fn submit<S>(store: &S, actor: &Actor, employee_id: u64, input: SubmitLeave) -> Result<LeaveRequest, ApiError>
where
    S: LeaveRepository + AuditRepository,
{
    let new_leave = validate_submission(employee_id, input)?;

    let leave = store.insert_leave(&new_leave).await.map_err(|e| match e {
        StoreError::Conflict(_) => {
            ApiError::Conflict("A leave request for this date range already exists".to_string())
        }
        StoreError::MissingReference(_) => ApiError::validation("Employee profile not found"),
        other => {
            error!(error = %other, employee_id, "Failed to create leave request");
            ApiError::from(other)
        }
    })?;

    audit::record(
        store,
        NewAuditEntry::new(audit::LEAVE_REQUESTED, ENTITY)
            .actor(Some(actor.user_id))
            .entity_id(leave.id)
            .details(json!({
                "employee_id": leave.employee_id,
                "leave_type": leave.leave_type,
                "start_date": leave.start_date,
                "end_date": leave.end_date,
                "total_days": leave.total_days,
            }))
            .origin(actor.origin.clone()),
    )
    .await;

    info!(leave_id = leave.id, "Leave request submitted");
    Ok(leave)
}

/// Approves a Pending request and marks every day of it On Leave.
/// Anything not Pending, including an already approved request, is NotFound.
#[instrument(name = "leave_approve", skip(store, actor))]
pub async fn approve<S>(store: &S, actor: &Actor, leave_id: u64) -> Result<LeaveRequest, ApiError>
where
    S: LeaveRepository + AuditRepository,
{
    let leave = store
        .approve_leave(leave_id)
        .await
        .map_err(|e| {
            error!(error = %e, leave_id, "Approve leave failed");
            ApiError::from(e)
        })?
        .ok_or_else(|| ApiError::not_found("Leave request not found or already processed"))?;

    audit::record(
        store,
        NewAuditEntry::new(audit::LEAVE_APPROVED, ENTITY)
            .actor(Some(actor.user_id))
            .entity_id(leave.id)
            .details(json!({
                "employee_id": leave.employee_id,
                "status": leave.status,
                "days": leave.total_days,
            }))
            .origin(actor.origin.clone()),
    )
    .await;

    info!(employee_id = leave.employee_id, days = leave.total_days, "Leave approved");
    Ok(leave)
}

/// Rejects a Pending or Approved request and clears its attendance rows.
#[instrument(name = "leave_reject", skip(store, actor))]
pub async fn reject<S>(store: &S, actor: &Actor, leave_id: u64) -> Result<LeaveRequest, ApiError>
where
    S: LeaveRepository + AuditRepository,
{
    let leave = store
        .reject_leave(leave_id)
        .await
        .map_err(|e| {
            error!(error = %e, leave_id, "Reject leave failed");
            ApiError::from(e)
        })?
        .ok_or_else(|| ApiError::not_found("Leave request not found or already rejected"))?;

    audit::record(
        store,
        NewAuditEntry::new(audit::LEAVE_REJECTED, ENTITY)
            .actor(Some(actor.user_id))
            .entity_id(leave.id)
            .details(json!({
                "employee_id": leave.employee_id,
                "status": leave.status,
            }))
            .origin(actor.origin.clone()),
    )
    .await;

    info!(employee_id = leave.employee_id, "Leave rejected");
    Ok(leave)
}

/// Sums approved leave days per category, counting only the days that fall in `year`.
pub fn summarize(approved: &[LeaveRequest], year: i32) -> LeaveSummary {
    LeaveCategory::iter()
        .map(|category| {
            let used: i64 = approved
                .iter()
                .filter(|l| l.leave_type == category)
                .map(|l| l.days_in_year(year))
                .sum();
            let total = category.entitlement();
            (
                category.summary_key(),
                Balance {
                    used,
                    total,
                    available: total - used,
                },
            )
        })
        .collect()
}

pub async fn summary<S: LeaveRepository>(store: &S, employee_id: u64, year: i32) -> Result<LeaveSummary, ApiError> {
    let approved = store
        .approved_leaves_in_year(employee_id, year)
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, year, "Failed to load leave summary");
            ApiError::Internal
        })?;

    Ok(summarize(&approved, year))
}
