//! Persistence gateway.
//!
//! Every operation re-queries the store; nothing is cached in-process.
//! Operations that touch more than one row commit or roll back as a unit.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::error::StoreResult;
use crate::model::{
    attendance::{Attendance, AttendanceFilter, ClosedSession, OpenSession},
    audit_log::{AuditLogEntry, NewAuditEntry},
    holiday::{CreateHoliday, Holiday},
    leave_request::{LeaveFilter, LeaveRequest, NewLeave},
    notification::{NewNotification, Notification},
};
use crate::utils::pagination::Pagination;

pub mod mysql;

#[cfg(test)]
pub mod memory;

pub use mysql::MySqlStore;

pub trait LeaveRepository: Send + Sync {
    /// Inserts a Pending request. Duplicate ranges fail with `StoreError::Conflict`.
    fn insert_leave(&self, leave: &NewLeave) -> impl Future<Output = StoreResult<LeaveRequest>> + Send;
    fn get_leave(&self, id: u64) -> impl Future<Output = StoreResult<Option<LeaveRequest>>> + Send;
    fn list_leaves(
        &self,
        filter: &LeaveFilter,
        page: Pagination,
    ) -> impl Future<Output = StoreResult<(Vec<LeaveRequest>, i64)>> + Send;
    /// Pending -> Approved plus an On Leave attendance row for every date in range.
    /// `None` when no Pending request with an existing employee matches.
    fn approve_leave(&self, id: u64) -> impl Future<Output = StoreResult<Option<LeaveRequest>>> + Send;
    /// Pending/Approved -> Rejected, deleting the employee's attendance rows in range.
    fn reject_leave(&self, id: u64) -> impl Future<Output = StoreResult<Option<LeaveRequest>>> + Send;
    /// Approved requests with at least one day in `year`.
    fn approved_leaves_in_year(
        &self,
        employee_id: u64,
        year: i32,
    ) -> impl Future<Output = StoreResult<Vec<LeaveRequest>>> + Send;
}

pub trait AttendanceRepository: Send + Sync {
    /// Records today's check-in and sets the profile's active-session marker.
    /// A row without a check-in (Absent, On Leave) becomes Present; a row that
    /// already has one fails with `StoreError::Conflict`.
    fn check_in(
        &self,
        employee_id: u64,
        date: NaiveDate,
        at: NaiveTime,
    ) -> impl Future<Output = StoreResult<Attendance>> + Send;
    /// Closes today's open session. `None` when there is nothing to close.
    fn check_out(
        &self,
        employee_id: u64,
        date: NaiveDate,
        at: NaiveTime,
    ) -> impl Future<Output = StoreResult<Option<Attendance>>> + Send;
    fn list_attendance(
        &self,
        filter: &AttendanceFilter,
        page: Pagination,
    ) -> impl Future<Output = StoreResult<(Vec<Attendance>, i64)>> + Send;
    /// Open sessions on `date` belonging to non-administrative employees.
    fn open_sessions(&self, date: NaiveDate) -> impl Future<Output = StoreResult<Vec<OpenSession>>> + Send;
    /// Writes the closed sessions and clears each employee's active-session marker.
    fn close_sessions(&self, sessions: &[ClosedSession]) -> impl Future<Output = StoreResult<u64>> + Send;
    /// Inserts an Absent row for every active employee without a row on `date`.
    fn mark_absent(&self, date: NaiveDate, remark: &str) -> impl Future<Output = StoreResult<u64>> + Send;
}

pub trait DirectoryRepository: Send + Sync {
    /// Active employees holding the `employee` role.
    fn active_employee_ids(&self) -> impl Future<Output = StoreResult<Vec<u64>>> + Send;
}

pub trait HolidayRepository: Send + Sync {
    fn is_holiday(&self, date: NaiveDate) -> impl Future<Output = StoreResult<bool>> + Send;
    fn add_holiday(&self, holiday: &CreateHoliday) -> impl Future<Output = StoreResult<Holiday>> + Send;
    fn list_holidays(&self, year: i32) -> impl Future<Output = StoreResult<Vec<Holiday>>> + Send;
}

pub trait AuditRepository: Send + Sync {
    fn insert_audit(&self, entry: &NewAuditEntry) -> impl Future<Output = StoreResult<()>> + Send;
    fn list_audit(&self, page: Pagination) -> impl Future<Output = StoreResult<(Vec<AuditLogEntry>, i64)>> + Send;
    fn purge_audit_before(&self, cutoff: DateTime<Utc>) -> impl Future<Output = StoreResult<u64>> + Send;
}

pub trait NotificationRepository: Send + Sync {
    fn insert_notification(&self, notification: &NewNotification) -> impl Future<Output = StoreResult<u64>> + Send;
    fn list_notifications(
        &self,
        recipient_id: u64,
        unread_only: bool,
    ) -> impl Future<Output = StoreResult<Vec<Notification>>> + Send;
    fn mark_notification_read(&self, id: u64, recipient_id: u64) -> impl Future<Output = StoreResult<bool>> + Send;
    fn delete_notification(&self, id: u64, recipient_id: u64) -> impl Future<Output = StoreResult<bool>> + Send;
}

/// Everything the HTTP surface and the scheduler need from the store.
pub trait Store:
    LeaveRepository
    + AttendanceRepository
    + DirectoryRepository
    + HolidayRepository
    + AuditRepository
    + NotificationRepository
    + Clone
    + 'static
{
}

impl<T> Store for T where
    T: LeaveRepository
        + AttendanceRepository
        + DirectoryRepository
        + HolidayRepository
        + AuditRepository
        + NotificationRepository
        + Clone
        + 'static
{
}
