//! In-memory store for unit tests. Mirrors the unique keys and transactional
//! behaviour of the MySQL schema; every multi-row write is applied all at once
//! or not at all.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use sqlx::types::Json;

use super::{
    AttendanceRepository, AuditRepository, DirectoryRepository, HolidayRepository, LeaveRepository,
    NotificationRepository,
};
use crate::error::{StoreError, StoreResult};
use crate::model::{
    attendance::{Attendance, AttendanceFilter, AttendanceStatus, ClosedSession, OpenSession, work_hours},
    audit_log::{AuditLogEntry, NewAuditEntry},
    holiday::{CreateHoliday, Holiday},
    leave_request::{LeaveFilter, LeaveRequest, LeaveStatus, NewLeave},
    notification::{NewNotification, Notification},
    role::Role,
};
use crate::utils::pagination::Pagination;

#[derive(Debug, Clone)]
pub struct Employee {
    pub id: u64,
    pub role: Role,
    pub active: bool,
    pub active_attendance_id: Option<u64>,
}

#[derive(Default)]
pub struct MemoryState {
    pub employees: Vec<Employee>,
    pub leaves: Vec<LeaveRequest>,
    pub attendance: Vec<Attendance>,
    pub holidays: Vec<Holiday>,
    pub audit: Vec<AuditLogEntry>,
    pub notifications: Vec<Notification>,
    /// Makes the attendance fan-out of approve fail.
    pub fail_fan_out: bool,
    pub fail_audit: bool,
    /// Notification inserts for this recipient fail.
    pub fail_notification_for: Option<u64>,
    next_id: u64,
}

impl MemoryState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

fn paginate<T: Clone>(rows: Vec<T>, page: Pagination) -> (Vec<T>, i64) {
    let total = rows.len() as i64;
    let data = rows
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.per_page as usize)
        .collect();
    (data, total)
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap()
    }

    pub fn add_employee(&self, id: u64, role: Role, active: bool) {
        self.state().employees.push(Employee {
            id,
            role,
            active,
            active_attendance_id: None,
        });
    }

    /// Inserts an attendance row directly, bypassing check-in.
    pub fn seed_attendance(
        &self,
        employee_id: u64,
        date: NaiveDate,
        status: AttendanceStatus,
        check_in: Option<NaiveTime>,
        remarks: Option<&str>,
    ) -> u64 {
        let mut guard = self.state();
        let state = &mut *guard;
        let id = state.next_id();
        state.attendance.push(Attendance {
            id,
            employee_id,
            date,
            status,
            check_in,
            check_out: None,
            remarks: remarks.map(str::to_string),
            work_hours: None,
        });
        if check_in.is_some() {
            if let Some(e) = state.employees.iter_mut().find(|e| e.id == employee_id) {
                e.active_attendance_id = Some(id);
            }
        }
        id
    }

    pub fn seed_audit(&self, action: &str, created_at: DateTime<Utc>) {
        let mut state = self.state();
        let id = state.next_id();
        state.audit.push(AuditLogEntry {
            id,
            actor_id: None,
            action: action.to_string(),
            entity_name: "test".to_string(),
            entity_id: None,
            details: Json(serde_json::Value::Null),
            ip_address: None,
            created_at,
        });
    }

    pub fn attendance_for(&self, employee_id: u64) -> Vec<Attendance> {
        let mut rows: Vec<_> = self
            .state()
            .attendance
            .iter()
            .filter(|a| a.employee_id == employee_id)
            .cloned()
            .collect();
        rows.sort_by_key(|a| a.date);
        rows
    }
}

impl LeaveRepository for MemoryStore {
    async fn insert_leave(&self, leave: &NewLeave) -> StoreResult<LeaveRequest> {
        let mut state = self.state();
        let duplicate = state.leaves.iter().any(|l| {
            l.employee_id == leave.employee_id && l.start_date == leave.start_date && l.end_date == leave.end_date
        });
        if duplicate {
            return Err(StoreError::Conflict("uq_leave_range".into()));
        }

        let id = state.next_id();
        let row = LeaveRequest {
            id,
            employee_id: leave.employee_id,
            leave_type: leave.leave_type,
            start_date: leave.start_date,
            end_date: leave.end_date,
            total_days: leave.total_days(),
            reason: leave.reason.clone(),
            status: LeaveStatus::Pending,
            created_at: Utc::now(),
        };
        state.leaves.push(row.clone());
        Ok(row)
    }

    async fn get_leave(&self, id: u64) -> StoreResult<Option<LeaveRequest>> {
        Ok(self.state().leaves.iter().find(|l| l.id == id).cloned())
    }

    async fn list_leaves(&self, filter: &LeaveFilter, page: Pagination) -> StoreResult<(Vec<LeaveRequest>, i64)> {
        let rows: Vec<_> = self
            .state()
            .leaves
            .iter()
            .rev()
            .filter(|l| filter.employee_id.is_none_or(|id| l.employee_id == id))
            .filter(|l| filter.status.as_deref().is_none_or(|s| l.status.as_ref() == s))
            .cloned()
            .collect();
        Ok(paginate(rows, page))
    }

    async fn approve_leave(&self, id: u64) -> StoreResult<Option<LeaveRequest>> {
        let mut guard = self.state();
        let state = &mut *guard;
        let Some(idx) = state.leaves.iter().position(|l| l.id == id && l.status == LeaveStatus::Pending) else {
            return Ok(None);
        };
        let employee_id = state.leaves[idx].employee_id;
        if !state.employees.iter().any(|e| e.id == employee_id) {
            return Ok(None);
        }
        if state.fail_fan_out {
            return Err(StoreError::Backend("attendance fan-out failed".into()));
        }

        let leave = state.leaves[idx].clone();
        for date in leave.dates() {
            if let Some(existing) = state
                .attendance
                .iter_mut()
                .find(|a| a.employee_id == employee_id && a.date == date)
            {
                existing.status = AttendanceStatus::OnLeave;
                continue;
            }
            let row_id = state.next_id();
            state.attendance.push(Attendance {
                id: row_id,
                employee_id,
                date,
                status: AttendanceStatus::OnLeave,
                check_in: None,
                check_out: None,
                remarks: Some(format!("{} leave", leave.leave_type)),
                work_hours: None,
            });
        }

        state.leaves[idx].status = LeaveStatus::Approved;
        Ok(Some(state.leaves[idx].clone()))
    }

    async fn reject_leave(&self, id: u64) -> StoreResult<Option<LeaveRequest>> {
        let mut state = self.state();
        let Some(idx) = state
            .leaves
            .iter()
            .position(|l| l.id == id && matches!(l.status, LeaveStatus::Pending | LeaveStatus::Approved))
        else {
            return Ok(None);
        };

        let leave = state.leaves[idx].clone();
        state.attendance.retain(|a| {
            !(a.employee_id == leave.employee_id && a.date >= leave.start_date && a.date <= leave.end_date)
        });
        state.leaves[idx].status = LeaveStatus::Rejected;
        Ok(Some(state.leaves[idx].clone()))
    }

    async fn approved_leaves_in_year(&self, employee_id: u64, year: i32) -> StoreResult<Vec<LeaveRequest>> {
        Ok(self
            .state()
            .leaves
            .iter()
            .filter(|l| {
                l.employee_id == employee_id
                    && l.status == LeaveStatus::Approved
                    && l.start_date.year() <= year
                    && l.end_date.year() >= year
            })
            .cloned()
            .collect())
    }
}

impl AttendanceRepository for MemoryStore {
    async fn check_in(&self, employee_id: u64, date: NaiveDate, at: NaiveTime) -> StoreResult<Attendance> {
        let mut guard = self.state();
        let state = &mut *guard;

        let row = if let Some(existing) = state
            .attendance
            .iter_mut()
            .find(|a| a.employee_id == employee_id && a.date == date)
        {
            if existing.check_in.is_some() {
                return Err(StoreError::Conflict("uq_attendance_day".into()));
            }
            existing.status = AttendanceStatus::Present;
            existing.check_in = Some(at);
            existing.clone()
        } else {
            let id = state.next_id();
            let row = Attendance {
                id,
                employee_id,
                date,
                status: AttendanceStatus::Present,
                check_in: Some(at),
                check_out: None,
                remarks: None,
                work_hours: None,
            };
            state.attendance.push(row.clone());
            row
        };

        if let Some(e) = state.employees.iter_mut().find(|e| e.id == employee_id) {
            e.active_attendance_id = Some(row.id);
        }
        Ok(row)
    }

    async fn check_out(&self, employee_id: u64, date: NaiveDate, at: NaiveTime) -> StoreResult<Option<Attendance>> {
        let mut guard = self.state();
        let state = &mut *guard;
        let Some(row) = state.attendance.iter_mut().find(|a| {
            a.employee_id == employee_id && a.date == date && a.check_in.is_some() && a.check_out.is_none()
        }) else {
            return Ok(None);
        };
        row.check_out = Some(at);
        row.work_hours = row.check_in.map(|start| work_hours(start, at));
        let row = row.clone();

        if let Some(e) = state.employees.iter_mut().find(|e| e.id == employee_id) {
            e.active_attendance_id = None;
        }
        Ok(Some(row))
    }

    async fn list_attendance(&self, filter: &AttendanceFilter, page: Pagination) -> StoreResult<(Vec<Attendance>, i64)> {
        let mut rows: Vec<_> = self
            .state()
            .attendance
            .iter()
            .filter(|a| filter.employee_id.is_none_or(|id| a.employee_id == id))
            .filter(|a| filter.from.is_none_or(|d| a.date >= d))
            .filter(|a| filter.to.is_none_or(|d| a.date <= d))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(paginate(rows, page))
    }

    async fn open_sessions(&self, date: NaiveDate) -> StoreResult<Vec<OpenSession>> {
        let state = self.state();
        Ok(state
            .attendance
            .iter()
            .filter(|a| a.date == date && a.check_out.is_none())
            .filter(|a| {
                !state
                    .employees
                    .iter()
                    .any(|e| e.id == a.employee_id && e.role.is_admin())
            })
            .filter_map(|a| {
                a.check_in.map(|check_in| OpenSession {
                    id: a.id,
                    employee_id: a.employee_id,
                    check_in,
                    remarks: a.remarks.clone(),
                })
            })
            .collect())
    }

    async fn close_sessions(&self, sessions: &[ClosedSession]) -> StoreResult<u64> {
        let mut state = self.state();
        let mut closed = 0;
        for session in sessions {
            if let Some(row) = state
                .attendance
                .iter_mut()
                .find(|a| a.id == session.id && a.check_out.is_none())
            {
                row.check_out = Some(session.check_out);
                row.work_hours = Some(session.work_hours);
                row.remarks = session.remarks.clone();
                closed += 1;
            }
            if let Some(e) = state.employees.iter_mut().find(|e| e.id == session.employee_id) {
                e.active_attendance_id = None;
            }
        }
        Ok(closed)
    }

    async fn mark_absent(&self, date: NaiveDate, remark: &str) -> StoreResult<u64> {
        let mut guard = self.state();
        let state = &mut *guard;
        let missing: Vec<u64> = state
            .employees
            .iter()
            .filter(|e| e.active)
            .filter(|e| !state.attendance.iter().any(|a| a.employee_id == e.id && a.date == date))
            .map(|e| e.id)
            .collect();

        for employee_id in &missing {
            let id = state.next_id();
            state.attendance.push(Attendance {
                id,
                employee_id: *employee_id,
                date,
                status: AttendanceStatus::Absent,
                check_in: None,
                check_out: None,
                remarks: Some(remark.to_string()),
                work_hours: None,
            });
        }
        Ok(missing.len() as u64)
    }
}

impl DirectoryRepository for MemoryStore {
    async fn active_employee_ids(&self) -> StoreResult<Vec<u64>> {
        Ok(self
            .state()
            .employees
            .iter()
            .filter(|e| e.active && e.role == Role::Employee)
            .map(|e| e.id)
            .collect())
    }
}

impl HolidayRepository for MemoryStore {
    async fn is_holiday(&self, date: NaiveDate) -> StoreResult<bool> {
        Ok(self.state().holidays.iter().any(|h| h.date == date))
    }

    async fn add_holiday(&self, holiday: &CreateHoliday) -> StoreResult<Holiday> {
        let mut state = self.state();
        if state.holidays.iter().any(|h| h.date == holiday.date) {
            return Err(StoreError::Conflict("holidays.date".into()));
        }
        let row = Holiday {
            id: state.next_id(),
            date: holiday.date,
            name: holiday.name.clone(),
        };
        state.holidays.push(row.clone());
        Ok(row)
    }

    async fn list_holidays(&self, year: i32) -> StoreResult<Vec<Holiday>> {
        let mut rows: Vec<_> = self
            .state()
            .holidays
            .iter()
            .filter(|h| h.date.year() == year)
            .cloned()
            .collect();
        rows.sort_by_key(|h| h.date);
        Ok(rows)
    }
}

impl AuditRepository for MemoryStore {
    async fn insert_audit(&self, entry: &NewAuditEntry) -> StoreResult<()> {
        let mut state = self.state();
        if state.fail_audit {
            return Err(StoreError::Backend("audit table unavailable".into()));
        }
        let id = state.next_id();
        state.audit.push(AuditLogEntry {
            id,
            actor_id: entry.actor_id,
            action: entry.action.clone(),
            entity_name: entry.entity_name.clone(),
            entity_id: entry.entity_id.clone(),
            details: Json(entry.details.clone()),
            ip_address: entry.ip_address.clone(),
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn list_audit(&self, page: Pagination) -> StoreResult<(Vec<AuditLogEntry>, i64)> {
        let rows: Vec<_> = self.state().audit.iter().rev().cloned().collect();
        Ok(paginate(rows, page))
    }

    async fn purge_audit_before(&self, cutoff: DateTime<Utc>) -> StoreResult<u64> {
        let mut state = self.state();
        let before = state.audit.len();
        state.audit.retain(|e| e.created_at >= cutoff);
        Ok((before - state.audit.len()) as u64)
    }
}

impl NotificationRepository for MemoryStore {
    async fn insert_notification(&self, notification: &NewNotification) -> StoreResult<u64> {
        let mut state = self.state();
        if state.fail_notification_for == Some(notification.recipient_id) {
            return Err(StoreError::Backend("notification insert failed".into()));
        }
        let id = state.next_id();
        state.notifications.push(Notification {
            id,
            recipient_id: notification.recipient_id,
            title: notification.title.clone(),
            message: notification.message.clone(),
            category: notification.category.clone(),
            is_read: false,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn list_notifications(&self, recipient_id: u64, unread_only: bool) -> StoreResult<Vec<Notification>> {
        Ok(self
            .state()
            .notifications
            .iter()
            .rev()
            .filter(|n| n.recipient_id == recipient_id && (!unread_only || !n.is_read))
            .cloned()
            .collect())
    }

    async fn mark_notification_read(&self, id: u64, recipient_id: u64) -> StoreResult<bool> {
        let mut state = self.state();
        match state
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.recipient_id == recipient_id)
        {
            Some(n) => {
                n.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_notification(&self, id: u64, recipient_id: u64) -> StoreResult<bool> {
        let mut state = self.state();
        let before = state.notifications.len();
        state
            .notifications
            .retain(|n| !(n.id == id && n.recipient_id == recipient_id));
        Ok(state.notifications.len() < before)
    }
}
