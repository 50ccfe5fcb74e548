use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::types::Json;
use sqlx::{MySql, MySqlPool, QueryBuilder};

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

const LEAVE_COLUMNS: &str = r#"
    lr.id, lr.employee_id, lr.leave_type, lr.start_date, lr.end_date,
    lr.total_days, lr.reason, lr.status, lr.created_at
"#;

const ATTENDANCE_COLUMNS: &str = r#"
    a.id, a.employee_id, a.date, a.status, a.check_in, a.check_out, a.remarks, a.work_hours
"#;

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
    Date(NaiveDate),
}

/// MySQL-backed persistence gateway. Cloning shares the pool.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    async fn select_leave(&self, id: u64) -> StoreResult<Option<LeaveRequest>> {
        let sql = format!("SELECT {LEAVE_COLUMNS} FROM leave_requests lr WHERE lr.id = ?");
        let leave = sqlx::query_as::<_, LeaveRequest>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(leave)
    }
}

impl LeaveRepository for MySqlStore {
    async fn insert_leave(&self, leave: &NewLeave) -> StoreResult<LeaveRequest> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (employee_id, leave_type, start_date, end_date, total_days, reason, status)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(leave.employee_id)
        .bind(leave.leave_type.as_ref())
        .bind(leave.start_date)
        .bind(leave.end_date)
        .bind(leave.total_days())
        .bind(&leave.reason)
        .bind(LeaveStatus::Pending.as_ref())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_id();
        self.select_leave(id)
            .await?
            .ok_or_else(|| StoreError::Backend(format!("leave {id} vanished after insert")))
    }

    async fn get_leave(&self, id: u64) -> StoreResult<Option<LeaveRequest>> {
        self.select_leave(id).await
    }

    async fn list_leaves(&self, filter: &LeaveFilter, page: Pagination) -> StoreResult<(Vec<LeaveRequest>, i64)> {
        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<FilterValue> = Vec::new();

        if let Some(emp_id) = filter.employee_id {
            where_sql.push_str(" AND lr.employee_id = ?");
            args.push(FilterValue::U64(emp_id));
        }

        if let Some(status) = filter.status.as_deref() {
            where_sql.push_str(" AND lr.status = ?");
            args.push(FilterValue::Str(status));
        }

        let count_sql = format!("SELECT COUNT(*) FROM leave_requests lr{where_sql}");
        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        for arg in &args {
            count_q = match arg {
                FilterValue::U64(v) => count_q.bind(*v),
                FilterValue::Str(s) => count_q.bind(*s),
                FilterValue::Date(d) => count_q.bind(*d),
            };
        }
        let total = count_q.fetch_one(&self.pool).await?;

        let data_sql = format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests lr{where_sql} ORDER BY lr.created_at DESC, lr.id DESC LIMIT ? OFFSET ?"
        );
        let mut data_q = sqlx::query_as::<_, LeaveRequest>(&data_sql);
        for arg in args {
            data_q = match arg {
                FilterValue::U64(v) => data_q.bind(v),
                FilterValue::Str(s) => data_q.bind(s),
                FilterValue::Date(d) => data_q.bind(d),
            };
        }

        let leaves = data_q
            .bind(page.per_page)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((leaves, total))
    }

    async fn approve_leave(&self, id: u64) -> StoreResult<Option<LeaveRequest>> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            SELECT {LEAVE_COLUMNS}
            FROM leave_requests lr
            JOIN employees e ON e.id = lr.employee_id
            WHERE lr.id = ? AND lr.status = ?
            FOR UPDATE
            "#
        );
        let Some(mut leave) = sqlx::query_as::<_, LeaveRequest>(&sql)
            .bind(id)
            .bind(LeaveStatus::Pending.as_ref())
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        sqlx::query("UPDATE leave_requests SET status = ? WHERE id = ?")
            .bind(LeaveStatus::Approved.as_ref())
            .bind(id)
            .execute(&mut *tx)
            .await?;

        // existing rows keep their check-in/out times, only the status flips
        let dates = leave.dates();
        if !dates.is_empty() {
            let remark = format!("{} leave", leave.leave_type);
            let mut fan_out: QueryBuilder<MySql> =
                QueryBuilder::new("INSERT INTO attendance (employee_id, date, status, remarks) ");
            fan_out.push_values(dates, |mut row, date| {
                row.push_bind(leave.employee_id)
                    .push_bind(date)
                    .push_bind(AttendanceStatus::OnLeave.to_string())
                    .push_bind(remark.clone());
            });
            fan_out.push(" ON DUPLICATE KEY UPDATE status = VALUES(status)");
            fan_out.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;

        leave.status = LeaveStatus::Approved;
        Ok(Some(leave))
    }

    async fn reject_leave(&self, id: u64) -> StoreResult<Option<LeaveRequest>> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            SELECT {LEAVE_COLUMNS}
            FROM leave_requests lr
            JOIN employees e ON e.id = lr.employee_id
            WHERE lr.id = ? AND lr.status IN (?, ?)
            FOR UPDATE
            "#
        );
        let Some(mut leave) = sqlx::query_as::<_, LeaveRequest>(&sql)
            .bind(id)
            .bind(LeaveStatus::Pending.as_ref())
            .bind(LeaveStatus::Approved.as_ref())
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        sqlx::query("UPDATE leave_requests SET status = ? WHERE id = ?")
            .bind(LeaveStatus::Rejected.as_ref())
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            DELETE FROM attendance
            WHERE employee_id = ?
            AND date BETWEEN ? AND ?
            "#,
        )
        .bind(leave.employee_id)
        .bind(leave.start_date)
        .bind(leave.end_date)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        leave.status = LeaveStatus::Rejected;
        Ok(Some(leave))
    }

    async fn approved_leaves_in_year(&self, employee_id: u64, year: i32) -> StoreResult<Vec<LeaveRequest>> {
        let sql = format!(
            r#"
            SELECT {LEAVE_COLUMNS}
            FROM leave_requests lr
            WHERE lr.employee_id = ?
            AND lr.status = ?
            AND YEAR(lr.start_date) <= ?
            AND YEAR(lr.end_date) >= ?
            "#
        );
        let leaves = sqlx::query_as::<_, LeaveRequest>(&sql)
            .bind(employee_id)
            .bind(LeaveStatus::Approved.as_ref())
            .bind(year)
            .bind(year)
            .fetch_all(&self.pool)
            .await?;
        Ok(leaves)
    }
}

impl AttendanceRepository for MySqlStore {
    async fn check_in(&self, employee_id: u64, date: NaiveDate, at: NaiveTime) -> StoreResult<Attendance> {
        let mut tx = self.pool.begin().await?;

        // an Absent or On Leave row written earlier in the day is taken over;
        // only a row that already has a check-in is a conflict
        let existing = sqlx::query_as::<_, (u64, Option<NaiveTime>)>(
            "SELECT id, check_in FROM attendance WHERE employee_id = ? AND date = ? FOR UPDATE",
        )
        .bind(employee_id)
        .bind(date)
        .fetch_optional(&mut *tx)
        .await?;

        let id = match existing {
            Some((_, Some(_))) => {
                return Err(StoreError::Conflict(format!("attendance for {employee_id} on {date}")));
            }
            Some((id, None)) => {
                sqlx::query("UPDATE attendance SET status = ?, check_in = ? WHERE id = ?")
                    .bind(AttendanceStatus::Present.as_ref())
                    .bind(at)
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
                id
            }
            None => {
                let result = sqlx::query(
                    r#"
                    INSERT INTO attendance (employee_id, date, status, check_in)
                    VALUES (?, ?, ?, ?)
                    "#,
                )
                .bind(employee_id)
                .bind(date)
                .bind(AttendanceStatus::Present.as_ref())
                .bind(at)
                .execute(&mut *tx)
                .await?;
                result.last_insert_id()
            }
        };

        sqlx::query("UPDATE employees SET active_attendance_id = ? WHERE id = ?")
            .bind(id)
            .bind(employee_id)
            .execute(&mut *tx)
            .await?;

        let sql = format!("SELECT {ATTENDANCE_COLUMNS} FROM attendance a WHERE a.id = ?");
        let record = sqlx::query_as::<_, Attendance>(&sql)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(record)
    }

    async fn check_out(&self, employee_id: u64, date: NaiveDate, at: NaiveTime) -> StoreResult<Option<Attendance>> {
        let mut tx = self.pool.begin().await?;

        let Some(session) = sqlx::query_as::<_, OpenSession>(
            r#"
            SELECT id, employee_id, check_in, remarks
            FROM attendance
            WHERE employee_id = ?
            AND date = ?
            AND check_in IS NOT NULL
            AND check_out IS NULL
            FOR UPDATE
            "#,
        )
        .bind(employee_id)
        .bind(date)
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Ok(None);
        };

        sqlx::query("UPDATE attendance SET check_out = ?, work_hours = ? WHERE id = ?")
            .bind(at)
            .bind(work_hours(session.check_in, at))
            .bind(session.id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE employees SET active_attendance_id = NULL WHERE id = ?")
            .bind(employee_id)
            .execute(&mut *tx)
            .await?;

        let sql = format!("SELECT {ATTENDANCE_COLUMNS} FROM attendance a WHERE a.id = ?");
        let record = sqlx::query_as::<_, Attendance>(&sql)
            .bind(session.id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(record))
    }

    async fn list_attendance(&self, filter: &AttendanceFilter, page: Pagination) -> StoreResult<(Vec<Attendance>, i64)> {
        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<FilterValue> = Vec::new();

        if let Some(emp_id) = filter.employee_id {
            where_sql.push_str(" AND a.employee_id = ?");
            args.push(FilterValue::U64(emp_id));
        }
        if let Some(from) = filter.from {
            where_sql.push_str(" AND a.date >= ?");
            args.push(FilterValue::Date(from));
        }
        if let Some(to) = filter.to {
            where_sql.push_str(" AND a.date <= ?");
            args.push(FilterValue::Date(to));
        }

        let count_sql = format!("SELECT COUNT(*) FROM attendance a{where_sql}");
        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        for arg in &args {
            count_q = match arg {
                FilterValue::U64(v) => count_q.bind(*v),
                FilterValue::Str(s) => count_q.bind(*s),
                FilterValue::Date(d) => count_q.bind(*d),
            };
        }
        let total = count_q.fetch_one(&self.pool).await?;

        let data_sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance a{where_sql} ORDER BY a.date DESC, a.id DESC LIMIT ? OFFSET ?"
        );
        let mut data_q = sqlx::query_as::<_, Attendance>(&data_sql);
        for arg in args {
            data_q = match arg {
                FilterValue::U64(v) => data_q.bind(v),
                FilterValue::Str(s) => data_q.bind(s),
                FilterValue::Date(d) => data_q.bind(d),
            };
        }

        let rows = data_q
            .bind(page.per_page)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((rows, total))
    }

    async fn open_sessions(&self, date: NaiveDate) -> StoreResult<Vec<OpenSession>> {
        let sessions = sqlx::query_as::<_, OpenSession>(
            r#"
            SELECT a.id, a.employee_id, a.check_in, a.remarks
            FROM attendance a
            WHERE a.date = ?
            AND a.check_in IS NOT NULL
            AND a.check_out IS NULL
            AND NOT EXISTS (
                SELECT 1 FROM users u
                WHERE u.employee_id = a.employee_id
                AND u.role_id IN (?, ?)
            )
            "#,
        )
        .bind(date)
        .bind(Role::SuperAdmin.id())
        .bind(Role::Admin.id())
        .fetch_all(&self.pool)
        .await?;
        Ok(sessions)
    }

    async fn close_sessions(&self, sessions: &[ClosedSession]) -> StoreResult<u64> {
        let mut tx = self.pool.begin().await?;
        let mut closed = 0;

        for session in sessions {
            let result = sqlx::query(
                r#"
                UPDATE attendance
                SET check_out = ?, work_hours = ?, remarks = ?
                WHERE id = ?
                AND check_out IS NULL
                "#,
            )
            .bind(session.check_out)
            .bind(session.work_hours)
            .bind(session.remarks.as_deref())
            .bind(session.id)
            .execute(&mut *tx)
            .await?;
            closed += result.rows_affected();

            sqlx::query("UPDATE employees SET active_attendance_id = NULL WHERE id = ?")
                .bind(session.employee_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(closed)
    }

    async fn mark_absent(&self, date: NaiveDate, remark: &str) -> StoreResult<u64> {
        // rows that already exist for the date are left untouched
        let result = sqlx::query(
            r#"
            INSERT INTO attendance (employee_id, date, status, remarks)
            SELECT e.id, ?, ?, ?
            FROM employees e
            WHERE e.status = 'active'
            AND NOT EXISTS (
                SELECT 1 FROM attendance a
                WHERE a.employee_id = e.id
                AND a.date = ?
            )
            ON DUPLICATE KEY UPDATE id = id
            "#,
        )
        .bind(date)
        .bind(AttendanceStatus::Absent.as_ref())
        .bind(remark)
        .bind(date)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

impl DirectoryRepository for MySqlStore {
    async fn active_employee_ids(&self) -> StoreResult<Vec<u64>> {
        let ids = sqlx::query_scalar::<_, u64>(
            r#"
            SELECT DISTINCT e.id
            FROM employees e
            JOIN users u ON u.employee_id = e.id
            WHERE u.role_id = ?
            AND u.is_active = TRUE
            AND e.status = 'active'
            "#,
        )
        .bind(Role::Employee.id())
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }
}

impl HolidayRepository for MySqlStore {
    async fn is_holiday(&self, date: NaiveDate) -> StoreResult<bool> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM holidays WHERE date = ?")
            .bind(date)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    async fn add_holiday(&self, holiday: &CreateHoliday) -> StoreResult<Holiday> {
        let result = sqlx::query("INSERT INTO holidays (date, name) VALUES (?, ?)")
            .bind(holiday.date)
            .bind(&holiday.name)
            .execute(&self.pool)
            .await?;

        Ok(Holiday {
            id: result.last_insert_id(),
            date: holiday.date,
            name: holiday.name.clone(),
        })
    }

    async fn list_holidays(&self, year: i32) -> StoreResult<Vec<Holiday>> {
        let holidays = sqlx::query_as::<_, Holiday>(
            "SELECT id, date, name FROM holidays WHERE YEAR(date) = ? ORDER BY date",
        )
        .bind(year)
        .fetch_all(&self.pool)
        .await?;
        Ok(holidays)
    }
}

impl AuditRepository for MySqlStore {
    async fn insert_audit(&self, entry: &NewAuditEntry) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs
                (actor_id, action, entity_name, entity_id, details, ip_address)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.actor_id)
        .bind(&entry.action)
        .bind(&entry.entity_name)
        .bind(entry.entity_id.as_deref())
        .bind(Json(&entry.details))
        .bind(entry.ip_address.as_deref())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_audit(&self, page: Pagination) -> StoreResult<(Vec<AuditLogEntry>, i64)> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM audit_logs")
            .fetch_one(&self.pool)
            .await?;

        let entries = sqlx::query_as::<_, AuditLogEntry>(
            r#"
            SELECT id, actor_id, action, entity_name, entity_id, details, ip_address, created_at
            FROM audit_logs
            ORDER BY created_at DESC, id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(page.per_page)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((entries, total))
    }

    async fn purge_audit_before(&self, cutoff: DateTime<Utc>) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM audit_logs WHERE created_at < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

impl NotificationRepository for MySqlStore {
    async fn insert_notification(&self, notification: &NewNotification) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO notifications (recipient_id, title, message, category)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(notification.recipient_id)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(&notification.category)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_id())
    }

    async fn list_notifications(&self, recipient_id: u64, unread_only: bool) -> StoreResult<Vec<Notification>> {
        let mut sql = String::from(
            r#"
            SELECT id, recipient_id, title, message, category, is_read, created_at
            FROM notifications
            WHERE recipient_id = ?
            "#,
        );
        if unread_only {
            sql.push_str(" AND is_read = FALSE");
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC");

        let rows = sqlx::query_as::<_, Notification>(&sql)
            .bind(recipient_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn mark_notification_read(&self, id: u64, recipient_id: u64) -> StoreResult<bool> {
        // affected-rows counts only changed rows, so ownership is checked separately
        let owned = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE id = ? AND recipient_id = ?",
        )
        .bind(id)
        .bind(recipient_id)
        .fetch_one(&self.pool)
        .await?;
        if owned == 0 {
            return Ok(false);
        }

        sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(true)
    }

    async fn delete_notification(&self, id: u64, recipient_id: u64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = ? AND recipient_id = ?")
            .bind(id)
            .bind(recipient_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
