use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumString, AsRefStr)]
pub enum AttendanceStatus {
    Present,
    Absent,
    #[strum(serialize = "On Leave")]
    #[serde(rename = "On Leave")]
    OnLeave,
    #[strum(serialize = "Half Day")]
    #[serde(rename = "Half Day")]
    HalfDay,
}

impl TryFrom<String> for AttendanceStatus {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Attendance {
    pub id: u64,
    pub employee_id: u64,
    pub date: NaiveDate,
    #[sqlx(try_from = "String")]
    pub status: AttendanceStatus,
    pub check_in: Option<NaiveTime>,
    pub check_out: Option<NaiveTime>,
    pub remarks: Option<String>,
    pub work_hours: Option<f64>,
}

/// A checked-in row with no check-out yet.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OpenSession {
    pub id: u64,
    pub employee_id: u64,
    pub check_in: NaiveTime,
    pub remarks: Option<String>,
}

/// The values written when a session is closed.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedSession {
    pub id: u64,
    pub employee_id: u64,
    pub check_out: NaiveTime,
    pub work_hours: f64,
    pub remarks: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct AttendanceFilter {
    pub employee_id: Option<u64>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

/// Hours between check-in and check-out, rounded to two decimals and never negative.
pub fn work_hours(check_in: NaiveTime, check_out: NaiveTime) -> f64 {
    let seconds = (check_out - check_in).num_seconds().max(0) as f64;
    (seconds / 3600.0 * 100.0).round() / 100.0
}

/// Width of the `attendance.remarks` column.
pub const REMARKS_MAX_CHARS: usize = 255;

/// Appends `remark` to an existing remark instead of replacing it. The older
/// text is cut so the result fits the remarks column.
pub fn append_remark(existing: Option<&str>, remark: &str) -> String {
    const SEPARATOR: &str = " | ";

    let remark: String = remark.chars().take(REMARKS_MAX_CHARS).collect();
    match existing.map(str::trim) {
        Some(prev) if !prev.is_empty() => {
            let room = REMARKS_MAX_CHARS.saturating_sub(remark.chars().count() + SEPARATOR.len());
            if room == 0 {
                return remark;
            }
            let prev: String = prev.chars().take(room).collect();
            format!("{prev}{SEPARATOR}{remark}")
        }
        _ => remark,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn work_hours_rounds_to_two_decimals() {
        assert_eq!(work_hours(t(9, 0), t(23, 30)), 14.5);
        assert_eq!(work_hours(t(9, 0), t(9, 20)), 0.33);
        assert_eq!(work_hours(t(10, 0), t(9, 0)), 0.0);
    }

    #[test]
    fn remarks_are_concatenated() {
        assert_eq!(append_remark(None, "Auto Clock-out"), "Auto Clock-out");
        assert_eq!(append_remark(Some("  "), "Auto Clock-out"), "Auto Clock-out");
        assert_eq!(append_remark(Some("Late"), "Auto Clock-out"), "Late | Auto Clock-out");
    }

    #[test]
    fn statuses_use_stored_spelling() {
        assert_eq!(AttendanceStatus::OnLeave.as_ref(), "On Leave");
        assert_eq!(AttendanceStatus::try_from("Half Day".to_string()).unwrap(), AttendanceStatus::HalfDay);
    }

    #[test]
    fn appended_remark_fits_the_column() {
        let long = "x".repeat(300);
        let out = append_remark(Some(&long), "Auto Clock-out");
        assert_eq!(out.chars().count(), REMARKS_MAX_CHARS);
        assert!(out.ends_with(" | Auto Clock-out"));

        let wide = "é".repeat(254);
        let out = append_remark(Some(&wide), "Auto Clock-out");
        assert_eq!(out.chars().count(), REMARKS_MAX_CHARS);
    }
}
