use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Leave categories as persisted in `leave_requests.leave_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString, AsRefStr, EnumIter)]
pub enum LeaveCategory {
    Sick,
    Casual,
    Privilege,
}

/// Accepted request spellings and the category each one is stored as.
/// Matching is case-insensitive; anything not listed is rejected.
const CATEGORY_INPUTS: &[(&str, LeaveCategory)] = &[
    ("sick", LeaveCategory::Sick),
    ("casual", LeaveCategory::Casual),
    ("privilege", LeaveCategory::Privilege),
];

impl LeaveCategory {
    pub fn from_input(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        CATEGORY_INPUTS
            .iter()
            .find(|(input, _)| input.eq_ignore_ascii_case(raw))
            .map(|(_, category)| *category)
    }

    /// Days granted per calendar year.
    pub fn entitlement(self) -> i64 {
        match self {
            LeaveCategory::Sick => 10,
            LeaveCategory::Casual => 12,
            LeaveCategory::Privilege => 15,
        }
    }

    /// Key used in the balance summary payload.
    pub fn summary_key(self) -> &'static str {
        match self {
            LeaveCategory::Sick => "sick",
            LeaveCategory::Casual => "casual",
            LeaveCategory::Privilege => "privilege",
        }
    }
}

impl TryFrom<String> for LeaveCategory {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumString, AsRefStr)]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

impl TryFrom<String> for LeaveStatus {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LeaveRequest {
    pub id: u64,
    pub employee_id: u64,
    #[sqlx(try_from = "String")]
    pub leave_type: LeaveCategory,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_days: i64,
    pub reason: String,
    #[sqlx(try_from = "String")]
    pub status: LeaveStatus,
    pub created_at: DateTime<Utc>,
}

impl LeaveRequest {
    pub fn dates(&self) -> Vec<NaiveDate> {
        leave_dates(self.start_date, self.end_date)
    }

    /// Days of this request falling inside calendar `year`.
    pub fn days_in_year(&self, year: i32) -> i64 {
        let (Some(first), Some(last)) = (
            NaiveDate::from_ymd_opt(year, 1, 1),
            NaiveDate::from_ymd_opt(year, 12, 31),
        ) else {
            return 0;
        };

        let start = self.start_date.max(first);
        let end = self.end_date.min(last);
        if start > end { 0 } else { leave_days(start, end) }
    }
}

/// A validated submission, ready to be inserted as Pending.
#[derive(Debug, Clone)]
pub struct NewLeave {
    pub employee_id: u64,
    pub leave_type: LeaveCategory,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
}

impl NewLeave {
    pub fn total_days(&self) -> i64 {
        leave_days(self.start_date, self.end_date)
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct LeaveFilter {
    pub employee_id: Option<u64>,
    pub status: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

/// Inclusive day count of a leave range.
pub fn leave_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

/// Every calendar date from `start` to `end`, both included.
pub fn leave_dates(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut day = start;
    while day <= end {
        dates.push(day);
        day += Duration::days(1);
    }
    dates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn category_lookup_is_case_insensitive() {
        assert_eq!(LeaveCategory::from_input("sick"), Some(LeaveCategory::Sick));
        assert_eq!(LeaveCategory::from_input("CASUAL"), Some(LeaveCategory::Casual));
        assert_eq!(LeaveCategory::from_input(" Privilege "), Some(LeaveCategory::Privilege));
    }

    #[test]
    fn unmapped_category_is_rejected() {
        assert_eq!(LeaveCategory::from_input("annual"), None);
        assert_eq!(LeaveCategory::from_input(""), None);
        assert_eq!(LeaveCategory::from_input("sick leave"), None);
    }

    #[test]
    fn stored_names_parse_back() {
        assert_eq!(LeaveCategory::try_from("Privilege".to_string()).unwrap(), LeaveCategory::Privilege);
        assert_eq!(LeaveStatus::try_from("Approved".to_string()).unwrap(), LeaveStatus::Approved);
        assert!(LeaveStatus::try_from("approved".to_string()).is_err());
    }

    #[test]
    fn range_is_inclusive() {
        assert_eq!(leave_days(date(2026, 3, 2), date(2026, 3, 2)), 1);
        assert_eq!(leave_days(date(2026, 2, 27), date(2026, 3, 2)), 4);

        let dates = leave_dates(date(2026, 12, 30), date(2027, 1, 1));
        assert_eq!(dates, vec![date(2026, 12, 30), date(2026, 12, 31), date(2027, 1, 1)]);
    }
}
