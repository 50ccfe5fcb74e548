use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

/// Current wall-clock time in the office's offset.
pub fn office_now(offset: FixedOffset) -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&offset)
}

pub fn office_today(offset: FixedOffset) -> NaiveDate {
    office_now(offset).date_naive()
}
