use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Holiday {
    pub id: u64,
    pub date: NaiveDate,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateHoliday {
    pub date: NaiveDate,
    pub name: String,
}
