use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Notification {
    pub id: u64,
    pub recipient_id: u64,
    pub title: String,
    pub message: String,
    pub category: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub recipient_id: u64,
    pub title: String,
    pub message: String,
    pub category: String,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct NotificationFilter {
    pub unread: Option<bool>,
}
