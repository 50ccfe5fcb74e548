use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::types::Json;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AuditLogEntry {
    pub id: u64,
    /// `None` for system-originated actions.
    pub actor_id: Option<u64>,
    pub action: String,
    pub entity_name: String,
    pub entity_id: Option<String>,
    pub details: Json<Value>,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub actor_id: Option<u64>,
    pub action: String,
    pub entity_name: String,
    pub entity_id: Option<String>,
    pub details: Value,
    pub ip_address: Option<String>,
}

impl NewAuditEntry {
    pub fn new(action: &str, entity_name: &str) -> Self {
        Self {
            actor_id: None,
            action: action.to_string(),
            entity_name: entity_name.to_string(),
            entity_id: None,
            details: Value::Null,
            ip_address: None,
        }
    }

    pub fn actor(mut self, actor_id: Option<u64>) -> Self {
        self.actor_id = actor_id;
        self
    }

    pub fn entity_id(mut self, id: impl ToString) -> Self {
        self.entity_id = Some(id.to_string());
        self
    }

    pub fn details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    pub fn origin(mut self, ip_address: Option<String>) -> Self {
        self.ip_address = ip_address;
        self
    }
}
