use tracing::warn;

use crate::model::audit_log::NewAuditEntry;
use crate::repository::AuditRepository;

pub const LEAVE_REQUESTED: &str = "LEAVE_REQUESTED";
pub const LEAVE_APPROVED: &str = "LEAVE_APPROVED";
pub const LEAVE_REJECTED: &str = "LEAVE_REJECTED";
pub const NOTIFICATION_SENT: &str = "NOTIFICATION_SENT";
pub const HOLIDAY_CREATED: &str = "HOLIDAY_CREATED";

/// Appends an audit entry. Failures are logged and swallowed so the
/// triggering operation never fails because of its audit trail.
pub async fn record<S: AuditRepository>(store: &S, entry: NewAuditEntry) {
    if let Err(e) = store.insert_audit(&entry).await {
        warn!(
            error = %e,
            action = %entry.action,
            entity = %entry.entity_name,
            entity_id = ?entry.entity_id,
            "Failed to record audit entry"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::memory::MemoryStore;

    #[actix_web::test]
    async fn failures_are_swallowed() {
        let store = MemoryStore::new();
        store.state().fail_audit = true;

        record(&store, NewAuditEntry::new(LEAVE_APPROVED, "leave_requests")).await;
        assert!(store.state().audit.is_empty());
    }

    #[actix_web::test]
    async fn entries_keep_actor_and_origin() {
        let store = MemoryStore::new();
        let entry = NewAuditEntry::new(LEAVE_APPROVED, "leave_requests")
            .actor(Some(7))
            .entity_id(42)
            .origin(Some("10.0.0.1".into()));

        record(&store, entry).await;

        let state = store.state();
        assert_eq!(state.audit.len(), 1);
        assert_eq!(state.audit[0].actor_id, Some(7));
        assert_eq!(state.audit[0].entity_id.as_deref(), Some("42"));
        assert_eq!(state.audit[0].ip_address.as_deref(), Some("10.0.0.1"));
    }
}
