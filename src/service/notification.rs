use futures::future::try_join_all;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, instrument};

use super::{Actor, audit};
use crate::error::ApiError;
use crate::model::audit_log::NewAuditEntry;
use crate::model::notification::NewNotification;
use crate::repository::{AuditRepository, DirectoryRepository, NotificationRepository};

const DEFAULT_CATEGORY: &str = "general";

#[derive(Debug, Default, Deserialize)]
pub struct SendNotification {
    #[serde(default)]
    pub recipients: Vec<u64>,
    #[serde(default, alias = "sendToAll")]
    pub send_to_all: bool,
    pub title: Option<String>,
    pub message: Option<String>,
    #[serde(alias = "type")]
    pub category: Option<String>,
}

fn non_empty(value: Option<String>, field: &str) -> Result<String, ApiError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ApiError::validation(format!("{field} is required"))),
    }
}

/// Fans a notification out to every recipient and returns how many were written.
///
/// Inserts run concurrently; the first failure is returned while inserts
/// that already succeeded stay committed.
#[instrument(name = "notification_send", skip(store, actor, input))]
pub async fn send<S>(store: &S, actor: &Actor, input: SendNotification) -> Result<usize, ApiError>
where
    S: NotificationRepository + DirectoryRepository + AuditRepository,
{
    let title = non_empty(input.title, "title")?;
    let message = non_empty(input.message, "message")?;
    let category = input
        .category
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

    let mut recipients = if input.send_to_all {
        store.active_employee_ids().await.map_err(|e| {
            error!(error = %e, "Failed to resolve broadcast recipients");
            ApiError::from(e)
        })?
    } else {
        input.recipients
    };
    recipients.sort_unstable();
    recipients.dedup();

    if recipients.is_empty() {
        return Err(ApiError::validation("No recipients to notify"));
    }

    let rows: Vec<NewNotification> = recipients
        .iter()
        .map(|&recipient_id| NewNotification {
            recipient_id,
            title: title.clone(),
            message: message.clone(),
            category: category.clone(),
        })
        .collect();

    try_join_all(rows.iter().map(|row| store.insert_notification(row)))
        .await
        .map_err(|e| {
            error!(error = %e, recipients = rows.len(), "Failed to insert notifications");
            ApiError::from(e)
        })?;

    let count = rows.len();

    audit::record(
        store,
        NewAuditEntry::new(audit::NOTIFICATION_SENT, "notifications")
            .actor(Some(actor.user_id))
            .details(json!({
                "recipient_count": count,
                "category": category,
                "broadcast": input.send_to_all,
            }))
            .origin(actor.origin.clone()),
    )
    .await;

    info!(count, broadcast = input.send_to_all, "Notifications sent");
    Ok(count)
}
