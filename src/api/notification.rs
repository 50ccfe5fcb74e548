use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde_json::json;

use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::notification::NotificationFilter;
use crate::repository::Store;
use crate::service::notification::{self, SendNotification};

pub async fn send_notification<S: Store>(
    auth: AuthUser,
    req: HttpRequest,
    store: web::Data<S>,
    payload: web::Json<SendNotification>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let count = notification::send(store.get_ref(), &auth.actor(&req), payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Notification sent",
        "count": count
    })))
}

pub async fn list_notifications<S: Store>(
    auth: AuthUser,
    store: web::Data<S>,
    query: web::Query<NotificationFilter>,
) -> actix_web::Result<impl Responder> {
    let recipient_id = auth.employee_id()?;
    let unread_only = query.unread.unwrap_or(false);

    let data = store
        .list_notifications(recipient_id, unread_only)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, recipient_id, "Failed to list notifications");
            ApiError::from(e)
        })?;

    Ok(HttpResponse::Ok().json(data))
}

pub async fn mark_read<S: Store>(
    auth: AuthUser,
    store: web::Data<S>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let recipient_id = auth.employee_id()?;
    let id = path.into_inner();

    let found = store.mark_notification_read(id, recipient_id).await.map_err(|e| {
        tracing::error!(error = %e, notification_id = id, "Failed to mark notification read");
        ApiError::from(e)
    })?;

    if !found {
        return Err(ApiError::not_found("Notification not found").into());
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Notification marked as read" })))
}

pub async fn delete_notification<S: Store>(
    auth: AuthUser,
    store: web::Data<S>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let recipient_id = auth.employee_id()?;
    let id = path.into_inner();

    let deleted = store.delete_notification(id, recipient_id).await.map_err(|e| {
        tracing::error!(error = %e, notification_id = id, "Failed to delete notification");
        ApiError::from(e)
    })?;

    if !deleted {
        return Err(ApiError::not_found("Notification not found").into());
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Notification deleted" })))
}
