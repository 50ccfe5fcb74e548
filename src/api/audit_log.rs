use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;

use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::repository::Store;
use crate::utils::pagination::{Page, Pagination};

#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

/// Most recent entries first.
pub async fn list_audit_logs<S: Store>(
    auth: AuthUser,
    store: web::Data<S>,
    query: web::Query<AuditQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let page = Pagination::new(query.page, query.per_page);
    let (data, total) = store.list_audit(page).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to list audit logs");
        ApiError::from(e)
    })?;

    Ok(HttpResponse::Ok().json(Page::new(data, page, total)))
}
