use actix_web::{HttpRequest, HttpResponse, Responder, web};
use chrono::Datelike;
use serde::Deserialize;

use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::ApiError;
use crate::model::leave_request::{LeaveFilter, LeaveStatus};
use crate::repository::Store;
use crate::service::leave::{self, SubmitLeave};
use crate::utils::pagination::{Page, Pagination};
use crate::utils::time::office_today;

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub year: Option<i32>,
}

/* =========================
Create leave request
========================= */
pub async fn create_leave<S: Store>(
    auth: AuthUser,
    req: HttpRequest,
    store: web::Data<S>,
    payload: web::Json<SubmitLeave>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id()?;
    let leave = leave::submit(store.get_ref(), &auth.actor(&req), employee_id, payload.into_inner()).await?;

    Ok(HttpResponse::Created().json(leave))
}

/* =========================
Approve leave (Admin)
========================= */
pub async fn approve_leave<S: Store>(
    auth: AuthUser,
    req: HttpRequest,
    store: web::Data<S>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let leave = leave::approve(store.get_ref(), &auth.actor(&req), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(leave))
}

/* =========================
Reject leave (Admin)
========================= */
pub async fn reject_leave<S: Store>(
    auth: AuthUser,
    req: HttpRequest,
    store: web::Data<S>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let leave = leave::reject(store.get_ref(), &auth.actor(&req), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(leave))
}

/* =========================
List leaves
========================= */
pub async fn leave_list<S: Store>(
    auth: AuthUser,
    store: web::Data<S>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    let mut filter = query.into_inner();

    // non-admins only ever see their own requests
    if !auth.is_admin() {
        filter.employee_id = Some(auth.employee_id()?);
    }

    if let Some(status) = filter.status.as_deref() {
        status
            .parse::<LeaveStatus>()
            .map_err(|_| ApiError::validation("Invalid status. Allowed: Pending, Approved, Rejected"))?;
    }

    let page = Pagination::new(filter.page, filter.per_page);
    let (data, total) = store.list_leaves(&filter, page).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to list leave requests");
        ApiError::from(e)
    })?;

    Ok(HttpResponse::Ok().json(Page::new(data, page, total)))
}

/* =========================
Get leave
========================= */
pub async fn get_leave<S: Store>(
    auth: AuthUser,
    store: web::Data<S>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();

    let leave = store
        .get_leave(leave_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, leave_id, "Failed to fetch leave request");
            ApiError::from(e)
        })?
        // someone else's request is reported as absent
        .filter(|l| auth.is_admin() || auth.employee_id == Some(l.employee_id))
        .ok_or_else(|| ApiError::not_found("Leave request not found"))?;

    Ok(HttpResponse::Ok().json(leave))
}

/* =========================
Leave balance summary
========================= */
pub async fn leave_summary<S: Store>(
    auth: AuthUser,
    config: web::Data<Config>,
    store: web::Data<S>,
    query: web::Query<SummaryQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id()?;
    let year = query
        .year
        .unwrap_or_else(|| office_today(config.scheduler.utc_offset).year());

    let summary = leave::summary(store.get_ref(), employee_id, year).await?;
    Ok(HttpResponse::Ok().json(summary))
}
