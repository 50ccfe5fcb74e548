use actix_web::{HttpResponse, Responder, web};

use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::ApiError;
use crate::model::attendance::AttendanceFilter;
use crate::repository::Store;
use crate::service::attendance;
use crate::utils::pagination::{Page, Pagination};
use crate::utils::time::office_now;

/* =========================
Check in
========================= */
pub async fn check_in<S: Store>(
    auth: AuthUser,
    config: web::Data<Config>,
    store: web::Data<S>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id()?;
    let now = office_now(config.scheduler.utc_offset);

    let record = attendance::check_in(store.get_ref(), employee_id, now.date_naive(), now.time()).await?;
    Ok(HttpResponse::Created().json(record))
}

/* =========================
Check out
========================= */
pub async fn check_out<S: Store>(
    auth: AuthUser,
    config: web::Data<Config>,
    store: web::Data<S>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id()?;
    let now = office_now(config.scheduler.utc_offset);

    let record = attendance::check_out(store.get_ref(), employee_id, now.date_naive(), now.time()).await?;
    Ok(HttpResponse::Ok().json(record))
}

/* =========================
List attendance
========================= */
pub async fn attendance_list<S: Store>(
    auth: AuthUser,
    store: web::Data<S>,
    query: web::Query<AttendanceFilter>,
) -> actix_web::Result<impl Responder> {
    let mut filter = query.into_inner();
    if !auth.is_admin() {
        filter.employee_id = Some(auth.employee_id()?);
    }

    if let (Some(from), Some(to)) = (filter.from, filter.to) {
        if from > to {
            return Err(ApiError::validation("from cannot be after to").into());
        }
    }

    let page = Pagination::new(filter.page, filter.per_page);
    let (data, total) = store.list_attendance(&filter, page).await.map_err(|e| {
        tracing::error!(error = %e, employee_id = ?filter.employee_id, "Failed to list attendance");
        ApiError::from(e)
    })?;

    Ok(HttpResponse::Ok().json(Page::new(data, page, total)))
}
