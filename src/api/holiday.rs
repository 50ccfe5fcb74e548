use actix_web::{HttpRequest, HttpResponse, Responder, web};
use chrono::Datelike;
use serde::Deserialize;
use serde_json::json;

use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::{ApiError, StoreError};
use crate::model::audit_log::NewAuditEntry;
use crate::model::holiday::CreateHoliday;
use crate::repository::Store;
use crate::service::audit;
use crate::utils::time::office_today;

#[derive(Debug, Deserialize)]
pub struct HolidayQuery {
    pub year: Option<i32>,
}

pub async fn list_holidays<S: Store>(
    config: web::Data<Config>,
    store: web::Data<S>,
    query: web::Query<HolidayQuery>,
) -> actix_web::Result<impl Responder> {
    let year = query
        .year
        .unwrap_or_else(|| office_today(config.scheduler.utc_offset).year());

    let holidays = store.list_holidays(year).await.map_err(|e| {
        tracing::error!(error = %e, year, "Failed to list holidays");
        ApiError::from(e)
    })?;

    Ok(HttpResponse::Ok().json(holidays))
}

pub async fn create_holiday<S: Store>(
    auth: AuthUser,
    req: HttpRequest,
    store: web::Data<S>,
    payload: web::Json<CreateHoliday>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let mut payload = payload.into_inner();
    payload.name = payload.name.trim().to_string();
    if payload.name.is_empty() {
        return Err(ApiError::validation("name is required").into());
    }

    let holiday = store.add_holiday(&payload).await.map_err(|e| match e {
        StoreError::Conflict(_) => ApiError::Conflict("A holiday already exists on this date".to_string()),
        other => {
            tracing::error!(error = %other, date = %payload.date, "Failed to create holiday");
            ApiError::from(other)
        }
    })?;

    let actor = auth.actor(&req);
    audit::record(
        store.get_ref(),
        NewAuditEntry::new(audit::HOLIDAY_CREATED, "holidays")
            .actor(Some(actor.user_id))
            .entity_id(holiday.id)
            .details(json!({ "date": holiday.date, "name": holiday.name }))
            .origin(actor.origin),
    )
    .await;

    Ok(HttpResponse::Created().json(holiday))
}
