use crate::{
    api::{attendance, audit_log, holiday, leave_request, notification},
    auth::middleware::auth_middleware,
    config::Config,
    error::ApiError,
    repository::Store,
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use tracing::warn;

fn limiter_config(requests_per_min: u32) -> Option<GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        (60_000 / requests_per_min as u64).max(1)
    };
    GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()
}

/// Per-IP limiter allowing `requests_per_min` with a full-minute burst.
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let cfg = limiter_config(requests_per_min).unwrap_or_else(|| {
        warn!(requests_per_min, "Rejected rate limit settings, using governor defaults");
        GovernorConfig::default()
    });
    Governor::new(&cfg)
}

pub fn configure<S: Store>(cfg: &mut web::ServiceConfig, config: &Config) {
    let protected_limiter = build_limiter(config.rate_protected_per_min);

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter)
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .route(web::get().to(leave_request::leave_list::<S>))
                            .route(web::post().to(leave_request::create_leave::<S>)),
                    )
                    // /leave/summary, ahead of /leave/{id}
                    .service(
                        web::resource("/summary").route(web::get().to(leave_request::leave_summary::<S>)),
                    )
                    // /leave/{id}
                    .service(web::resource("/{id}").route(web::get().to(leave_request::get_leave::<S>)))
                    // /leave/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(leave_request::approve_leave::<S>)),
                    )
                    // /leave/{id}/reject
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::put().to(leave_request::reject_leave::<S>)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    .service(web::resource("").route(web::get().to(attendance::attendance_list::<S>)))
                    .service(web::resource("/check-in").route(web::post().to(attendance::check_in::<S>)))
                    .service(web::resource("/check-out").route(web::post().to(attendance::check_out::<S>))),
            )
            .service(
                web::scope("/notifications")
                    .service(
                        web::resource("")
                            .route(web::get().to(notification::list_notifications::<S>))
                            .route(web::post().to(notification::send_notification::<S>)),
                    )
                    .service(
                        web::resource("/{id}").route(web::delete().to(notification::delete_notification::<S>)),
                    )
                    .service(web::resource("/{id}/read").route(web::put().to(notification::mark_read::<S>))),
            )
            .service(
                web::scope("/holidays").service(
                    web::resource("")
                        .route(web::get().to(holiday::list_holidays::<S>))
                        .route(web::post().to(holiday::create_holiday::<S>)),
                ),
            )
            .service(
                web::scope("/audit-logs")
                    .service(web::resource("").route(web::get().to(audit_log::list_audit_logs::<S>))),
            ),
    );
}

/// Malformed bodies and queries answer with the same `{"message": ...}`
/// shape as every other error.
pub fn extractors(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default().error_handler(|err, _| ApiError::Validation(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default().error_handler(|err, _| ApiError::Validation(err.to_string()).into()),
    );
}
