use actix_web::{web, get, HttpResponse, Responder};
use humantime::format_duration;
use chrono::Utc;
use std::time::Duration;
use serde::Serialize;

use crate::{constants::START_TIME, AppState};

#[derive(Serialize)]
struct HealthCheckResponse {
    status: &'static str,
    uptime: String,
    timestamp: String,
    start_at: String,
    version: &'static str,
    mail_provider: &'static str,
    rate_limit: RateLimitInfo,
}

#[derive(Serialize)]
struct RateLimitInfo {
    limit: u32,
    window: String,
    tracked_clients: usize,
}

#[get("/health")]
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let now_utc = Utc::now();
    let uptime = now_utc.signed_duration_since(*START_TIME);
    let uptime = Duration::from_secs(uptime.num_seconds().max(0) as u64);

    let mail_provider = if state.contact_handler.is_configured() {
        "configured"
    } else {
        "missing credentials"
    };

    HttpResponse::Ok().json(HealthCheckResponse {
        status: "healthy",
        uptime: format_duration(uptime).to_string(),
        timestamp: now_utc.to_rfc3339(),
        start_at: START_TIME.to_rfc3339(),
        version: env!("CARGO_PKG_VERSION"),
        mail_provider,
        rate_limit: RateLimitInfo {
            limit: state.rate_limiter.limit(),
            window: format_duration(state.rate_limiter.window()).to_string(),
            tracked_clients: state.rate_limiter.tracked_clients().await,
        },
    })
}
