use std::sync::Arc;

use actix_cors::Cors;
use actix_web::http::{header, Method};

mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod constants;
pub mod graceful_shutdown;
pub mod background_task;

pub use domain::{entities, sanitize, use_cases};
pub use interfaces::{handlers, repositories, middlewares, routes};
pub use infrastructure::{limiter, mail, utils};

use entities::email::MailSettings;
use limiter::rate_limiter::RateLimiter;
use mail::resend::ResendClient;
use use_cases::contact::{ContactHandler, SharedMailer};

pub struct AppState {
    pub contact_handler: ContactHandler,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    pub fn new(config: &settings::AppConfig) -> Self {
        let mailer = config.resend_api_key
            .as_deref()
            .filter(|_| config.has_mail_credentials())
            .and_then(|key| {
                ResendClient::new(&config.resend_api_url, key, config.mail_timeout())
                    .map_err(|e| tracing::error!("Mail client setup error: {}", e))
                    .ok()
            })
            .map(|client| Arc::new(client) as SharedMailer);

        if mailer.is_none() {
            tracing::warn!("No mail provider configured, contact messages will be refused");
        }

        let rate_limiter = RateLimiter::in_memory(config.rate_limit_max, config.rate_limit_window());

        AppState::with_parts(mailer, mail_settings(config), rate_limiter)
    }

    pub fn with_parts(
        mailer: Option<SharedMailer>,
        settings: MailSettings,
        rate_limiter: RateLimiter,
    ) -> Self {
        AppState {
            contact_handler: ContactHandler::new(mailer, settings),
            rate_limiter,
        }
    }
}

pub fn mail_settings(config: &settings::AppConfig) -> MailSettings {
    MailSettings {
        from: config.email_from.clone(),
        to: config.recipient(),
    }
}

pub fn build_cors(config: &settings::AppConfig) -> Cors {
    let origins = config.cors_origins();

    let cors = Cors::default()
        .allowed_methods([Method::POST, Method::GET, Method::OPTIONS])
        .allowed_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([
            header::RETRY_AFTER,
            header::HeaderName::from_static(middlewares::rate_limit::X_RATELIMIT_LIMIT),
            header::HeaderName::from_static(middlewares::rate_limit::X_RATELIMIT_REMAINING),
            header::HeaderName::from_static(middlewares::rate_limit::X_RATELIMIT_RESET),
        ])
        .max_age(3600);

    if origins.iter().any(|o| o == "*") {
        cors.allow_any_origin()
    } else {
        origins
            .iter()
            .fold(cors, |cors, origin| cors.allowed_origin(origin))
    }
}
