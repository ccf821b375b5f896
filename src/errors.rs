use actix_web::{
    error::ResponseError,
    http::{header::{ContentType, ALLOW, RETRY_AFTER}, StatusCode},
    HttpResponse,
};
use derive_more::Display;
use serde_json::json;

use crate::limiter::rate_limiter::QuotaSnapshot;
use crate::middlewares::rate_limit::{X_RATELIMIT_LIMIT, X_RATELIMIT_REMAINING, X_RATELIMIT_RESET};

pub const METHOD_NOT_ALLOWED_MSG: &str = "Método não permitido";
pub const MALFORMED_BODY_MSG: &str = "Formato JSON inválido";
pub const RATE_LIMITED_MSG: &str = "Muitas tentativas. Por favor, aguarde antes de enviar outro email.";
pub const SERVER_MISCONFIGURED_MSG: &str = "Configuração do servidor incompleta. Tente novamente mais tarde.";
pub const PROVIDER_ERROR_MSG: &str = "Erro ao enviar email. Tente novamente mais tarde.";
pub const INTERNAL_ERROR_MSG: &str = "Erro interno do servidor. Tente novamente mais tarde.";

/// Every way a request to the contact endpoint can fail.
///
/// `Display` carries the diagnostic detail that ends up in the logs; the body
/// sent to the client only ever holds the fixed public message.
#[derive(Debug, Display)]
pub enum AppError {
    #[display("Method not allowed: {_0}")]
    MethodNotAllowed(String),

    #[display("Malformed body: {_0}")]
    MalformedBody(String),

    #[display("Invalid {field}: {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },

    #[display("Rate limited until {}", _0.reset_at_ms)]
    RateLimited(QuotaSnapshot),

    #[display("Server misconfigured: {_0}")]
    ServerMisconfigured(String),

    #[display("Mail provider error: {_0}")]
    ProviderError(String),

    #[display("Internal server error: {_0}")]
    InternalError(String),
}

impl AppError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        AppError::InvalidField {
            field,
            message: message.into(),
        }
    }

    /// Text placed in the `error` field of the JSON body.
    pub fn public_message(&self) -> &str {
        match self {
            AppError::MethodNotAllowed(_) => METHOD_NOT_ALLOWED_MSG,
            AppError::MalformedBody(_) => MALFORMED_BODY_MSG,
            AppError::InvalidField { message, .. } => message,
            AppError::RateLimited(_) => RATE_LIMITED_MSG,
            AppError::ServerMisconfigured(_) => SERVER_MISCONFIGURED_MSG,
            AppError::ProviderError(_) => PROVIDER_ERROR_MSG,
            AppError::InternalError(_) => INTERNAL_ERROR_MSG,
        }
    }

    pub fn to_http_response(&self) -> HttpResponse {
        self.error_response()
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        builder.insert_header(ContentType::json());

        match self {
            AppError::RateLimited(quota) => {
                let minutes = quota.retry_after_minutes();
                builder
                    .insert_header((RETRY_AFTER, quota.retry_after_secs().to_string()))
                    .insert_header((X_RATELIMIT_LIMIT, quota.limit.to_string()))
                    .insert_header((X_RATELIMIT_REMAINING, "0"))
                    .insert_header((X_RATELIMIT_RESET, quota.reset_at_ms.to_string()))
                    .json(json!({
                        "error": RATE_LIMITED_MSG,
                        "retryAfter": minutes,
                        "message": format!(
                            "Você atingiu o limite de {} emails por hora. Tente novamente em {} minutos.",
                            quota.limit, minutes
                        ),
                    }))
            }
            AppError::MethodNotAllowed(_) => builder
                .insert_header((ALLOW, "POST"))
                .json(json!({ "error": self.public_message() })),
            _ => builder.json(json!({ "error": self.public_message() })),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            AppError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidField { .. } => StatusCode::BAD_REQUEST,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::ServerMisconfigured(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ProviderError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::MalformedBody(err.to_string())
    }
}

impl From<MailError> for AppError {
    fn from(err: MailError) -> Self {
        match err {
            MailError::Provider { .. } => AppError::ProviderError(err.to_string()),
            _ => AppError::InternalError(err.to_string()),
        }
    }
}

/// Failures of the outbound mail capability.
#[derive(Debug, Display, Clone, PartialEq)]
pub enum MailError {
    /// The provider answered and explicitly refused the message.
    #[display("provider rejected message ({status}) {name}: {message}")]
    Provider {
        status: u16,
        name: String,
        message: String,
    },

    #[display("transport failure: {_0}")]
    Transport(String),

    #[display("unexpected provider response: {_0}")]
    UnexpectedResponse(String),
}

impl std::error::Error for MailError {}

impl From<reqwest::Error> for MailError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            MailError::UnexpectedResponse(err.to_string())
        } else {
            MailError::Transport(err.to_string())
        }
    }
}
