use actix_web::{
    body::BoxBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderMap, HeaderName, HeaderValue},
    web, Error,
};
use futures_util::future::{ok, Ready, LocalBoxFuture};
use std::{rc::Rc, task::{Context, Poll}};

use crate::{
    errors::AppError,
    limiter::rate_limiter::{QuotaSnapshot, RateLimitDecision},
    utils::get_client_ip::get_client_ip,
    AppState,
};

pub const X_RATELIMIT_LIMIT: &str = "x-ratelimit-limit";
pub const X_RATELIMIT_REMAINING: &str = "x-ratelimit-remaining";
pub const X_RATELIMIT_RESET: &str = "x-ratelimit-reset";

/// Only this route is metered; everything else passes straight through.
pub const GATED_PATH: &str = "/api/send";

/// Per-client admission gate in front of the mail-send route.
///
/// Over-quota clients get a 429 without reaching the handler. Admitted
/// requests carry `X-RateLimit-*` headers on whatever response the handler
/// produces.
pub struct RateLimitMiddleware;

impl<S> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RateLimitMiddlewareService {
            service: Rc::new(service),
        })
    }
}

pub struct RateLimitMiddlewareService<S> {
    service: Rc<S>,
}

impl<S> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            if req.path() != GATED_PATH {
                return service.call(req).await;
            }

            let state = match req.app_data::<web::Data<AppState>>() {
                Some(state) => state.clone(),
                None => {
                    tracing::error!("AppState missing in rate limit middleware");
                    let err = AppError::InternalError("rate limiter state unavailable".into());
                    return Ok(req.into_response(err.to_http_response()));
                }
            };

            let client = get_client_ip(req.headers());

            match state.rate_limiter.check(&client).await {
                RateLimitDecision::Limited(quota) => {
                    tracing::warn!(
                        client = %client,
                        retry_after_secs = quota.retry_after_secs(),
                        "Rate limit exceeded on contact endpoint"
                    );
                    let err = AppError::RateLimited(quota);
                    Ok(req.into_response(err.to_http_response()))
                }
                RateLimitDecision::Allowed(quota) => {
                    tracing::debug!(client = %client, remaining = quota.remaining(), "Request admitted");
                    let mut res = service.call(req).await?;
                    apply_quota_headers(res.headers_mut(), &quota);
                    Ok(res)
                }
            }
        })
    }
}

/// Attach the informational quota headers to an outgoing response.
pub fn apply_quota_headers(headers: &mut HeaderMap, quota: &QuotaSnapshot) {
    let pairs = [
        (X_RATELIMIT_LIMIT, quota.limit.to_string()),
        (X_RATELIMIT_REMAINING, quota.remaining().to_string()),
        (X_RATELIMIT_RESET, quota.reset_at_ms.to_string()),
    ];

    for (name, value) in pairs {
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(HeaderName::from_static(name), value);
        }
    }
}
