use actix_web::{http::Method, web, HttpRequest, HttpResponse, Responder};

use crate::{entities::contact::ContactSubmission, errors::AppError, AppState};

/// `/api/send`: validate a contact form submission and relay it by email.
///
/// Mounted for every method so that anything but POST gets the JSON 405.
pub async fn send_contact(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Bytes,
) -> impl Responder {
    if req.method() != Method::POST {
        return AppError::MethodNotAllowed(req.method().to_string()).to_http_response();
    }

    let submission = match ContactSubmission::from_body(&body) {
        Ok(submission) => submission,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected unparsable contact body");
            return e.to_http_response();
        }
    };

    match state.contact_handler.send_contact_message(submission).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => {
            if matches!(e, AppError::InvalidField { .. }) {
                tracing::info!(error = %e, "Contact submission failed validation");
            }
            e.to_http_response()
        }
    }
}
