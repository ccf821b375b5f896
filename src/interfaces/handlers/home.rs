use actix_web::{get, HttpResponse, Responder};

#[get("/")]
pub async fn home() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "Portfolio contact relay",
        "status": "Ok",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": ["POST /api/send", "GET /health"]
    }))
}
