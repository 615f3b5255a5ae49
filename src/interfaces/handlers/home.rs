use actix_web::{get, HttpResponse, Responder};

#[get("/")]
pub async fn home() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "Portfolio contact API",
        "status": "Ok",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "mount": "POST /api/v1/contact/sessions",
            "submit": "POST /api/v1/contact/sessions/{id}/submit"
        }
    }))
}
