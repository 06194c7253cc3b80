use actix_web::{web, HttpResponse, Responder};
use sqlx::PgPool;

/// GET /api/v1/health
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "recipe-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// GET /api/v1/health/ready
pub async fn readiness_check(pool: web::Data<PgPool>) -> impl Responder {
    match sqlx::query("SELECT 1").fetch_one(pool.get_ref()).await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "ready": true,
            "checks": { "postgresql": "healthy" }
        })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "ready": false,
            "checks": { "postgresql": format!("connection failed: {}", e) }
        })),
    }
}
