use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::services::IdentityService;

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

pub async fn ready(identity: web::Data<IdentityService>) -> HttpResponse {
    match identity.ping().await {
        Ok(()) => HttpResponse::Ok().json(json!({ "status": "ready" })),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            HttpResponse::ServiceUnavailable().json(json!({ "status": "not_ready" }))
        }
    }
}
