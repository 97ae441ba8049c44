pub mod auth;
pub mod health;

use std::sync::Arc;

use actix_web::{
    error::{InternalError, JsonPayloadError},
    http::StatusCode,
    web, HttpRequest,
};

use crate::errors::error_response;
use crate::services::{RequireAuth, TokenService};

/// Upper bound for JSON request bodies.
pub const MAX_BODY_BYTES: usize = 1 << 20;

/// JSON extractor settings: size limit and the error envelope for
/// undecodable bodies (malformed JSON, unknown fields, oversized payloads).
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(MAX_BODY_BYTES)
        .error_handler(|err: JsonPayloadError, _req: &HttpRequest| {
            let message = match &err {
                JsonPayloadError::Overflow { .. } | JsonPayloadError::OverflowKnownLength { .. } => {
                    "request body too large"
                }
                _ => "invalid JSON payload",
            };
            tracing::debug!(error = %err, "Rejected request body");
            let response = error_response(StatusCode::BAD_REQUEST, "bad_request", message, None);
            InternalError::from_response(err, response).into()
        })
}

pub fn configure_routes(cfg: &mut web::ServiceConfig, tokens: Arc<TokenService>) {
    cfg.app_data(json_config())
        .route("/health", web::get().to(health::health))
        .route("/ready", web::get().to(health::ready))
        .service(
            web::scope("/api/v1")
                .route("/auth/signup", web::post().to(auth::signup))
                .route("/auth/login", web::post().to(auth::login))
                .service(
                    web::resource("/me")
                        .wrap(RequireAuth::new(tokens))
                        .route(web::get().to(auth::me)),
                ),
        );
}
