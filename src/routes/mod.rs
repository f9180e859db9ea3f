// Route exports
pub mod chat;
pub mod discovery;

use crate::core::{EngineError, MatchEngine};
use crate::models::ErrorResponse;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<MatchEngine>,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(discovery::configure)
            .configure(chat::configure),
    );
}

/// Map an engine error to its HTTP representation
pub(crate) fn engine_error_response(err: &EngineError) -> HttpResponse {
    let (status, label) = match err {
        EngineError::StoreUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable"),
        EngineError::InvalidCandidate(_) => (StatusCode::CONFLICT, "invalid_candidate"),
        EngineError::WriteFailed(_) => (StatusCode::INTERNAL_SERVER_ERROR, "write_failed"),
        EngineError::InvalidMatch(_) => (StatusCode::NOT_FOUND, "invalid_match"),
    };

    HttpResponse::build(status).json(ErrorResponse {
        error: label.to_string(),
        message: err.to_string(),
        status_code: status.as_u16(),
    })
}

pub(crate) fn validation_error_response(errors: &validator::ValidationErrors) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "Validation failed".to_string(),
        message: errors.to_string(),
        status_code: 400,
    })
}
