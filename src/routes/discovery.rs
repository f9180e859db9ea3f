use crate::models::{
    CandidatesResponse, ErrorResponse, HealthResponse, MatchesResponse, NextCandidatesRequest,
    ResetRequest, ResetResponse, SwipeDirection, SwipeRequest,
};
use crate::routes::{engine_error_response, validation_error_response, AppState};
use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

/// Configure discovery and swipe routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/candidates/find", web::post().to(find_candidates))
        .route("/swipes", web::post().to(process_swipe))
        .route("/matches", web::get().to(list_matches))
        .route("/interactions/reset", web::post().to(reset_interactions));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let store_healthy = state.engine.health_check().await;

    let status = if store_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Next candidates endpoint
///
/// POST /api/v1/candidates/find
///
/// Request body:
/// ```json
/// {
///   "userId": "string",
///   "limit": 20,
///   "excludeIds": ["string"]
/// }
/// ```
async fn find_candidates(
    state: web::Data<AppState>,
    req: web::Json<NextCandidatesRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for find_candidates: {:?}", errors);
        return validation_error_response(&errors);
    }

    // Cap limit at 100 to prevent excessive queries
    let limit = req.limit.min(100) as usize;

    tracing::info!("Finding candidates for {}, limit {}", req.user_id, limit);

    match state
        .engine
        .next_candidates(&req.user_id, &req.exclude_ids, limit)
        .await
    {
        Ok(batch) => HttpResponse::Ok().json(CandidatesResponse {
            candidates: batch.candidates,
            total_pool: batch.total_pool,
        }),
        Err(err) => {
            tracing::error!("Failed to select candidates for {}: {}", req.user_id, err);
            engine_error_response(&err)
        }
    }
}

/// Swipe endpoint
///
/// POST /api/v1/swipes
///
/// Request body:
/// ```json
/// {
///   "userId": "string",
///   "targetId": "string",
///   "direction": "like|pass"
/// }
/// ```
async fn process_swipe(state: web::Data<AppState>, req: web::Json<SwipeRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error_response(&errors);
    }

    let direction = match req.direction.to_lowercase().as_str() {
        "like" => SwipeDirection::Like,
        "pass" => SwipeDirection::Pass,
        _ => {
            return HttpResponse::BadRequest().json(ErrorResponse {
                error: "Invalid direction".to_string(),
                message: "Direction must be one of: like, pass".to_string(),
                status_code: 400,
            });
        }
    };

    match state
        .engine
        .swipe(&req.user_id, &req.target_id, direction)
        .await
    {
        Ok(outcome) => HttpResponse::Ok().json(outcome),
        Err(err) => {
            tracing::warn!(
                "Swipe {} -> {} failed: {}",
                req.user_id,
                req.target_id,
                err
            );
            engine_error_response(&err)
        }
    }
}

/// Match listing endpoint
///
/// GET /api/v1/matches?userId={userId}
async fn list_matches(
    state: web::Data<AppState>,
    query: web::Query<std::collections::HashMap<String, String>>,
) -> impl Responder {
    let user_id = match query.get("userId") {
        Some(id) => id,
        None => {
            return HttpResponse::BadRequest().json(ErrorResponse {
                error: "Missing userId parameter".to_string(),
                message: "userId query parameter is required".to_string(),
                status_code: 400,
            });
        }
    };

    match state.engine.list_matches(user_id).await {
        Ok(matches) => HttpResponse::Ok().json(MatchesResponse { matches }),
        Err(err) => {
            tracing::error!("Failed to list matches for {}: {}", user_id, err);
            engine_error_response(&err)
        }
    }
}

/// Reset endpoint — destroys the caller's interactions and their cascades
///
/// POST /api/v1/interactions/reset
async fn reset_interactions(
    state: web::Data<AppState>,
    req: web::Json<ResetRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error_response(&errors);
    }

    match state.engine.reset_interactions(&req.user_id).await {
        Ok((interests_deleted, matches_deleted)) => HttpResponse::Ok().json(ResetResponse {
            interests_deleted,
            matches_deleted,
        }),
        Err(err) => {
            tracing::error!("Failed to reset interactions for {}: {}", req.user_id, err);
            engine_error_response(&err)
        }
    }
}
