use crate::models::{
    ErrorResponse, HistoryResponse, OpeningSequenceRequest, SendMessageRequest,
};
use crate::routes::{engine_error_response, validation_error_response, AppState};
use actix_web::{web, HttpResponse, Responder};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use uuid::Uuid;
use validator::Validate;

/// Configure conversation channel routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/chat/{match_id}/history", web::get().to(get_history))
        .route("/chat/{match_id}/messages", web::post().to(send_message))
        .route("/chat/{match_id}/opening", web::post().to(send_opening))
        .route("/chat/{match_id}/subscribe", web::get().to(subscribe));
}

fn missing_user_id() -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "Missing userId parameter".to_string(),
        message: "userId query parameter is required".to_string(),
        status_code: 400,
    })
}

/// Chat history endpoint
///
/// GET /api/v1/chat/{match_id}/history?userId={userId}
async fn get_history(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    query: web::Query<std::collections::HashMap<String, String>>,
) -> impl Responder {
    let match_id = path.into_inner();
    let user_id = match query.get("userId") {
        Some(id) => id,
        None => return missing_user_id(),
    };

    match state.engine.history(match_id, user_id).await {
        Ok(messages) => HttpResponse::Ok().json(HistoryResponse { messages }),
        Err(err) => {
            tracing::warn!("History for match {} refused: {}", match_id, err);
            engine_error_response(&err)
        }
    }
}

/// Send message endpoint
///
/// POST /api/v1/chat/{match_id}/messages
///
/// Request body:
/// ```json
/// {
///   "senderId": "string",
///   "messageText": "string"
/// }
/// ```
async fn send_message(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    req: web::Json<SendMessageRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error_response(&errors);
    }

    let match_id = path.into_inner();

    match state
        .engine
        .send(match_id, &req.sender_id, req.message_text.trim(), false)
        .await
    {
        Ok(message) => HttpResponse::Ok().json(message),
        Err(err) => {
            tracing::warn!("Send on match {} refused: {}", match_id, err);
            engine_error_response(&err)
        }
    }
}

/// Automated opening sequence endpoint
///
/// POST /api/v1/chat/{match_id}/opening
async fn send_opening(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    req: web::Json<OpeningSequenceRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error_response(&errors);
    }

    let match_id = path.into_inner();

    match state
        .engine
        .send_opening_sequence(match_id, &req.user_id)
        .await
    {
        Ok(messages) => HttpResponse::Ok().json(HistoryResponse { messages }),
        Err(err) => {
            tracing::warn!("Opening sequence on match {} refused: {}", match_id, err);
            engine_error_response(&err)
        }
    }
}

/// Live subscription endpoint
///
/// GET /api/v1/chat/{match_id}/subscribe?userId={userId}
///
/// Streams newline-delimited JSON messages committed after the subscription
/// began. Clients wanting full continuity fetch history first and
/// deduplicate by message id.
async fn subscribe(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    query: web::Query<std::collections::HashMap<String, String>>,
) -> impl Responder {
    let match_id = path.into_inner();
    let user_id = match query.get("userId") {
        Some(id) => id,
        None => return missing_user_id(),
    };

    let receiver = match state.engine.subscribe(match_id, user_id).await {
        Ok(receiver) => receiver,
        Err(err) => return engine_error_response(&err),
    };

    tracing::debug!("Subscriber attached to match {}", match_id);

    let stream = BroadcastStream::new(receiver).filter_map(move |event| match event {
        Ok(message) => serde_json::to_string(&message)
            .ok()
            .map(|json| Ok::<web::Bytes, actix_web::Error>(web::Bytes::from(json + "\n"))),
        // A lagged subscriber lost buffered messages; it resyncs from
        // history, so skip rather than abort the stream.
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!("Subscriber on match {} lagged by {}", match_id, skipped);
            None
        }
    });

    HttpResponse::Ok()
        .content_type("application/x-ndjson")
        .streaming(stream)
}
