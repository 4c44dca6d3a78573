use actix_web::{web, HttpRequest, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;

use crate::core::{Dispatcher, EngineError};
use crate::models::{
    DispatchResponse, ErrorResponse, HealthResponse, InboundMessageRequest, OutboxResponse,
    Outbound, StatsResponse, SubmitProfileRequest, SubmitProfileResponse, TelegramUpdate, UserId,
};
use crate::services::InMemoryTransport;

/// Header Telegram echoes back when a webhook secret was registered
pub const SECRET_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    /// Present only when messages are kept in memory instead of sent to Telegram
    pub outbox: Option<Arc<InMemoryTransport>>,
    pub webhook_secret: Option<String>,
}

/// Configure all chat-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/stats", web::get().to(stats))
        .route("/profiles", web::post().to(submit_profile))
        .route("/messages", web::post().to(inbound_message))
        .route("/telegram/webhook", web::post().to(telegram_webhook))
        .route("/outbox/{user_id}", web::get().to(drain_outbox));
}

fn error_response(status: actix_web::http::StatusCode, error: &str, message: String) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse {
        error: error.to_string(),
        message,
        status_code: status.as_u16(),
    })
}

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Engine counters
///
/// GET /api/v1/stats
async fn stats(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(StatsResponse {
        snapshot: state.dispatcher.engine().snapshot().await,
        timestamp: chrono::Utc::now(),
    })
}

/// Register a completed profile
///
/// POST /api/v1/profiles
///
/// Request body:
/// ```json
/// {
///   "userId": 42,
///   "age": "25",
///   "gender": "female",
///   "preference": "anyone",
///   "location": "Lisbon"
/// }
/// ```
async fn submit_profile(
    state: web::Data<AppState>,
    req: web::Json<SubmitProfileRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return error_response(
            actix_web::http::StatusCode::BAD_REQUEST,
            "Validation failed",
            errors.to_string(),
        );
    }

    let (user_id, profile) = req.into_inner().into_profile();

    match state.dispatcher.submit_profile(user_id, profile).await {
        Ok(()) => {
            tracing::info!(user_id, "Profile registered over HTTP");
            HttpResponse::Created().json(SubmitProfileResponse { user_id, created: true })
        }
        Err(e @ EngineError::ProfileExists(_)) => error_response(
            actix_web::http::StatusCode::CONFLICT,
            "Profile exists",
            e.to_string(),
        ),
        Err(e) => error_response(
            actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
            "Profile rejected",
            e.to_string(),
        ),
    }
}

/// Dispatch a message from a user as if it arrived over the transport
///
/// POST /api/v1/messages
///
/// Request body:
/// ```json
/// { "userId": 42, "text": "/find" }
/// ```
async fn inbound_message(
    state: web::Data<AppState>,
    req: web::Json<InboundMessageRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return error_response(
            actix_web::http::StatusCode::BAD_REQUEST,
            "Validation failed",
            errors.to_string(),
        );
    }

    let report = state.dispatcher.handle(req.user_id, &req.text).await;

    HttpResponse::Accepted().json(DispatchResponse {
        delivered: report.delivered,
        failed: report.failed,
    })
}

/// Telegram webhook
///
/// POST /api/v1/telegram/webhook
///
/// Always acknowledges with 200 once authenticated, so Telegram does not
/// redeliver updates the bot chose to ignore.
async fn telegram_webhook(
    state: web::Data<AppState>,
    http_req: HttpRequest,
    update: web::Json<TelegramUpdate>,
) -> impl Responder {
    if let Some(expected) = state.webhook_secret.as_deref() {
        let provided = http_req
            .headers()
            .get(SECRET_HEADER)
            .and_then(|v| v.to_str().ok());

        if provided != Some(expected) {
            tracing::warn!("Rejected webhook call with missing or wrong secret");
            return error_response(
                actix_web::http::StatusCode::UNAUTHORIZED,
                "Unauthorized",
                "invalid webhook secret".to_string(),
            );
        }
    }

    match update.text_message() {
        Some((user_id, text)) => {
            let report = state.dispatcher.handle(user_id, text).await;
            tracing::debug!(
                update_id = update.update_id,
                delivered = report.delivered,
                failed = report.failed,
                "Webhook update handled"
            );
        }
        None => tracing::debug!(update_id = update.update_id, "Ignoring non-text update"),
    }

    HttpResponse::Ok().json(serde_json::json!({ "ok": true }))
}

/// Drain messages queued for a user by the in-memory transport
///
/// GET /api/v1/outbox/{user_id}
async fn drain_outbox(
    state: web::Data<AppState>,
    path: web::Path<UserId>,
) -> impl Responder {
    let user_id = path.into_inner();

    let Some(outbox) = state.outbox.as_ref() else {
        return error_response(
            actix_web::http::StatusCode::NOT_FOUND,
            "Outbox unavailable",
            "messages are delivered through Telegram".to_string(),
        );
    };

    let messages = outbox
        .take(user_id)
        .await
        .into_iter()
        .map(|text| Outbound::new(user_id, text))
        .collect();

    HttpResponse::Ok().json(OutboxResponse { user_id, messages })
}
