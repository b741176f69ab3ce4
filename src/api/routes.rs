use crate::api::handlers::{admin, chat, session};
use crate::AppState;
use axum::{
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/sessions", post(session::create_session))
        .route(
            "/sessions/{id}",
            get(session::get_session).delete(session::close_session),
        )
        .route("/sessions/{id}/start", post(session::start))
        .route("/sessions/{id}/back", post(session::back))
        .route("/sessions/{id}/signup", post(session::sign_up))
        .route("/sessions/{id}/login", post(session::log_in))
        .route("/sessions/{id}/verify", post(session::verify))
        .route("/sessions/{id}/resend", post(session::resend))
        .route("/sessions/{id}/logout", post(session::log_out))
        .route(
            "/sessions/{id}/messages",
            get(chat::list_messages).post(chat::post_message),
        )
        // Admin-only, guarded by the AdminSession extractor
        .route("/sessions/{id}/feed", get(admin::list_feed))
        .route("/sessions/{id}/feed/stats", get(admin::feed_stats))
        .route("/sessions/{id}/feed/stream", get(admin::feed_stream))
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "Server is up")),
    tag = "health"
)]
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
