//! HTTP API Handlers and Routes
//!
//! This module provides the REST API layer for AutoQualify, built on the Axum web framework.
//! Every screen of the visitor flow is a session view; clients drive transitions
//! with POSTs and render whatever [`SessionView`](crate::types::SessionView) comes back.
//!
//! # Module Structure
//!
//! - [`api::extract`](crate::api::extract) - JSON body extractor with API-shaped rejections
//! - [`api::handlers`](crate::api::handlers) - Request handlers for each endpoint
//! - [`api::routes`](crate::api::routes) - Route definitions and router configuration
//!
//! # API Endpoints
//!
//! ## Sessions (`/api/sessions`)
//! - `POST /api/sessions` - Open a session on LANDING
//! - `GET /api/sessions/{id}` - Current view
//! - `DELETE /api/sessions/{id}` - Close a session
//! - `POST /api/sessions/{id}/{start,back,signup,login,verify,resend,logout}` - Transitions
//!
//! ## Chat
//! - `GET /api/sessions/{id}/messages` - Conversation, oldest first
//! - `POST /api/sessions/{id}/messages` - Send a message and receive the agent reply
//!
//! ## Admin feed (ADMIN_DASHBOARD only)
//! - `GET /api/sessions/{id}/feed?search=` - Qualified leads, most recent first
//! - `GET /api/sessions/{id}/feed/stats` - Live signal and high-intent counts
//! - `GET /api/sessions/{id}/feed/stream` - Server-Sent Events, one `insight` per result
//!
//! ## Health (`/api/health`)
//! - `GET /api/health` - Health check endpoint
//!
//! # OpenAPI Documentation
//!
//! When the `swagger-ui` feature is enabled, interactive API documentation
//! is available at `/swagger-ui/`.

/// Extractors shared by the handlers.
pub mod extract;
/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;

use crate::types::{
    AdminInsight, ChatMessage, CredentialsRequest, FeedStats, Interest, LeadStatus, MessageRole,
    QualificationResult, ResendResponse, SendMessageRequest, SendOutcome, SessionView, UserRole,
    ViewState,
};
use crate::AppState;
use axum::Router;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(title = "AutoQualify API", description = "Sales lead qualification demo server"),
    paths(
        routes::health,
        handlers::session::create_session,
        handlers::session::get_session,
        handlers::session::close_session,
        handlers::session::start,
        handlers::session::back,
        handlers::session::sign_up,
        handlers::session::log_in,
        handlers::session::verify,
        handlers::session::resend,
        handlers::session::log_out,
        handlers::chat::list_messages,
        handlers::chat::post_message,
        handlers::admin::list_feed,
        handlers::admin::feed_stats,
        handlers::admin::feed_stream,
    ),
    components(schemas(
        ViewState,
        UserRole,
        MessageRole,
        ChatMessage,
        Interest,
        LeadStatus,
        AdminInsight,
        QualificationResult,
        CredentialsRequest,
        SessionView,
        SendMessageRequest,
        SendOutcome,
        ResendResponse,
        FeedStats,
    )),
    tags(
        (name = "sessions", description = "Visitor flow and view transitions"),
        (name = "chat", description = "Lead conversation"),
        (name = "admin", description = "Qualified lead feed"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;

/// Full application: `/api` routes with tracing and CORS, plus Swagger UI when enabled.
pub fn app(state: AppState) -> Router {
    let router = Router::new().nest("/api", routes::create_router());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
