use crate::{
    api::extract::AppJson,
    auth::middleware::CurrentSession,
    session::send_message,
    types::{ChatMessage, Result, SendMessageRequest, SendOutcome, ViewState},
    AppState,
};
use axum::{extract::State, Json};
use uuid::Uuid;

/// Conversation of the current user dashboard visit
#[utoipa::path(
    get,
    path = "/api/sessions/{id}/messages",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Messages, oldest first", body = Vec<ChatMessage>),
        (status = 403, description = "Not on USER_DASHBOARD"),
        (status = 404, description = "Session not found")
    ),
    tag = "chat"
)]
pub async fn list_messages(CurrentSession(session): CurrentSession) -> Result<Json<Vec<ChatMessage>>> {
    let session = session.lock();
    session.require_view(ViewState::UserDashboard)?;
    Ok(Json(session.messages().to_vec()))
}

/// Send a message to the qualification agent
///
/// A failed qualification still answers 200 with `reply` set to null.
#[utoipa::path(
    post,
    path = "/api/sessions/{id}/messages",
    params(("id" = Uuid, Path, description = "Session id")),
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "Message recorded", body = SendOutcome),
        (status = 400, description = "Empty message"),
        (status = 404, description = "Session not found"),
        (status = 409, description = "Not on USER_DASHBOARD, or a reply is still pending")
    ),
    tag = "chat"
)]
pub async fn post_message(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    AppJson(payload): AppJson<SendMessageRequest>,
) -> Result<Json<SendOutcome>> {
    let history_window = state.config_manager.config().chat.history_window;
    let outcome = send_message(
        &session,
        &payload.text,
        &state.qualifier,
        &state.feed,
        history_window,
    )
    .await?;
    Ok(Json(outcome))
}
