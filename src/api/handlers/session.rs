use crate::{
    api::extract::AppJson,
    auth::{middleware::CurrentSession, SimulatedAuth},
    session::SharedSession,
    types::{CredentialsRequest, ResendResponse, Result, SessionView, ViewState},
    AppState,
};
use axum::{extract::State, http::StatusCode, Json};
use tokio::time::Instant;
use uuid::Uuid;

/// Open a new session on the landing screen
#[utoipa::path(
    post,
    path = "/api/sessions",
    responses(
        (status = 201, description = "Session created", body = SessionView)
    ),
    tag = "sessions"
)]
pub async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionView>) {
    let session = state.sessions.create();
    let view = session.lock().snapshot(Instant::now());
    (StatusCode::CREATED, Json(view))
}

/// Current view of a session
#[utoipa::path(
    get,
    path = "/api/sessions/{id}",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Current view", body = SessionView),
        (status = 404, description = "Session not found")
    ),
    tag = "sessions"
)]
pub async fn get_session(CurrentSession(session): CurrentSession) -> Json<SessionView> {
    Json(session.lock().snapshot(Instant::now()))
}

/// Close a session
#[utoipa::path(
    delete,
    path = "/api/sessions/{id}",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 204, description = "Session closed"),
        (status = 404, description = "Session not found")
    ),
    tag = "sessions"
)]
pub async fn close_session(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<StatusCode> {
    let id = session.lock().id();
    state.sessions.remove(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Leave the landing screen for sign-up/login
#[utoipa::path(
    post,
    path = "/api/sessions/{id}/start",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Now on AUTH", body = SessionView),
        (status = 409, description = "Not on LANDING")
    ),
    tag = "sessions"
)]
pub async fn start(CurrentSession(session): CurrentSession) -> Result<Json<SessionView>> {
    let mut session = session.lock();
    session.start()?;
    tracing::info!(session_id = %session.id(), "Session started auth");
    Ok(Json(session.snapshot(Instant::now())))
}

/// Go back from sign-up/login to the landing screen
#[utoipa::path(
    post,
    path = "/api/sessions/{id}/back",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Now on LANDING", body = SessionView),
        (status = 409, description = "Not on AUTH")
    ),
    tag = "sessions"
)]
pub async fn back(CurrentSession(session): CurrentSession) -> Result<Json<SessionView>> {
    let mut session = session.lock();
    session.back()?;
    Ok(Json(session.snapshot(Instant::now())))
}

/// Create an account (simulated)
#[utoipa::path(
    post,
    path = "/api/sessions/{id}/signup",
    params(("id" = Uuid, Path, description = "Session id")),
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Now on VERIFY_EMAIL", body = SessionView),
        (status = 400, description = "Missing email or password"),
        (status = 409, description = "Not on AUTH")
    ),
    tag = "sessions"
)]
pub async fn sign_up(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    AppJson(payload): AppJson<CredentialsRequest>,
) -> Result<Json<SessionView>> {
    submit_credentials(&state, &session, payload, "sign up").await
}

/// Sign in (simulated); always followed by email verification
#[utoipa::path(
    post,
    path = "/api/sessions/{id}/login",
    params(("id" = Uuid, Path, description = "Session id")),
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Now on VERIFY_EMAIL", body = SessionView),
        (status = 400, description = "Missing email or password"),
        (status = 409, description = "Not on AUTH")
    ),
    tag = "sessions"
)]
pub async fn log_in(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    AppJson(payload): AppJson<CredentialsRequest>,
) -> Result<Json<SessionView>> {
    submit_credentials(&state, &session, payload, "log in").await
}

async fn submit_credentials(
    state: &AppState,
    session: &SharedSession,
    payload: CredentialsRequest,
    trigger: &'static str,
) -> Result<Json<SessionView>> {
    session.lock().expect_view(&[ViewState::Auth], trigger)?;
    SimulatedAuth::validate_credentials(&payload)?;

    state.auth.submit(&payload).await?;

    let mut session = session.lock();
    session.submit_credentials(payload.role, &payload.email)?;
    tracing::info!(
        session_id = %session.id(),
        role = payload.role.as_str(),
        "Awaiting email verification"
    );
    Ok(Json(session.snapshot(Instant::now())))
}

/// Confirm the verification email (simulated)
#[utoipa::path(
    post,
    path = "/api/sessions/{id}/verify",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Now on the role's dashboard", body = SessionView),
        (status = 409, description = "Not on VERIFY_EMAIL")
    ),
    tag = "sessions"
)]
pub async fn verify(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<SessionView>> {
    session.lock().expect_view(&[ViewState::VerifyEmail], "verify")?;

    state.auth.verify().await?;

    let greeting = state.config_manager.config().chat.greeting.clone();
    let mut session = session.lock();
    let view = session.complete_verification(&greeting)?;
    tracing::info!(session_id = %session.id(), view = %view, "Email verified");
    Ok(Json(session.snapshot(Instant::now())))
}

/// Resend the verification email (simulated)
#[utoipa::path(
    post,
    path = "/api/sessions/{id}/resend",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Cooldown armed", body = ResendResponse),
        (status = 409, description = "Not on VERIFY_EMAIL"),
        (status = 429, description = "Cooldown still active")
    ),
    tag = "sessions"
)]
pub async fn resend(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<ResendResponse>> {
    let mut session = session.lock();
    session.expect_view(&[ViewState::VerifyEmail], "resend verification")?;
    let response = state.auth.resend(session.verification_mut(), Instant::now())?;
    Ok(Json(response))
}

/// Log out from either dashboard
#[utoipa::path(
    post,
    path = "/api/sessions/{id}/logout",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Back on LANDING", body = SessionView),
        (status = 409, description = "Not on a dashboard")
    ),
    tag = "sessions"
)]
pub async fn log_out(CurrentSession(session): CurrentSession) -> Result<Json<SessionView>> {
    let mut session = session.lock();
    session.log_out()?;
    tracing::info!(session_id = %session.id(), "Logged out");
    Ok(Json(session.snapshot(Instant::now())))
}
