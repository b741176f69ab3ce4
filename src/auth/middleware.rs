use crate::session::SharedSession;
use crate::types::{AppError, ViewState};
use crate::AppState;
use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use tokio::time::Instant;
use uuid::Uuid;

/// The session named by the `{id}` path segment. Resolving it counts as activity.
pub struct CurrentSession(pub SharedSession);

impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<Uuid>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::InvalidInput(format!("Invalid session id: {}", e)))?;

        let session = state.sessions.get(id)?;
        session.lock().touch(Instant::now());
        Ok(CurrentSession(session))
    }
}

/// A session currently on the admin dashboard. Anything else is rejected with 403.
pub struct AdminSession(pub SharedSession);

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentSession(session) = CurrentSession::from_request_parts(parts, state).await?;
        session.lock().require_view(ViewState::AdminDashboard)?;
        Ok(AdminSession(session))
    }
}
