use crate::{
    auth::middleware::AdminSession,
    session::SessionStore,
    types::{FeedQuery, FeedStats, QualificationResult, ViewState},
    AppState,
};
use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;
use uuid::Uuid;

/// Qualified leads, most recent first
#[utoipa::path(
    get,
    path = "/api/sessions/{id}/feed",
    params(("id" = Uuid, Path, description = "Session id"), FeedQuery),
    responses(
        (status = 200, description = "Feed entries", body = Vec<QualificationResult>),
        (status = 403, description = "Not on ADMIN_DASHBOARD"),
        (status = 404, description = "Session not found")
    ),
    tag = "admin"
)]
pub async fn list_feed(
    State(state): State<AppState>,
    _admin: AdminSession,
    Query(query): Query<FeedQuery>,
) -> Json<Vec<QualificationResult>> {
    let results = match query.search.as_deref() {
        Some(term) => state.feed.search(term),
        None => state.feed.latest_first(),
    };
    Json(results)
}

/// Live signal and high-intent lead counts
#[utoipa::path(
    get,
    path = "/api/sessions/{id}/feed/stats",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Feed counters", body = FeedStats),
        (status = 403, description = "Not on ADMIN_DASHBOARD")
    ),
    tag = "admin"
)]
pub async fn feed_stats(State(state): State<AppState>, _admin: AdminSession) -> Json<FeedStats> {
    Json(state.feed.stats())
}

/// Follow the feed live as Server-Sent Events
///
/// Each newly published result arrives as an `insight` event. Results
/// published before subscribing are not replayed; read `/feed` first. The
/// stream ends once the session logs out or is closed.
#[utoipa::path(
    get,
    path = "/api/sessions/{id}/feed/stream",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "text/event-stream of `insight` events"),
        (status = 403, description = "Not on ADMIN_DASHBOARD")
    ),
    tag = "admin"
)]
pub async fn feed_stream(
    State(state): State<AppState>,
    AdminSession(session): AdminSession,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.feed.subscribe();
    let (session_id, visit) = {
        let session = session.lock();
        (session.id(), session.conversation())
    };
    let sessions = state.sessions.clone();
    tracing::debug!(session_id = %session_id, "Admin subscribed to live feed");

    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(result) => {
                    if !still_admin(&sessions, session_id, visit) {
                        tracing::debug!(session_id = %session_id, "Admin left the dashboard, closing live feed");
                        break;
                    }
                    yield Ok(
                        Event::default()
                            .event("insight")
                            .id(result.id.clone())
                            .data(serde_json::to_string(&result).unwrap_or_default())
                    );
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(session_id = %session_id, skipped, "Live feed subscriber lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

/// Whether the subscribing session still exists and is on the same admin
/// dashboard visit it subscribed from. Delivering an event counts as activity.
fn still_admin(sessions: &SessionStore, session_id: Uuid, visit: u64) -> bool {
    let Ok(session) = sessions.get(session_id) else {
        return false;
    };
    let mut session = session.lock();
    if session.view() != ViewState::AdminDashboard || session.conversation() != visit {
        return false;
    }
    session.touch(Instant::now());
    true
}
