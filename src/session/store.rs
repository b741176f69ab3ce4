use super::Session;
use crate::types::{AppError, Result};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

/// How often the background task looks for idle sessions.
pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// A session behind its own lock. Never hold the guard across an `.await`.
pub type SharedSession = Arc<Mutex<Session>>;

/// In-memory registry of live sessions. Nothing survives a restart.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, SharedSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a new session on the landing screen.
    pub fn create(&self) -> SharedSession {
        let session = Session::new();
        let id = session.id();
        let shared = Arc::new(Mutex::new(session));
        self.sessions.write().insert(id, shared.clone());

        tracing::debug!(session_id = %id, "Session created");
        shared
    }

    pub fn get(&self, id: Uuid) -> Result<SharedSession> {
        self.sessions
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Session {} not found", id)))
    }

    pub fn remove(&self, id: Uuid) -> Result<()> {
        self.sessions
            .write()
            .remove(&id)
            .map(|_| tracing::debug!(session_id = %id, "Session closed"))
            .ok_or_else(|| AppError::NotFound(format!("Session {} not found", id)))
    }

    /// Drops every session idle for longer than `ttl`.
    ///
    /// Returns the number of sessions removed.
    pub fn cleanup_idle(&self, ttl: Duration, now: Instant) -> usize {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|id, session| {
            let keep = !session.lock().is_idle(now, ttl);
            if !keep {
                tracing::debug!(session_id = %id, "Session expired");
            }
            keep
        });
        before - sessions.len()
    }

    /// Start a background task that expires idle sessions every [`CLEANUP_INTERVAL`].
    pub fn start_cleanup_task(self: &Arc<Self>, ttl: Duration) -> tokio::task::JoinHandle<()> {
        let store = Arc::clone(self);

        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(CLEANUP_INTERVAL);
            loop {
                interval_timer.tick().await;

                let removed = store.cleanup_idle(ttl, Instant::now());
                if removed > 0 {
                    tracing::info!(removed, remaining = store.len(), "Expired idle sessions");
                }
            }
        })
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ViewState;

    #[test]
    fn test_create_get_remove() {
        let store = SessionStore::new();
        let id = store.create().lock().id();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(id).unwrap().lock().view(), ViewState::Landing);

        store.remove(id).unwrap();
        assert!(store.is_empty());
        assert!(matches!(store.get(id), Err(AppError::NotFound(_))));
        assert!(matches!(store.remove(id), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_sessions_are_independent() {
        let store = SessionStore::new();
        let a = store.create();
        let b = store.create();

        a.lock().start().unwrap();
        assert_eq!(a.lock().view(), ViewState::Auth);
        assert_eq!(b.lock().view(), ViewState::Landing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_idle_keeps_recent_sessions() {
        let ttl = Duration::from_secs(300);
        let store = SessionStore::new();
        let stale = store.create().lock().id();
        let fresh = store.create();

        tokio::time::advance(Duration::from_secs(200)).await;
        fresh.lock().touch(Instant::now());
        tokio::time::advance(Duration::from_secs(200)).await;

        assert_eq!(store.cleanup_idle(ttl, Instant::now()), 1);
        assert!(matches!(store.get(stale), Err(AppError::NotFound(_))));
        assert!(store.get(fresh.lock().id()).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_task_expires_abandoned_sessions() {
        let store = Arc::new(SessionStore::new());
        for _ in 0..3 {
            store.create();
        }
        let handle = store.start_cleanup_task(Duration::from_secs(90));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(store.len(), 3);

        tokio::time::sleep(CLEANUP_INTERVAL * 2).await;
        assert!(store.is_empty());

        handle.abort();
    }
}
