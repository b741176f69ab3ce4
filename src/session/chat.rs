//! Chat send boundary between a session and the qualification client.

use super::{PendingSend, SharedSession};
use crate::feed::InsightFeed;
use crate::qualify::{prompt::truncate_history, QualificationClient};
use crate::types::{ChatMessage, Result, SendOutcome};

/// Settles a pending send as failed unless it was settled explicitly.
///
/// The handler future is dropped when a client disconnects mid-call; the guard
/// clears the busy flag so the next attempt is accepted.
struct PendingGuard<'a> {
    session: &'a SharedSession,
    pending: &'a PendingSend,
    settled: bool,
}

impl<'a> PendingGuard<'a> {
    fn new(session: &'a SharedSession, pending: &'a PendingSend) -> Self {
        Self {
            session,
            pending,
            settled: false,
        }
    }

    fn settle(mut self, reply: Option<&str>) -> Option<ChatMessage> {
        self.settled = true;
        let mut session = self.session.lock();
        session.finish_send(self.pending, reply)
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            tracing::debug!(
                session_id = %self.pending.session_id,
                "Send cancelled before the model replied"
            );
            self.session.lock().finish_send(self.pending, None);
        }
    }
}

/// Sends one user utterance and records the outcome.
///
/// The session lock is only held to record the user message and again to
/// settle the reply; the model call happens in between without it. A failed
/// exchange is not an error for the caller: it is logged, no agent message is
/// added, nothing is published, and `reply` is `None`. Dropping the returned
/// future mid-call settles the send the same way.
pub async fn send_message(
    session: &SharedSession,
    text: &str,
    qualifier: &QualificationClient,
    feed: &InsightFeed,
    history_window: Option<usize>,
) -> Result<SendOutcome> {
    let pending = session.lock().begin_send(text)?;
    let guard = PendingGuard::new(session, &pending);
    let session_id = pending.session_id.to_string();
    let history = truncate_history(&pending.history, history_window);

    let outcome = qualifier
        .request_qualification(history, &pending.message.text, &pending.email, &session_id)
        .await;

    match outcome {
        Ok(result) => {
            let reply = guard.settle(Some(&result.chat_response));
            if reply.is_none() {
                tracing::debug!(
                    session_id = %session_id,
                    "Conversation closed before the reply arrived, reply dropped"
                );
            }
            tracing::info!(
                session_id = %session_id,
                score = result.admin_insight.score,
                interested = result.admin_insight.interested.as_str(),
                "Lead qualified"
            );
            feed.publish(result);

            Ok(SendOutcome {
                message: pending.message.clone(),
                reply,
            })
        }
        Err(e) => {
            tracing::warn!(
                session_id = %session_id,
                kind = e.kind(),
                error = %e,
                "Qualification failed, no reply produced"
            );
            guard.settle(None);

            Ok(SendOutcome {
                message: pending.message.clone(),
                reply: None,
            })
        }
    }
}
