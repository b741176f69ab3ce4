//! Visitor sessions and the view-state machine
//!
//! A session walks `LANDING → AUTH → VERIFY_EMAIL → {USER_DASHBOARD | ADMIN_DASHBOARD}`
//! and back to `LANDING` on logout. Every transition method checks the current
//! view first and leaves the session untouched when the trigger does not apply.
//!
//! The conversation belongs to one user-dashboard visit: it is created with the
//! greeting on verification and dropped on logout. Each visit gets a new
//! conversation number so a reply that arrives after logout is never appended
//! to a later conversation.

pub mod chat;
pub mod store;

use crate::auth::verification::VerificationState;
use crate::types::{AppError, ChatMessage, Result, SessionView, UserRole, ViewState};
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

pub use chat::send_message;
pub use store::{SessionStore, SharedSession};

#[derive(Debug)]
pub struct Session {
    id: Uuid,
    view: ViewState,
    role: Option<UserRole>,
    email: Option<String>,
    messages: Vec<ChatMessage>,
    conversation: u64,
    awaiting_reply: bool,
    verification: VerificationState,
    last_seen: Instant,
}

/// Everything the chat boundary needs to call the model without holding the session lock.
#[derive(Debug, Clone)]
pub struct PendingSend {
    pub session_id: Uuid,
    pub conversation: u64,
    pub email: String,
    pub message: ChatMessage,
    /// Messages before `message`
    pub history: Vec<ChatMessage>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            view: ViewState::Landing,
            role: None,
            email: None,
            messages: Vec::new(),
            conversation: 0,
            awaiting_reply: false,
            verification: VerificationState::default(),
            last_seen: Instant::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn role(&self) -> Option<UserRole> {
        self.role
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.awaiting_reply
    }

    /// Bumped on every logout; lets long-lived readers notice the visit ended.
    pub fn conversation(&self) -> u64 {
        self.conversation
    }

    /// Marks the session as used at `now`.
    pub fn touch(&mut self, now: Instant) {
        self.last_seen = now;
    }

    /// Whether nothing has used the session for longer than `ttl`.
    ///
    /// A session waiting on the model is never idle.
    pub fn is_idle(&self, now: Instant, ttl: Duration) -> bool {
        !self.awaiting_reply && now.saturating_duration_since(self.last_seen) > ttl
    }

    pub fn verification_mut(&mut self) -> &mut VerificationState {
        &mut self.verification
    }

    pub fn expect_view(&self, allowed: &[ViewState], trigger: &'static str) -> Result<()> {
        if allowed.contains(&self.view) {
            Ok(())
        } else {
            Err(AppError::InvalidTransition {
                from: self.view,
                trigger,
            })
        }
    }

    /// LANDING → AUTH
    pub fn start(&mut self) -> Result<ViewState> {
        self.expect_view(&[ViewState::Landing], "start")?;
        self.view = ViewState::Auth;
        Ok(self.view)
    }

    /// AUTH → LANDING
    pub fn back(&mut self) -> Result<ViewState> {
        self.expect_view(&[ViewState::Auth], "go back")?;
        self.view = ViewState::Landing;
        Ok(self.view)
    }

    /// AUTH → VERIFY_EMAIL after a sign-up or login submit.
    ///
    /// Login goes through verification too; every new session re-verifies.
    pub fn submit_credentials(&mut self, role: UserRole, email: &str) -> Result<ViewState> {
        self.expect_view(&[ViewState::Auth], "submit credentials")?;
        self.role = Some(role);
        self.email = Some(email.trim().to_string());
        self.verification.reset();
        self.view = ViewState::VerifyEmail;
        Ok(self.view)
    }

    /// VERIFY_EMAIL → the role's dashboard. A user dashboard opens a fresh
    /// conversation seeded with `greeting`.
    pub fn complete_verification(&mut self, greeting: &str) -> Result<ViewState> {
        self.expect_view(&[ViewState::VerifyEmail], "verify")?;
        let role = self.role.ok_or_else(|| {
            AppError::Internal("verification reached without a role".to_string())
        })?;

        self.verification.reset();
        self.view = role.dashboard();
        if self.view == ViewState::UserDashboard {
            self.open_conversation(greeting);
        }
        Ok(self.view)
    }

    /// Either dashboard → LANDING. Clears role, email and the conversation.
    pub fn log_out(&mut self) -> Result<ViewState> {
        self.expect_view(
            &[ViewState::UserDashboard, ViewState::AdminDashboard],
            "log out",
        )?;
        self.role = None;
        self.email = None;
        self.close_conversation();
        self.view = ViewState::Landing;
        Ok(self.view)
    }

    fn open_conversation(&mut self, greeting: &str) {
        self.conversation += 1;
        self.awaiting_reply = false;
        self.messages = vec![ChatMessage::agent(greeting)];
    }

    fn close_conversation(&mut self) {
        self.conversation += 1;
        self.awaiting_reply = false;
        self.messages.clear();
    }

    /// Fails unless the session is on `view`.
    pub fn require_view(&self, view: ViewState) -> Result<()> {
        if self.view == view {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "requires {} but session is on {}",
                view, self.view
            )))
        }
    }

    /// Records the user's message and marks the session as waiting on the model.
    ///
    /// Rejects blank text and a second send while one is outstanding.
    pub fn begin_send(&mut self, text: &str) -> Result<PendingSend> {
        self.expect_view(&[ViewState::UserDashboard], "send a message")?;
        if text.trim().is_empty() {
            return Err(AppError::InvalidInput("Message must not be empty".to_string()));
        }
        if self.awaiting_reply {
            return Err(AppError::Busy);
        }
        let email = self
            .email
            .clone()
            .ok_or_else(|| AppError::Internal("dashboard reached without an email".to_string()))?;

        let history = self.messages.clone();
        let message = ChatMessage::user(text);
        self.messages.push(message.clone());
        self.awaiting_reply = true;

        Ok(PendingSend {
            session_id: self.id,
            conversation: self.conversation,
            email,
            message,
            history,
        })
    }

    /// Settles a send started by [`Session::begin_send`].
    ///
    /// Appends the agent reply only if the same conversation is still open.
    /// Returns the appended message, if any.
    pub fn finish_send(&mut self, pending: &PendingSend, reply: Option<&str>) -> Option<ChatMessage> {
        if pending.conversation != self.conversation {
            return None;
        }
        self.awaiting_reply = false;

        let reply = ChatMessage::agent(reply?);
        self.messages.push(reply.clone());
        Some(reply)
    }

    pub fn snapshot(&self, now: Instant) -> SessionView {
        let on_verify = self.view == ViewState::VerifyEmail;
        SessionView {
            session_id: self.id,
            view: self.view,
            role: self.role,
            email: self.email.clone(),
            resend_cooldown_secs: if on_verify {
                self.verification.cooldown_remaining_secs(now)
            } else {
                None
            },
            resend_acknowledged: on_verify && self.verification.acknowledged(now),
        }
    }
}
