use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

// ============= View State Types =============

/// The five screens a visitor moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViewState {
    Landing,
    Auth,
    VerifyEmail,
    UserDashboard,
    AdminDashboard,
}

impl ViewState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewState::Landing => "LANDING",
            ViewState::Auth => "AUTH",
            ViewState::VerifyEmail => "VERIFY_EMAIL",
            ViewState::UserDashboard => "USER_DASHBOARD",
            ViewState::AdminDashboard => "ADMIN_DASHBOARD",
        }
    }
}

impl fmt::Display for ViewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "USER",
            UserRole::Admin => "ADMIN",
        }
    }

    /// Dashboard a verified session with this role lands on.
    pub fn dashboard(self) -> ViewState {
        match self {
            UserRole::User => ViewState::UserDashboard,
            UserRole::Admin => ViewState::AdminDashboard,
        }
    }
}

// ============= Chat Types =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Agent,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Agent => "agent",
        }
    }
}

/// One line of a conversation. Never edited once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChatMessage {
    pub id: String,
    pub role: MessageRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(MessageRole::User, text)
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Self::new(MessageRole::Agent, text)
    }
}

// ============= Insight Types =============

/// Whether the lead looks interested in buying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Interest {
    #[serde(rename = "YES")]
    Yes,
    #[serde(rename = "NO")]
    No,
}

impl Interest {
    pub const VALUES: [&'static str; 2] = ["YES", "NO"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Interest::Yes => "YES",
            Interest::No => "NO",
        }
    }

    /// Exact literal match, no case folding.
    pub fn from_literal(value: &str) -> Option<Self> {
        match value {
            "YES" => Some(Interest::Yes),
            "NO" => Some(Interest::No),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum LeadStatus {
    Pursuable,
    #[serde(rename = "Not Pursuable")]
    NotPursuable,
}

impl LeadStatus {
    pub const VALUES: [&'static str; 2] = ["Pursuable", "Not Pursuable"];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::Pursuable => "Pursuable",
            LeadStatus::NotPursuable => "Not Pursuable",
        }
    }

    pub fn from_literal(value: &str) -> Option<Self> {
        match value {
            "Pursuable" => Some(LeadStatus::Pursuable),
            "Not Pursuable" => Some(LeadStatus::NotPursuable),
            _ => None,
        }
    }
}

/// Admin-only analysis of a single exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminInsight {
    pub session_id: String,
    pub user_email: String,
    pub last_message: String,
    /// Lead score, 0-100 inclusive
    pub score: u8,
    pub interested: Interest,
    pub status: LeadStatus,
    pub detected_intent: String,
    pub reasoning: String,
}

/// A validated exchange: the reply shown to the lead plus the insight shown to admins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QualificationResult {
    pub id: String,
    pub chat_response: String,
    pub admin_insight: AdminInsight,
    pub timestamp: DateTime<Utc>,
}

// ============= API Request/Response Types =============

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsRequest {
    pub role: UserRole,
    pub email: String,
    pub password: String,
}

/// What a client needs to render the current screen.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session_id: Uuid,
    pub view: ViewState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Seconds until a verification resend is allowed again
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resend_cooldown_secs: Option<u64>,
    #[serde(default)]
    pub resend_acknowledged: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub text: String,
}

/// Result of a chat send. `reply` is absent when no insight could be produced.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendOutcome {
    pub message: ChatMessage,
    pub reply: Option<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResendResponse {
    pub cooldown_secs: u64,
    pub acknowledgment: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedStats {
    pub live_signals: usize,
    pub high_intent_leads: usize,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FeedQuery {
    /// Case-insensitive match against email, message and detected intent
    pub search: Option<String>,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("LLM error: {0}")]
    LLM(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Cannot {trigger} from {from}")]
    InvalidTransition {
        from: ViewState,
        trigger: &'static str,
    },

    #[error("A message is already being processed for this session")]
    Busy,

    #[error("Verification email can be resent in {0}s")]
    Cooldown(u64),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let status = match &self {
            AppError::LLM(_) => StatusCode::BAD_GATEWAY,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidTransition { .. } | AppError::Busy => StatusCode::CONFLICT,
            AppError::Cooldown(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({
            "error": self.to_string()
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
