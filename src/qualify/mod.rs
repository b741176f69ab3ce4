//! Qualification exchange client
//!
//! Turns one user utterance into a [`QualificationResult`]:
//!
//! 1. Render the conversation and the new utterance into the instruction
//!    template ([`prompt`]).
//! 2. Call the hosted model with the response schema ([`schema`]).
//! 3. Parse and validate the reply strictly; nothing is coerced.
//! 4. Stamp a fresh id and capture time.
//!
//! The client never touches session or feed state. Failures are returned to the
//! caller, which decides how to degrade. There is no retry.

pub mod prompt;
pub mod schema;

use crate::llm::{LLMClient, ResponseSchema};
use crate::types::{AppError, ChatMessage, QualificationResult};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

pub use schema::{parse_exchange, qualification_schema, ParsedExchange};

/// Why an exchange produced no insight.
#[derive(Debug, thiserror::Error)]
pub enum QualificationError {
    /// The hosted call did not complete (network, auth, rate limit, non-2xx)
    #[error("Qualification call failed: {0}")]
    Transport(String),

    /// The call completed but the payload is not the expected JSON shape
    #[error("Malformed qualification response: {0}")]
    MalformedResponse(String),

    /// The payload parsed but a value is outside its allowed range or literals
    #[error("Invalid qualification response: {0}")]
    Validation(String),
}

impl QualificationError {
    pub fn kind(&self) -> &'static str {
        match self {
            QualificationError::Transport(_) => "transport",
            QualificationError::MalformedResponse(_) => "malformed_response",
            QualificationError::Validation(_) => "validation",
        }
    }
}

impl From<QualificationError> for AppError {
    fn from(err: QualificationError) -> Self {
        AppError::LLM(err.to_string())
    }
}

pub struct QualificationClient {
    llm: Arc<dyn LLMClient>,
    schema: ResponseSchema,
}

impl QualificationClient {
    pub fn new(llm: Arc<dyn LLMClient>) -> Self {
        Self {
            llm,
            schema: qualification_schema(),
        }
    }

    pub fn model_name(&self) -> &str {
        self.llm.model_name()
    }

    /// Qualifies `new_message` in the context of `history`.
    ///
    /// `history` holds the messages before the new utterance and may be empty.
    /// `new_message` must be non-empty after trimming; callers check this
    /// before invoking.
    pub async fn request_qualification(
        &self,
        history: &[ChatMessage],
        new_message: &str,
        user_email: &str,
        session_id: &str,
    ) -> Result<QualificationResult, QualificationError> {
        let prompt = prompt::build_prompt(history, new_message, user_email, session_id);
        tracing::debug!(
            session_id,
            model = self.llm.model_name(),
            history_len = history.len(),
            prompt_len = prompt.len(),
            "Requesting qualification"
        );

        let raw = self
            .llm
            .generate_structured(&prompt, &self.schema)
            .await
            .map_err(|e| QualificationError::Transport(e.to_string()))?;

        tracing::debug!(session_id, reply_len = raw.len(), "Qualification reply received");

        let parsed = parse_exchange(&raw)?;

        Ok(QualificationResult {
            id: Uuid::new_v4().to_string(),
            chat_response: parsed.chat_response,
            admin_insight: parsed.admin_insight,
            timestamp: Utc::now(),
        })
    }
}
