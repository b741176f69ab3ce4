//! Simulated authentication and email verification
//!
//! Nothing here is a security boundary. Sign-up and login accept any
//! non-blank email/password pair, "verification" always succeeds, and a
//! resend never sends anything. What is reproduced is the observable timing:
//!
//! - submit (sign-up or login) waits `flow.submit_delay_ms`
//! - verify waits `flow.verify_delay_ms`
//! - resend arms a `flow.resend_cooldown_secs` cooldown and shows an
//!   acknowledgment for `flow.resend_ack_secs`
//!
//! Timings are read from the live configuration on every call.
//!
//! # Module Structure
//!
//! - [`auth::verification`](crate::auth::verification) - resend cooldown state
//! - [`auth::middleware`](crate::auth::middleware) - extractor resolving the session of a request

/// Session extractor and view guards for handlers.
pub mod middleware;
/// Resend cooldown and acknowledgment tracking.
pub mod verification;

use crate::types::{AppError, CredentialsRequest, ResendResponse, Result};
use crate::utils::toml_config::AutoQualifyConfigManager;
use std::sync::Arc;
use tokio::time::Instant;
use verification::VerificationState;

/// Timer-driven stand-in for a real auth backend.
pub struct SimulatedAuth {
    config: Arc<AutoQualifyConfigManager>,
}

impl SimulatedAuth {
    pub fn new(config: Arc<AutoQualifyConfigManager>) -> Self {
        Self { config }
    }

    /// Checks the form fields the sign-up/login form marks as required.
    pub fn validate_credentials(request: &CredentialsRequest) -> Result<()> {
        if request.email.trim().is_empty() {
            return Err(AppError::InvalidInput("Email is required".to_string()));
        }
        if request.password.is_empty() {
            return Err(AppError::InvalidInput("Password is required".to_string()));
        }
        Ok(())
    }

    /// Pretends to create an account or sign in, then always succeeds.
    pub async fn submit(&self, request: &CredentialsRequest) -> Result<()> {
        Self::validate_credentials(request)?;

        let delay = self.config.config().flow.submit_delay();
        tokio::time::sleep(delay).await;

        tracing::info!(role = request.role.as_str(), "Credentials accepted, verification email simulated");
        Ok(())
    }

    /// Pretends to check that the verification link was clicked.
    pub async fn verify(&self) -> Result<()> {
        let delay = self.config.config().flow.verify_delay();
        tokio::time::sleep(delay).await;
        Ok(())
    }

    /// Re-arms the resend cooldown, or reports how long is left.
    pub fn resend(&self, state: &mut VerificationState, now: Instant) -> Result<ResendResponse> {
        if let Some(remaining) = state.cooldown_remaining_secs(now) {
            return Err(AppError::Cooldown(remaining));
        }

        let flow = self.config.config().flow.clone();
        state.arm(now, flow.resend_cooldown(), flow.resend_ack());

        Ok(ResendResponse {
            cooldown_secs: flow.resend_cooldown_secs,
            acknowledgment: "New verification link dispatched!".to_string(),
        })
    }
}
