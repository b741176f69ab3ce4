use std::time::Duration;
use tokio::time::Instant;

/// Resend bookkeeping for one session on the verification screen.
#[derive(Debug, Clone, Default)]
pub struct VerificationState {
    cooldown_until: Option<Instant>,
    ack_until: Option<Instant>,
}

impl VerificationState {
    pub fn arm(&mut self, now: Instant, cooldown: Duration, ack: Duration) {
        self.cooldown_until = Some(now + cooldown);
        self.ack_until = Some(now + ack);
    }

    /// Whole seconds left before another resend is allowed, rounded up.
    pub fn cooldown_remaining_secs(&self, now: Instant) -> Option<u64> {
        let until = self.cooldown_until?;
        let remaining = until.checked_duration_since(now)?;
        if remaining.is_zero() {
            return None;
        }
        let secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
        Some(secs)
    }

    /// Whether the "link dispatched" acknowledgment is still showing.
    pub fn acknowledged(&self, now: Instant) -> bool {
        self.ack_until.is_some_and(|until| now < until)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
