//! Session driving
//!
//! The round loop around the inference backend and the tool executor:
//! one blocking `run` call per session, returning a `SessionResult` in
//! every case.

mod driver;

#[cfg(test)]
pub mod testing;

pub use driver::ConversationDriver;

use crate::llm::Message;
use crate::state_machine::{SessionState, TerminalReason};
use std::time::Duration;

/// Default round budget when the caller does not set one.
pub const DEFAULT_MAX_ROUNDS: u32 = 8;

/// Retry policy for transient backend failures.
///
/// Counts wall-clock attempts per request; deliberately independent from
/// the logical round budget so network flakiness never masquerades as
/// conversational progress.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt (0 = no retries).
    pub attempts: u32,
    /// Base delay; attempt n waits `base_delay * 2^(n-1)` plus jitter.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 2,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff with a little jitter so concurrent sessions
    /// don't retry in lockstep.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        use rand::Rng;
        let exp = attempt.saturating_sub(1).min(8);
        let base = self.base_delay.saturating_mul(1 << exp);
        let jitter_ms = rand::thread_rng().gen_range(0..=self.base_delay.as_millis() as u64 / 2);
        base + Duration::from_millis(jitter_ms)
    }
}

/// Per-session configuration, all fields defaulted.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Maximum rounds before the session terminates as `Exhausted`.
    pub max_rounds: u32,
    /// Retry policy for transient backend failures.
    pub retry: RetryPolicy,
    /// Cap on model output tokens per round.
    pub max_tokens: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
            retry: RetryPolicy::default(),
            max_tokens: 4096,
        }
    }
}

/// Immutable summary of a finished session.
#[derive(Debug, Clone)]
pub struct SessionResult {
    pub session_id: String,
    /// Final (terminal) state.
    pub state: SessionState,
    /// Why the session ended.
    pub reason: TerminalReason,
    /// The full conversation, in order, for inspection.
    pub conversation: Vec<Message>,
    /// Rounds consumed (one per model response plus its tool executions).
    pub rounds_used: u32,
}

impl SessionResult {
    pub fn is_completed(&self) -> bool {
        matches!(self.reason, TerminalReason::Completed)
    }
}
