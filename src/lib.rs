//! steward - conversational task management sessions
//!
//! A session driver that lets a user manage work items through
//! natural-language conversation: an inference backend proposes tool
//! calls, a validating executor applies them to the task domain, and a
//! pure state machine decides when the conversation is finished.

pub mod domain;
pub mod llm;
pub mod session;
pub mod state_machine;
pub mod tools;

pub use domain::{Scope, TaskStore};
pub use llm::{backend_for, BackendConfig, BackendKind, InferenceBackend};
pub use session::{ConversationDriver, RetryPolicy, SessionConfig, SessionResult};
pub use state_machine::{SessionState, TerminalReason};
