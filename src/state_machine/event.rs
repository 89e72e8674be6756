//! Events that can occur in a session

use crate::state_machine::state::{FailureKind, ToolCall};

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    /// `run` was invoked; the seed prompt is already in the conversation
    Start,

    /// The backend returned a usable model message
    ModelMessage {
        /// Tool calls extracted from the message, in emission order
        tool_calls: Vec<ToolCall>,
    },

    /// The backend answered but nothing usable survived parsing.
    /// Consumes the round; does not end the session.
    ModelOutputUnusable,

    /// Every tool call of the current round has been executed and answered
    ToolsExecuted {
        /// True when a completion signal was among the calls and succeeded
        completed: bool,
    },

    /// Unrecoverable error; the session ends now
    Fatal {
        message: String,
        kind: FailureKind,
    },
}
