//! Effects produced by state transitions
//!
//! The transition function is pure; effects tell the driver what I/O to
//! perform next. The driver executes them in order and feeds the resulting
//! event back in.

use crate::state_machine::state::{TerminalReason, ToolCall};

/// Effects to be executed after a state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Send the conversation and tool schema to the inference backend
    RequestModel,

    /// Execute the round's tool calls serially, in emission order
    ExecuteTools { calls: Vec<ToolCall> },

    /// The session is over; build the result
    Finish { reason: TerminalReason },
}

impl Effect {
    pub fn execute_tools(calls: Vec<ToolCall>) -> Self {
        Effect::ExecuteTools { calls }
    }

    pub fn finish(reason: TerminalReason) -> Self {
        Effect::Finish { reason }
    }
}
