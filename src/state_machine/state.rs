//! Session state types

use crate::domain::{Recurrence, TaskStatus, Urgency};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Tool Input Types - Strongly typed inputs for each tool
// ============================================================================

/// Input for the `create_task` tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTaskInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub urgency: Option<Urgency>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub recurrence: Option<Recurrence>,
}

/// Input for the `update_task` tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateTaskInput {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub urgency: Option<Urgency>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub recurrence: Option<Recurrence>,
}

/// Input for the `set_status` tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetStatusInput {
    pub id: String,
    pub status: TaskStatus,
}

/// Input for the `assign_task` tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignTaskInput {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub group_id: Option<String>,
}

/// Input for the `link_prerequisite` tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkPrerequisiteInput {
    pub blocked_id: String,
    pub prerequisite_id: String,
}

/// Input for the `list_tasks` tool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListTasksInput {
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub assigned_user: Option<String>,
    #[serde(default)]
    pub assigned_group: Option<String>,
    #[serde(default)]
    pub due_before: Option<NaiveDate>,
}

/// Input for the `complete_session` tool (the completion signal)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompleteSessionInput {
    #[serde(default)]
    pub summary: Option<String>,
}

/// Strongly typed tool input enum
///
/// Model output is validated into this fixed name set immediately on
/// receipt; nothing downstream dispatches on raw payloads. Unrecognized
/// names and arguments that fail to deserialize land in `Unknown`, which
/// the executor answers with an `error` result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_tool", rename_all = "snake_case")]
pub enum ToolInput {
    CreateTask(CreateTaskInput),
    UpdateTask(UpdateTaskInput),
    SetStatus(SetStatusInput),
    AssignTask(AssignTaskInput),
    LinkPrerequisite(LinkPrerequisiteInput),
    ListTasks(ListTasksInput),
    CompleteSession(CompleteSessionInput),
    /// Fallback for unknown tools or parsing failures
    Unknown { name: String, input: Value },
}

fn parse_into<T, F>(name: &str, value: Value, wrap: F) -> ToolInput
where
    T: DeserializeOwned,
    F: FnOnce(T) -> ToolInput,
{
    serde_json::from_value(value.clone()).map_or_else(
        |_| ToolInput::Unknown {
            name: name.to_string(),
            input: value,
        },
        wrap,
    )
}

impl ToolInput {
    /// Get the tool name
    pub fn tool_name(&self) -> &str {
        match self {
            ToolInput::CreateTask(_) => "create_task",
            ToolInput::UpdateTask(_) => "update_task",
            ToolInput::SetStatus(_) => "set_status",
            ToolInput::AssignTask(_) => "assign_task",
            ToolInput::LinkPrerequisite(_) => "link_prerequisite",
            ToolInput::ListTasks(_) => "list_tasks",
            ToolInput::CompleteSession(_) => "complete_session",
            ToolInput::Unknown { name, .. } => name,
        }
    }

    /// Check if this is the reserved completion signal
    pub fn is_completion_signal(&self) -> bool {
        matches!(self, ToolInput::CompleteSession(_))
    }

    /// Convert to JSON Value for tool execution
    pub fn to_value(&self) -> Value {
        match self {
            ToolInput::CreateTask(input) => serde_json::to_value(input).unwrap_or(Value::Null),
            ToolInput::UpdateTask(input) => serde_json::to_value(input).unwrap_or(Value::Null),
            ToolInput::SetStatus(input) => serde_json::to_value(input).unwrap_or(Value::Null),
            ToolInput::AssignTask(input) => serde_json::to_value(input).unwrap_or(Value::Null),
            ToolInput::LinkPrerequisite(input) => {
                serde_json::to_value(input).unwrap_or(Value::Null)
            }
            ToolInput::ListTasks(input) => serde_json::to_value(input).unwrap_or(Value::Null),
            ToolInput::CompleteSession(input) => serde_json::to_value(input).unwrap_or(Value::Null),
            ToolInput::Unknown { input, .. } => input.clone(),
        }
    }

    /// Parse from tool name and JSON value
    pub fn from_name_and_value(name: &str, value: Value) -> Self {
        match name {
            "create_task" => parse_into(name, value, ToolInput::CreateTask),
            "update_task" => parse_into(name, value, ToolInput::UpdateTask),
            "set_status" => parse_into(name, value, ToolInput::SetStatus),
            "assign_task" => parse_into(name, value, ToolInput::AssignTask),
            "link_prerequisite" => parse_into(name, value, ToolInput::LinkPrerequisite),
            "list_tasks" => parse_into(name, value, ToolInput::ListTasks),
            "complete_session" => parse_into(name, value, ToolInput::CompleteSession),
            _ => ToolInput::Unknown {
                name: name.to_string(),
                input: value,
            },
        }
    }
}

// ============================================================================
// Tool Call - A tool invocation with correlation id and typed input
// ============================================================================

/// A tool call from the model with typed input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub input: ToolInput,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, input: ToolInput) -> Self {
        Self {
            id: id.into(),
            input,
        }
    }

    /// Get the tool name
    pub fn name(&self) -> &str {
        self.input.tool_name()
    }
}

// ============================================================================
// Session State
// ============================================================================

/// Session state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionState {
    /// Created, seed prompt not yet sent
    #[default]
    Idle,

    /// A round is in flight: the model has the conversation
    Running { round: u32 },

    /// The round's tool calls are being executed serially
    AwaitingToolResults { round: u32, pending: Vec<ToolCall> },

    /// Terminal: the model invoked the completion signal successfully
    Completed,

    /// Terminal: an unrecoverable error ended the session
    Failed { message: String, kind: FailureKind },

    /// Terminal: the round budget ran out without explicit completion
    Exhausted,
}

impl SessionState {
    /// Check if this is a terminal state (no transition leaves it)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Completed | SessionState::Failed { .. } | SessionState::Exhausted
        )
    }

    /// Round the session is currently in, if any.
    pub fn round(&self) -> Option<u32> {
        match self {
            SessionState::Running { round } | SessionState::AwaitingToolResults { round, .. } => {
                Some(*round)
            }
            _ => None,
        }
    }
}

/// Classification of unrecoverable session failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Transient network failures that outlived the retry budget
    Network,
    /// Backend rejected the credential
    Auth,
    /// Request/response contract violation with the backend
    Protocol,
    /// Task domain collaborator unreachable
    Domain,
    /// Driver bug (e.g. an impossible transition)
    Internal,
}

/// Why a session ended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum TerminalReason {
    Completed,
    RoundBudgetExhausted,
    FatalError { message: String },
}

/// Immutable per-session configuration the transition function reads
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_id: String,
    /// Maximum number of rounds before the session is forced to `Exhausted`
    pub max_rounds: u32,
}

impl SessionContext {
    pub fn new(session_id: impl Into<String>, max_rounds: u32) -> Self {
        Self {
            session_id: session_id.into(),
            max_rounds,
        }
    }
}
