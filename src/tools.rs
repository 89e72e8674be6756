//! Tool implementations bridging model tool calls to the task domain
//!
//! Tools are stateless singletons; all per-call context (scope, store
//! handle) arrives via `ToolContext`. Every call is answered: validation
//! failures, unknown names and domain rejections all come back as `error`
//! results the model can react to. The only escalation is an unreachable
//! task store, which is fatal for the session.

mod assign_task;
mod complete_session;
mod create_task;
mod link_prerequisite;
mod list_tasks;
mod set_status;
mod update_task;

pub use assign_task::AssignTaskTool;
pub use complete_session::CompleteSessionTool;
pub use create_task::CreateTaskTool;
pub use link_prerequisite::LinkPrerequisiteTool;
pub use list_tasks::ListTasksTool;
pub use set_status::SetStatusTool;
pub use update_task::UpdateTaskTool;

use crate::domain::{DomainError, Scope, TaskStore};
use crate::llm::ToolDefinition;
use crate::state_machine::ToolCall;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Result from tool execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub success: bool,
    pub output: String,
}

impl ToolOutput {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            output: message.into(),
        }
    }

    /// Success result carrying serialized domain data.
    pub fn data(value: &impl Serialize) -> Self {
        match serde_json::to_string(value) {
            Ok(json) => Self::success(json),
            Err(e) => Self::error(format!("failed to serialize result: {e}")),
        }
    }
}

/// The task store is unreachable; the session cannot continue.
#[derive(Debug, Error)]
#[error("task store unavailable: {message}")]
pub struct StoreUnavailable {
    pub message: String,
}

/// All context needed for a tool invocation.
///
/// Created once per session with the resolved scope; tools derive all
/// state from this struct and the store behind it.
#[derive(Clone)]
pub struct ToolContext {
    pub scope: Scope,
    store: Arc<dyn TaskStore>,
}

impl ToolContext {
    pub fn new(scope: Scope, store: Arc<dyn TaskStore>) -> Self {
        Self { scope, store }
    }

    pub fn store(&self) -> &Arc<dyn TaskStore> {
        &self.store
    }
}

/// Map a domain outcome into a tool result, escalating only when the
/// collaborator itself is down. Rejection diagnostics pass through
/// verbatim so the model can self-correct.
fn domain_outcome<T: Serialize>(
    result: Result<T, DomainError>,
) -> Result<ToolOutput, StoreUnavailable> {
    match result {
        Ok(value) => Ok(ToolOutput::data(&value)),
        Err(DomainError::Rejected(message)) => Ok(ToolOutput::error(message)),
        Err(DomainError::Unavailable(message)) => Err(StoreUnavailable { message }),
    }
}

/// Deserialize tool input, turning serde's field-level diagnostics into an
/// `error` result rather than a failure.
fn parse_input<T: DeserializeOwned>(input: Value) -> Result<T, ToolOutput> {
    serde_json::from_value(input).map_err(|e| ToolOutput::error(format!("invalid input: {e}")))
}

/// Trait for tools the session can execute
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name
    fn name(&self) -> &'static str;

    /// Tool description for the model
    fn description(&self) -> String;

    /// JSON schema for tool input
    fn input_schema(&self) -> Value;

    /// Execute the tool. `Err` is reserved for an unreachable store; every
    /// other failure is an `error` output.
    async fn run(&self, input: Value, ctx: &ToolContext) -> Result<ToolOutput, StoreUnavailable>;
}

/// The fixed set of tools offered to every session
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl ToolRegistry {
    /// Registry with the full task-management tool set plus the
    /// completion signal.
    pub fn standard() -> Self {
        let tools: Vec<Arc<dyn Tool>> = vec![
            Arc::new(CreateTaskTool),
            Arc::new(UpdateTaskTool),
            Arc::new(SetStatusTool),
            Arc::new(AssignTaskTool),
            Arc::new(LinkPrerequisiteTool),
            Arc::new(ListTasksTool),
            Arc::new(CompleteSessionTool),
        ];
        Self { tools }
    }

    /// Get all tool definitions for the inference request
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description(),
                input_schema: t.input_schema(),
            })
            .collect()
    }

    /// Execute one validated tool call.
    ///
    /// Always produces an output for the call (unknown names included)
    /// unless the task store is unreachable.
    pub async fn execute(
        &self,
        call: &ToolCall,
        ctx: &ToolContext,
    ) -> Result<ToolOutput, StoreUnavailable> {
        let name = call.name();
        for tool in &self.tools {
            if tool.name() == name {
                return tool.run(call.input.to_value(), ctx).await;
            }
        }
        Ok(ToolOutput::error(format!("unknown tool: {name}")))
    }
}
