//! Create task tool

use super::{domain_outcome, parse_input, StoreUnavailable, Tool, ToolContext, ToolOutput};
use crate::domain::NewTask;
use crate::state_machine::state::CreateTaskInput;
use async_trait::async_trait;
use serde_json::{json, Value};

/// Creates a new task in the caller's scope
pub struct CreateTaskTool;

#[async_trait]
impl Tool for CreateTaskTool {
    fn name(&self) -> &'static str {
        "create_task"
    }

    fn description(&self) -> String {
        "Create a new task. Returns the id of the created task; use that id \
         in follow-up calls (set_status, assign_task, link_prerequisite)."
            .to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["title"],
            "properties": {
                "title": {
                    "type": "string",
                    "description": "Short task title"
                },
                "description": {
                    "type": "string",
                    "description": "Optional longer description"
                },
                "urgency": {
                    "type": "string",
                    "enum": ["low", "normal", "high", "critical"]
                },
                "due_date": {
                    "type": "string",
                    "format": "date",
                    "description": "Due date as YYYY-MM-DD"
                },
                "recurrence": {
                    "type": "string",
                    "enum": ["daily", "weekly", "monthly"]
                }
            }
        })
    }

    async fn run(&self, input: Value, ctx: &ToolContext) -> Result<ToolOutput, StoreUnavailable> {
        let input: CreateTaskInput = match parse_input(input) {
            Ok(i) => i,
            Err(output) => return Ok(output),
        };

        let task = NewTask {
            title: input.title,
            description: input.description,
            urgency: input.urgency,
            due_date: input.due_date,
            recurrence: input.recurrence,
        };

        let result = ctx
            .store()
            .create(&ctx.scope, task)
            .await
            .map(|id| json!({ "id": id }));
        domain_outcome(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::memory::InMemoryTaskStore;
    use crate::domain::Scope;
    use std::sync::Arc;

    fn test_context() -> ToolContext {
        ToolContext::new(Scope::new("test-user"), Arc::new(InMemoryTaskStore::new()))
    }

    #[tokio::test]
    async fn creates_a_task_and_returns_its_id() {
        let tool = CreateTaskTool;
        let result = tool
            .run(json!({"title": "Buy milk"}), &test_context())
            .await
            .unwrap();
        assert!(result.success);
        assert!(result.output.contains("t-1"));
    }

    #[tokio::test]
    async fn missing_title_is_a_field_level_error() {
        let tool = CreateTaskTool;
        let result = tool
            .run(json!({"description": "no title"}), &test_context())
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.output.contains("invalid input"));
        assert!(result.output.contains("title"));
    }

    #[tokio::test]
    async fn empty_title_is_rejected_by_the_domain() {
        let tool = CreateTaskTool;
        let result = tool
            .run(json!({"title": "   "}), &test_context())
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.output.contains("title must not be empty"));
    }

    #[tokio::test]
    async fn accepts_full_field_set() {
        let tool = CreateTaskTool;
        let result = tool
            .run(
                json!({
                    "title": "Quarterly report",
                    "description": "Numbers for Q3",
                    "urgency": "high",
                    "due_date": "2026-09-30",
                    "recurrence": "monthly"
                }),
                &test_context(),
            )
            .await
            .unwrap();
        assert!(result.success, "unexpected error: {}", result.output);
    }
}
