//! Update task tool

use super::{domain_outcome, parse_input, StoreUnavailable, Tool, ToolContext, ToolOutput};
use crate::domain::TaskChanges;
use crate::state_machine::state::UpdateTaskInput;
use async_trait::async_trait;
use serde_json::{json, Value};

pub struct UpdateTaskTool;

#[async_trait]
impl Tool for UpdateTaskTool {
    fn name(&self) -> &'static str {
        "update_task"
    }

    fn description(&self) -> String {
        "Update a task's descriptive fields (title, description, urgency, \
         due date, recurrence). Only the provided fields change."
            .to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["id"],
            "properties": {
                "id": { "type": "string" },
                "title": { "type": "string" },
                "description": { "type": "string" },
                "urgency": {
                    "type": "string",
                    "enum": ["low", "normal", "high", "critical"]
                },
                "due_date": { "type": "string", "format": "date" },
                "recurrence": {
                    "type": "string",
                    "enum": ["daily", "weekly", "monthly"]
                }
            }
        })
    }

    async fn run(&self, input: Value, ctx: &ToolContext) -> Result<ToolOutput, StoreUnavailable> {
        let input: UpdateTaskInput = match parse_input(input) {
            Ok(i) => i,
            Err(output) => return Ok(output),
        };

        let changes = TaskChanges {
            title: input.title,
            description: input.description,
            urgency: input.urgency,
            due_date: input.due_date,
            recurrence: input.recurrence,
        };

        let result = ctx
            .store()
            .update(&ctx.scope, &input.id, changes)
            .await
            .map(|()| json!({ "updated": input.id }));
        domain_outcome(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::memory::InMemoryTaskStore;
    use crate::domain::{NewTask, Scope, TaskFilter, TaskStore, Urgency};
    use std::sync::Arc;

    async fn context_with_task() -> (ToolContext, String) {
        let store = Arc::new(InMemoryTaskStore::new());
        let scope = Scope::new("test-user");
        let id = store
            .create(
                &scope,
                NewTask {
                    title: "draft".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        (ToolContext::new(scope, store), id)
    }

    #[tokio::test]
    async fn updates_selected_fields() {
        let (ctx, id) = context_with_task().await;
        let tool = UpdateTaskTool;
        let result = tool
            .run(json!({"id": id, "urgency": "critical"}), &ctx)
            .await
            .unwrap();
        assert!(result.success, "unexpected error: {}", result.output);

        let tasks = ctx
            .store()
            .list(&ctx.scope, TaskFilter::default())
            .await
            .unwrap();
        assert_eq!(tasks[0].urgency, Urgency::Critical);
        assert_eq!(tasks[0].title, "draft");
    }

    #[tokio::test]
    async fn unknown_id_surfaces_the_domain_rejection() {
        let (ctx, _) = context_with_task().await;
        let tool = UpdateTaskTool;
        let result = tool
            .run(json!({"id": "t-404", "title": "new"}), &ctx)
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.output.contains("no such task"));
    }

    #[tokio::test]
    async fn empty_update_is_rejected() {
        let (ctx, id) = context_with_task().await;
        let tool = UpdateTaskTool;
        let result = tool.run(json!({"id": id}), &ctx).await.unwrap();
        assert!(!result.success);
        assert!(result.output.contains("no changes"));
    }
}
