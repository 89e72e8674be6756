//! List tasks tool

use super::{domain_outcome, parse_input, StoreUnavailable, Tool, ToolContext, ToolOutput};
use crate::domain::TaskFilter;
use crate::state_machine::state::ListTasksInput;
use async_trait::async_trait;
use serde_json::{json, Value};

pub struct ListTasksTool;

#[async_trait]
impl Tool for ListTasksTool {
    fn name(&self) -> &'static str {
        "list_tasks"
    }

    fn description(&self) -> String {
        "List tasks matching a filter. All filter fields are optional; an \
         empty filter lists everything in scope."
            .to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "status": {
                    "type": "string",
                    "enum": ["open", "in_progress", "done"]
                },
                "assigned_user": { "type": "string" },
                "assigned_group": { "type": "string" },
                "due_before": {
                    "type": "string",
                    "format": "date",
                    "description": "Only tasks due strictly before this date"
                }
            }
        })
    }

    async fn run(&self, input: Value, ctx: &ToolContext) -> Result<ToolOutput, StoreUnavailable> {
        let input: ListTasksInput = match parse_input(input) {
            Ok(i) => i,
            Err(output) => return Ok(output),
        };

        let filter = TaskFilter {
            status: input.status,
            assigned_user: input.assigned_user,
            assigned_group: input.assigned_group,
            due_before: input.due_before,
        };

        domain_outcome(ctx.store().list(&ctx.scope, filter).await)
    }
}
