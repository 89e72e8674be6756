//! Assign task tool

use super::{domain_outcome, parse_input, StoreUnavailable, Tool, ToolContext, ToolOutput};
use crate::domain::Assignment;
use crate::state_machine::state::AssignTaskInput;
use async_trait::async_trait;
use serde_json::{json, Value};

pub struct AssignTaskTool;

#[async_trait]
impl Tool for AssignTaskTool {
    fn name(&self) -> &'static str {
        "assign_task"
    }

    fn description(&self) -> String {
        "Assign a task to a user or to a group. Exactly one of user_id and \
         group_id must be given."
            .to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["id"],
            "properties": {
                "id": { "type": "string" },
                "user_id": { "type": "string" },
                "group_id": { "type": "string" }
            }
        })
    }

    async fn run(&self, input: Value, ctx: &ToolContext) -> Result<ToolOutput, StoreUnavailable> {
        let input: AssignTaskInput = match parse_input(input) {
            Ok(i) => i,
            Err(output) => return Ok(output),
        };

        let assignment = Assignment {
            user_id: input.user_id,
            group_id: input.group_id,
        };

        let result = ctx
            .store()
            .assign(&ctx.scope, &input.id, assignment)
            .await
            .map(|()| json!({ "assigned": input.id }));
        domain_outcome(result)
    }
}
