//! Step Executor
//!
//! Invokes one named tool with a given input payload and normalizes
//! success and failure into a uniform step record. Nothing raises past
//! this boundary; the run loop only ever sees records.

use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info};

use crate::registry::ToolRegistry;
use crate::types::{StepRecord, StepRequest};

pub struct StepExecutor {
    registry: Arc<ToolRegistry>,
}

impl StepExecutor {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    /// Execute one step request.
    ///
    /// An empty tool name short-circuits to an error record without
    /// touching the registry. All registry and tool failures are
    /// converted into the record's `error` field.
    pub async fn execute(&self, request: &StepRequest) -> StepRecord {
        if request.tool_name.is_empty() {
            error!("step request is missing a tool name");
            return StepRecord::failure(request, "missing tool name");
        }

        let input = Value::Object(request.tool_input.clone());
        info!(tool = %request.tool_name, %input, "dispatching step");

        match self
            .registry
            .invoke(&request.tool_name, &request.tool_input)
            .await
        {
            Ok(output) => {
                info!(tool = %request.tool_name, "step succeeded");
                StepRecord::success(request, output)
            }
            Err(err) => {
                error!(tool = %request.tool_name, error = %err, "step failed");
                StepRecord::failure(request, err.to_string())
            }
        }
    }
}
