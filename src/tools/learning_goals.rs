//! Learning Goals Tool

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::store::LearningStore;
use crate::types::{AnalysisTool, ToolOutput};

use super::{require_str, USER_LEARNING_GOALS};

/// A user's learning goals with completion percentages. A user with
/// no goals is a normal outcome, not an error.
pub struct LearningGoalsTool {
    store: Arc<dyn LearningStore>,
}

impl LearningGoalsTool {
    pub fn new(store: Arc<dyn LearningStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AnalysisTool for LearningGoalsTool {
    fn name(&self) -> &str {
        USER_LEARNING_GOALS
    }

    fn description(&self) -> &str {
        "Learning goals for a user with completion percentages and deadlines."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "user_id": {
                    "type": "string",
                    "description": "User whose goals to list"
                }
            },
            "required": ["user_id"]
        })
    }

    async fn invoke(&self, input: &Map<String, Value>) -> anyhow::Result<ToolOutput> {
        let user_id = require_str(input, "user_id")?;
        let goals = self.store.learning_goals(&user_id)?;

        if goals.is_empty() {
            return Ok(ToolOutput::text(format!("No learning goals for {user_id}.")));
        }

        let mut lines = vec![format!("Learning goals for {user_id}:")];
        for goal in &goals {
            let deadline = goal
                .deadline
                .as_deref()
                .map(|d| format!(", due {d}"))
                .unwrap_or_default();
            lines.push(format!(
                "  {}: {}/{} words ({:.0}%){}",
                goal.description, goal.completed_words, goal.target_words, goal.percent, deadline
            ));
        }

        Ok(ToolOutput::with_data(
            lines.join("\n"),
            serde_json::to_value(&goals)?,
        ))
    }
}
