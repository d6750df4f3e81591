//! Learning Progress Tool

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::store::LearningStore;
use crate::types::{AnalysisTool, ToolOutput};

use super::{require_str, LEARNING_PROGRESS_ANALYSIS};

/// Review history rolled up for one user: totals, mastery breakdown,
/// and recent daily activity.
pub struct LearningProgressTool {
    store: Arc<dyn LearningStore>,
}

impl LearningProgressTool {
    pub fn new(store: Arc<dyn LearningStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AnalysisTool for LearningProgressTool {
    fn name(&self) -> &str {
        LEARNING_PROGRESS_ANALYSIS
    }

    fn description(&self) -> &str {
        "Learning progress for a user: review counts, mastery breakdown, daily activity."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "user_id": {
                    "type": "string",
                    "description": "User whose progress to analyze"
                }
            },
            "required": ["user_id"]
        })
    }

    async fn invoke(&self, input: &Map<String, Value>) -> anyhow::Result<ToolOutput> {
        let user_id = require_str(input, "user_id")?;
        let progress = self.store.learning_progress(&user_id)?;

        let mut lines = vec![
            format!("Learning progress for {}:", progress.user_id),
            format!("  total reviews: {}", progress.total_reviews),
            format!("  distinct words: {}", progress.distinct_words),
            format!(
                "  mastered: {} / learning: {}",
                progress.mastered, progress.learning
            ),
        ];
        // Only the most recent week of activity in the text summary;
        // the full series travels in the data payload.
        let recent = progress
            .daily_activity
            .iter()
            .rev()
            .take(7)
            .collect::<Vec<_>>();
        if !recent.is_empty() {
            lines.push("  recent activity:".to_string());
            for day in recent.into_iter().rev() {
                lines.push(format!("    {}: {} reviews", day.date, day.reviews));
            }
        }

        Ok(ToolOutput::with_data(
            lines.join("\n"),
            serde_json::to_value(&progress)?,
        ))
    }
}
