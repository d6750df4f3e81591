//! Word Statistics Tool

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::error::ToolError;
use crate::store::{LearningStore, WordFilter};
use crate::types::{AnalysisTool, ToolOutput};

use super::{opt_str, WORD_STATISTICS};

/// Distribution statistics over the word collection, optionally
/// narrowed by language and tag. An empty result set is a tool-level
/// failure, not a zero-filled report.
pub struct WordStatisticsTool {
    store: Arc<dyn LearningStore>,
}

impl WordStatisticsTool {
    pub fn new(store: Arc<dyn LearningStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AnalysisTool for WordStatisticsTool {
    fn name(&self) -> &str {
        WORD_STATISTICS
    }

    fn description(&self) -> &str {
        "Word statistics: difficulty, part-of-speech and tag distributions, \
         optionally filtered by language and tag."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "language": {
                    "type": "string",
                    "description": "ISO language code filter, e.g. 'de' or 'en'"
                },
                "tag": {
                    "type": "string",
                    "description": "Tag filter, e.g. a CEFR level or category"
                }
            }
        })
    }

    async fn invoke(&self, input: &Map<String, Value>) -> anyhow::Result<ToolOutput> {
        let filter = WordFilter {
            language: opt_str(input, "language"),
            tag: opt_str(input, "tag"),
        };
        let stats = self.store.word_statistics(&filter)?;

        if stats.total == 0 {
            return Err(ToolError::Execution("no matching word data".to_string()).into());
        }

        let mut lines = vec![format!("Word statistics ({} words):", stats.total)];
        lines.push("  by difficulty:".to_string());
        for bucket in &stats.by_difficulty {
            lines.push(format!("    {}: {}", bucket.label, bucket.count));
        }
        lines.push("  by part of speech:".to_string());
        for bucket in &stats.by_part_of_speech {
            lines.push(format!("    {}: {}", bucket.label, bucket.count));
        }
        lines.push("  by tag:".to_string());
        for bucket in &stats.by_tag {
            lines.push(format!("    {}: {}", bucket.label, bucket.count));
        }

        Ok(ToolOutput::with_data(
            lines.join("\n"),
            serde_json::to_value(&stats)?,
        ))
    }
}
