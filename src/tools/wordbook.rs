//! Wordbook Analysis Tool

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::error::ToolError;
use crate::store::LearningStore;
use crate::types::{AnalysisTool, ToolOutput};

use super::{require_str, WORDBOOK_ANALYSIS};

/// One wordbook rolled up: size, language, difficulty spread. A
/// wordbook id that does not exist is a tool-level failure.
pub struct WordbookTool {
    store: Arc<dyn LearningStore>,
}

impl WordbookTool {
    pub fn new(store: Arc<dyn LearningStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AnalysisTool for WordbookTool {
    fn name(&self) -> &str {
        WORDBOOK_ANALYSIS
    }

    fn description(&self) -> &str {
        "Analysis of one wordbook: word count, language, difficulty spread."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "wordbook_id": {
                    "type": "string",
                    "description": "Wordbook to analyze"
                }
            },
            "required": ["wordbook_id"]
        })
    }

    async fn invoke(&self, input: &Map<String, Value>) -> anyhow::Result<ToolOutput> {
        let wordbook_id = require_str(input, "wordbook_id")?;
        let Some(summary) = self.store.wordbook_summary(&wordbook_id)? else {
            return Err(
                ToolError::Execution(format!("wordbook not found: {wordbook_id}")).into(),
            );
        };

        let kind = if summary.is_system { "system" } else { "user" };
        let mut lines = vec![
            format!("Wordbook '{}' ({kind}, {}):", summary.name, summary.language),
            format!("  words: {}", summary.word_count),
        ];
        if let Some(description) = &summary.description {
            lines.push(format!("  description: {description}"));
        }
        if !summary.by_difficulty.is_empty() {
            lines.push("  by difficulty:".to_string());
            for bucket in &summary.by_difficulty {
                lines.push(format!("    {}: {}", bucket.label, bucket.count));
            }
        }

        Ok(ToolOutput::with_data(
            lines.join("\n"),
            serde_json::to_value(&summary)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Database;
    use serde_json::json;

    fn tool() -> WordbookTool {
        let db = Database::open_in_memory().unwrap();
        db.seed_demo_data("u-1", "wb-1").unwrap();
        WordbookTool::new(Arc::new(db))
    }

    fn book_input(id: &str) -> Map<String, Value> {
        let mut input = Map::new();
        input.insert("wordbook_id".to_string(), json!(id));
        input
    }

    #[tokio::test]
    async fn test_wordbook_rollup() {
        let output = tool().invoke(&book_input("wb-1")).await.unwrap();
        assert!(output.summary.contains("Wordbook 'German Starter' (system, de)"));
        assert!(output.summary.contains("words: 8"));
    }

    #[tokio::test]
    async fn test_unknown_wordbook_is_an_execution_error() {
        let err = tool().invoke(&book_input("nope")).await.unwrap_err();
        let tool_err = err.downcast::<ToolError>().unwrap();
        assert!(matches!(tool_err, ToolError::Execution(_)));
    }
}
