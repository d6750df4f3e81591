//! Collection Overview Tool

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::store::LearningStore;
use crate::types::{AnalysisTool, ToolOutput};

use super::COLLECTION_BASIC_INFO;

/// Row counts for every backing table. Takes no parameters, never
/// fails on an empty database, so the planner can use it as a safe
/// first step for any request.
pub struct BasicInfoTool {
    store: Arc<dyn LearningStore>,
}

impl BasicInfoTool {
    pub fn new(store: Arc<dyn LearningStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AnalysisTool for BasicInfoTool {
    fn name(&self) -> &str {
        COLLECTION_BASIC_INFO
    }

    fn description(&self) -> &str {
        "Basic overview of the learning database: row counts per collection."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn invoke(&self, _input: &Map<String, Value>) -> anyhow::Result<ToolOutput> {
        let overview = self.store.collection_overview()?;

        let mut lines = vec!["Collection overview:".to_string()];
        for stats in &overview {
            lines.push(format!("  {}: {} rows", stats.name, stats.row_count));
        }

        Ok(ToolOutput::with_data(
            lines.join("\n"),
            serde_json::to_value(&overview)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Database;

    #[tokio::test]
    async fn test_overview_lists_every_collection() {
        let db = Database::open_in_memory().unwrap();
        db.seed_demo_data("u-1", "wb-1").unwrap();
        let tool = BasicInfoTool::new(Arc::new(db));

        let output = tool.invoke(&Map::new()).await.unwrap();

        assert!(output.summary.contains("words: 12 rows"));
        assert!(output.summary.contains("wordbooks: 1 rows"));
        assert!(output.data.is_some());
    }

    #[tokio::test]
    async fn test_overview_works_on_empty_database() {
        let db = Database::open_in_memory().unwrap();
        let tool = BasicInfoTool::new(Arc::new(db));

        let output = tool.invoke(&Map::new()).await.unwrap();
        assert!(output.summary.contains("words: 0 rows"));
    }
}
