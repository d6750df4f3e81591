//! Learning Visualization Tool

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::info;

use crate::error::ToolError;
use crate::store::LearningStore;
use crate::types::{AnalysisTool, ToolOutput};

use super::{opt_str, require_str, LEARNING_VISUALIZATION};

/// Width of the longest ASCII bar.
const BAR_WIDTH: u64 = 40;

/// Chart data for a user's progress, rendered two ways: an ASCII
/// chart in the summary for terminal use, and a JSON chart spec
/// written under the charts directory for anything downstream.
pub struct VisualizationTool {
    store: Arc<dyn LearningStore>,
    charts_dir: PathBuf,
}

impl VisualizationTool {
    pub fn new(store: Arc<dyn LearningStore>, charts_dir: PathBuf) -> Self {
        Self { store, charts_dir }
    }

    fn render_bars(rows: &[(String, u64)]) -> Vec<String> {
        let max = rows.iter().map(|(_, n)| *n).max().unwrap_or(0).max(1);
        rows.iter()
            .map(|(label, n)| {
                let width = (n * BAR_WIDTH / max) as usize;
                format!("  {label:<12} {} {n}", "█".repeat(width))
            })
            .collect()
    }

    fn write_spec(&self, chart_type: &str, spec: &Value) -> anyhow::Result<PathBuf> {
        fs::create_dir_all(&self.charts_dir)?;
        let filename = format!("{chart_type}_{}.json", Utc::now().format("%Y%m%d%H%M%S"));
        let path = self.charts_dir.join(filename);
        fs::write(&path, serde_json::to_string_pretty(spec)?)?;
        info!(path = %path.display(), "chart spec written");
        Ok(path)
    }
}

#[async_trait]
impl AnalysisTool for VisualizationTool {
    fn name(&self) -> &str {
        LEARNING_VISUALIZATION
    }

    fn description(&self) -> &str {
        "Chart data for a user's learning: progress trend or mastery pie. \
         Renders ASCII in the summary and writes a JSON chart spec."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "user_id": {
                    "type": "string",
                    "description": "User whose data to chart"
                },
                "chart_type": {
                    "type": "string",
                    "description": "'progress_trend' (default) or 'mastery_pie'"
                }
            },
            "required": ["user_id"]
        })
    }

    async fn invoke(&self, input: &Map<String, Value>) -> anyhow::Result<ToolOutput> {
        let user_id = require_str(input, "user_id")?;
        let chart_type =
            opt_str(input, "chart_type").unwrap_or_else(|| "progress_trend".to_string());

        let progress = self.store.learning_progress(&user_id)?;

        let (title, rows) = match chart_type.as_str() {
            "progress_trend" => (
                format!("Daily reviews for {user_id}"),
                progress
                    .daily_activity
                    .iter()
                    .map(|d| (d.date.clone(), d.reviews))
                    .collect::<Vec<_>>(),
            ),
            "mastery_pie" => (
                format!("Mastery breakdown for {user_id}"),
                vec![
                    ("mastered".to_string(), progress.mastered),
                    ("learning".to_string(), progress.learning),
                ],
            ),
            other => {
                return Err(
                    ToolError::Execution(format!("unknown chart type: {other}")).into(),
                )
            }
        };

        let spec = json!({
            "chartType": chart_type,
            "title": title,
            "series": rows
                .iter()
                .map(|(label, value)| json!({ "label": label, "value": value }))
                .collect::<Vec<_>>(),
            "generatedAt": Utc::now().to_rfc3339(),
        });
        let path = self.write_spec(&chart_type, &spec)?;

        let mut lines = vec![title];
        if rows.is_empty() {
            lines.push("  (no data)".to_string());
        } else {
            lines.extend(Self::render_bars(&rows));
        }
        lines.push(format!("chart spec: {}", path.display()));

        Ok(ToolOutput::with_data(lines.join("\n"), spec))
    }
}
