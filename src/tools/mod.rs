//! Analysis Tools
//!
//! The built-in BI tools over the word-learning store. Each tool is a
//! thin adapter: parse named parameters, call the store, shape the
//! answer into a summary plus structured data. Domain failures are
//! raised as `ToolError::Execution` so the registry classifies them
//! without guessing.

mod basic_info;
mod learning_goals;
mod learning_progress;
mod visualization;
mod word_statistics;
mod wordbook;

use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::ToolError;
use crate::registry::ToolRegistry;
use crate::store::LearningStore;

pub use basic_info::BasicInfoTool;
pub use learning_goals::LearningGoalsTool;
pub use learning_progress::LearningProgressTool;
pub use visualization::VisualizationTool;
pub use word_statistics::WordStatisticsTool;
pub use wordbook::WordbookTool;

// ─── Tool Names ──────────────────────────────────────────────────

pub const COLLECTION_BASIC_INFO: &str = "collection_basic_info";
pub const WORD_STATISTICS: &str = "word_statistics";
pub const LEARNING_PROGRESS_ANALYSIS: &str = "learning_progress_analysis";
pub const USER_LEARNING_GOALS: &str = "user_learning_goals";
pub const WORDBOOK_ANALYSIS: &str = "wordbook_analysis";
pub const LEARNING_VISUALIZATION: &str = "learning_visualization";

/// Register every built-in tool against a shared store handle.
pub fn register_builtin_tools(
    registry: &mut ToolRegistry,
    store: Arc<dyn LearningStore>,
    charts_dir: &Path,
) {
    registry.register(Arc::new(BasicInfoTool::new(store.clone())));
    registry.register(Arc::new(WordStatisticsTool::new(store.clone())));
    registry.register(Arc::new(LearningProgressTool::new(store.clone())));
    registry.register(Arc::new(LearningGoalsTool::new(store.clone())));
    registry.register(Arc::new(WordbookTool::new(store.clone())));
    registry.register(Arc::new(VisualizationTool::new(
        store,
        charts_dir.to_path_buf(),
    )));
}

// ─── Parameter Helpers ───────────────────────────────────────────

/// An optional string parameter; non-string values are ignored.
pub(crate) fn opt_str(input: &Map<String, Value>, key: &str) -> Option<String> {
    input
        .get(key)
        .and_then(Value::as_str)
        .map(|s| s.to_string())
}

/// A required string parameter; absence is a tool-level failure.
pub(crate) fn require_str(input: &Map<String, Value>, key: &str) -> Result<String, ToolError> {
    opt_str(input, key).ok_or_else(|| ToolError::Execution(format!("missing parameter: {key}")))
}
