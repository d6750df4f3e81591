//! Wordbi - Type Definitions
//!
//! All shared types for the plan-execute-replan engine: step requests,
//! step records, plans, run reports, and the tool capability trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ─── Planning ────────────────────────────────────────────────────

/// Reserved tool name that ends a run immediately without being
/// dispatched as a normal tool.
pub const TERMINATE_TOOL: &str = "terminate";

/// One proposed tool invocation: a tool name plus named parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRequest {
    pub tool_name: String,
    #[serde(default)]
    pub tool_input: Map<String, Value>,
}

impl StepRequest {
    pub fn new(tool_name: impl Into<String>, tool_input: Map<String, Value>) -> Self {
        Self {
            tool_name: tool_name.into(),
            tool_input,
        }
    }

    /// A step with no parameters.
    pub fn bare(tool_name: impl Into<String>) -> Self {
        Self::new(tool_name, Map::new())
    }
}

/// Result object every tool returns: a human-readable summary plus
/// optional structured data for callers that want more than text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolOutput {
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ToolOutput {
    pub fn text(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            data: None,
        }
    }

    pub fn with_data(summary: impl Into<String>, data: Value) -> Self {
        Self {
            summary: summary.into(),
            data: Some(data),
        }
    }
}

/// A completed step. Exactly one of `output`/`error` is populated
/// once the step has been executed; records are immutable after they
/// are appended to the history.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    pub tool_name: String,
    pub tool_input: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<ToolOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepRecord {
    pub fn success(request: &StepRequest, output: ToolOutput) -> Self {
        Self {
            tool_name: request.tool_name.clone(),
            tool_input: request.tool_input.clone(),
            output: Some(output),
            error: None,
        }
    }

    pub fn failure(request: &StepRequest, error: impl Into<String>) -> Self {
        Self {
            tool_name: request.tool_name.clone(),
            tool_input: request.tool_input.clone(),
            output: None,
            error: Some(error.into()),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// A proposed continuation: optional rationale text plus an ordered
/// list of step requests. An empty `next_steps` list signals normal
/// completion, not an error.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub next_steps: Vec<StepRequest>,
}

impl Plan {
    /// A plan with no further work.
    pub fn done(reasoning: impl Into<String>) -> Self {
        Self {
            reasoning: Some(reasoning.into()),
            next_steps: Vec::new(),
        }
    }

    /// A plan proposing a single step.
    pub fn single(reasoning: impl Into<String>, step: StepRequest) -> Self {
        Self {
            reasoning: Some(reasoning.into()),
            next_steps: vec![step],
        }
    }

    pub fn is_done(&self) -> bool {
        self.next_steps.is_empty()
    }
}

// ─── Run Outcome ─────────────────────────────────────────────────

/// Why a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalReason {
    /// The planner returned an empty plan.
    Completed,
    /// The planner proposed the terminate sentinel.
    ExplicitTerminate,
    /// The step ceiling was reached before the planner converged.
    StepCeiling,
    /// No usable plan (empty initial plan or planning failure).
    NoPlan,
    /// The cancellation flag was set.
    Cancelled,
}

/// The externally visible result of one run: the full execution trace
/// plus an explicit terminal reason. Silent failure is disallowed.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub request: String,
    pub history: Vec<StepRecord>,
    pub reason: TerminalReason,
    pub started_at: String,
    pub finished_at: String,
}

// ─── Tool System ─────────────────────────────────────────────────

/// Trait that every analysis tool must implement.
///
/// Tools accept a mapping of named parameters and return a result
/// carrying at least a human-readable summary. Domain-level failures
/// should be raised as [`crate::error::ToolError::Execution`]; any
/// other error is classified by the registry.
#[async_trait]
pub trait AnalysisTool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    /// JSON-schema description of accepted parameters.
    fn parameters(&self) -> Value;

    async fn invoke(&self, input: &Map<String, Value>) -> anyhow::Result<ToolOutput>;
}

// ─── Configuration ───────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

/// Persistent configuration, stored at `~/.wordbi/wordbi.json`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordbiConfig {
    /// Hard ceiling on executed steps per run.
    #[serde(default)]
    pub max_steps: u32,
    #[serde(default)]
    pub db_path: String,
    #[serde(default)]
    pub charts_dir: String,
    #[serde(default)]
    pub log_level: LogLevel,
    #[serde(default)]
    pub default_user_id: String,
    #[serde(default)]
    pub default_wordbook_id: String,
}

/// The configuration used when no config file exists.
pub fn default_config() -> WordbiConfig {
    WordbiConfig {
        max_steps: 15,
        db_path: "~/.wordbi/wordbi.db".to_string(),
        charts_dir: "~/.wordbi/charts".to_string(),
        log_level: LogLevel::Info,
        default_user_id: "demo-user".to_string(),
        default_wordbook_id: "wordbook-demo".to_string(),
    }
}
