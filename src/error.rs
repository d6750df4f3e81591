//! Error Taxonomy
//!
//! Per-step failures are recovered locally into step records; only
//! planning-level failures end a run early, and even then the
//! accumulated history is still returned to the caller.

use thiserror::Error;

/// Failures surfaced by the tool registry when invoking a capability.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The requested tool name does not resolve in the registry.
    #[error("unknown tool: {0}")]
    NotFound(String),

    /// The tool reported a domain-level failure (e.g. no matching data).
    #[error("tool execution failed: {0}")]
    Execution(String),

    /// A failure the tool's own contract did not anticipate. Caught at
    /// the executor boundary so the run loop never sees an unhandled
    /// error from a step.
    #[error("unexpected error during tool execution: {0}")]
    Unclassified(String),
}

/// The planner could not produce a plan. Fatal for the current run
/// only; the run ends with reason `no_plan`.
#[derive(Debug, Error)]
#[error("planning failed: {0}")]
pub struct PlanningError(pub String);
