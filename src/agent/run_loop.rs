//! The Run Loop
//!
//! The plan-execute-replan state machine: SEEDING -> STEPPING ->
//! (REPLANNING <-> STEPPING) -> DONE. One step is consumed per replan
//! cycle; the hard step ceiling is the sole anti-infinite-loop
//! guarantee and is never bypassed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::planner::Planner;
use crate::registry::ToolRegistry;
use crate::types::{RunReport, TerminalReason, TERMINATE_TOOL};

use super::executor::StepExecutor;
use super::history::ExecutionHistory;

/// Default bound on executed steps per run.
pub const DEFAULT_MAX_STEPS: usize = 15;

/// Cooperative cancellation signal, checked at the top of each
/// stepping iteration. Cloneable so a signal handler can hold one end.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The top-level driver for one-request-at-a-time agent runs.
///
/// History and step counts live per run; the agent itself only holds
/// the shared, read-only registry and planner, so independent requests
/// may run concurrently on clones of the same `Arc`s.
pub struct NextPlanAgent {
    registry: Arc<ToolRegistry>,
    planner: Arc<dyn Planner>,
    max_steps: usize,
    cancel: CancelFlag,
}

impl NextPlanAgent {
    pub fn new(registry: Arc<ToolRegistry>, planner: Arc<dyn Planner>, max_steps: usize) -> Self {
        Self {
            registry,
            planner,
            max_steps,
            cancel: CancelFlag::new(),
        }
    }

    /// A handle that cancels in-flight runs when set.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Run one user request to completion.
    ///
    /// Always returns the full execution trace plus an explicit
    /// terminal reason, even when planning fails mid-run.
    pub async fn run(&self, request: &str) -> RunReport {
        let started_at = Utc::now().to_rfc3339();
        info!(%request, max_steps = self.max_steps, "run started");

        let executor = StepExecutor::new(Arc::clone(&self.registry));
        let mut history = ExecutionHistory::new();
        let reason = self.drive(request, &executor, &mut history).await;

        info!(?reason, steps = history.len(), "run finished");
        RunReport {
            request: request.to_string(),
            history: history.into_records(),
            reason,
            started_at,
            finished_at: Utc::now().to_rfc3339(),
        }
    }

    async fn drive(
        &self,
        request: &str,
        executor: &StepExecutor,
        history: &mut ExecutionHistory,
    ) -> TerminalReason {
        // SEEDING: obtain the initial plan.
        let initial = match self.planner.initial_plan(request) {
            Ok(steps) => steps,
            Err(err) => {
                error!(error = %err, "initial planning failed");
                return TerminalReason::NoPlan;
            }
        };

        // The built-in planner never returns an empty initial plan,
        // but an empty one must still be handled.
        let Some(mut pending) = initial.into_iter().next() else {
            warn!("planner produced an empty initial plan");
            return TerminalReason::NoPlan;
        };

        let mut step_count: usize = 0;

        loop {
            // STEPPING. Cancellation is checked before each dispatch;
            // partial history is retained.
            if self.cancel.is_set() {
                info!("cancellation requested, ending run");
                return TerminalReason::Cancelled;
            }

            let record = executor.execute(&pending).await;
            history.append(record);
            step_count += 1;

            // Ceiling check before the replanning transition.
            if step_count >= self.max_steps {
                warn!(step_count, "step ceiling reached");
                return TerminalReason::StepCeiling;
            }

            // REPLANNING.
            let plan = match self.planner.next_plan(request, history) {
                Ok(plan) => plan,
                Err(err) => {
                    error!(error = %err, "replanning failed");
                    return TerminalReason::NoPlan;
                }
            };

            if let Some(reasoning) = plan.reasoning.as_deref() {
                debug!(%reasoning, "planner reasoning");
            }

            let mut proposed = plan.next_steps.into_iter();
            let Some(first) = proposed.next() else {
                return TerminalReason::Completed;
            };

            if first.tool_name == TERMINATE_TOOL {
                info!("planner proposed terminate sentinel");
                return TerminalReason::ExplicitTerminate;
            }

            let discarded = proposed.count();
            if discarded > 0 {
                // One step per replan cycle: anything past the first is
                // re-derived on the next planning call.
                debug!(discarded, "discarding extra proposed steps");
            }

            pending = first;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlanningError;
    use crate::planner::{PlannerDefaults, RulePlanner};
    use crate::types::{AnalysisTool, Plan, StepRecord, StepRequest, ToolOutput};
    use async_trait::async_trait;
    use serde_json::{json, Map, Value};

    struct CountingTool {
        name: &'static str,
    }

    #[async_trait]
    impl AnalysisTool for CountingTool {
        fn name(&self) -> &str {
            self.name
        }
        fn description(&self) -> &str {
            "test stub"
        }
        fn parameters(&self) -> Value {
            json!({ "type": "object", "properties": {} })
        }
        async fn invoke(&self, _input: &Map<String, Value>) -> anyhow::Result<ToolOutput> {
            Ok(ToolOutput::text(format!("{} done", self.name)))
        }
    }

    struct AlwaysFailTool;

    #[async_trait]
    impl AnalysisTool for AlwaysFailTool {
        fn name(&self) -> &str {
            "collection_basic_info"
        }
        fn description(&self) -> &str {
            "always fails"
        }
        fn parameters(&self) -> Value {
            json!({ "type": "object", "properties": {} })
        }
        async fn invoke(&self, _input: &Map<String, Value>) -> anyhow::Result<ToolOutput> {
            anyhow::bail!("store unavailable")
        }
    }

    /// Planner stub that proposes one more step on every cycle.
    struct PersistentPlanner;

    impl Planner for PersistentPlanner {
        fn initial_plan(&self, _request: &str) -> Result<Vec<StepRequest>, PlanningError> {
            Ok(vec![StepRequest::bare("noop")])
        }
        fn next_plan(
            &self,
            _request: &str,
            _history: &ExecutionHistory,
        ) -> Result<Plan, PlanningError> {
            Ok(Plan::single("one more", StepRequest::bare("noop")))
        }
    }

    /// Planner stub that proposes the terminate sentinel after the
    /// first executed step.
    struct TerminatingPlanner;

    impl Planner for TerminatingPlanner {
        fn initial_plan(&self, _request: &str) -> Result<Vec<StepRequest>, PlanningError> {
            Ok(vec![StepRequest::bare("noop")])
        }
        fn next_plan(
            &self,
            _request: &str,
            _history: &ExecutionHistory,
        ) -> Result<Plan, PlanningError> {
            Ok(Plan::single("stop now", StepRequest::bare(TERMINATE_TOOL)))
        }
    }

    struct EmptyInitialPlanner;

    impl Planner for EmptyInitialPlanner {
        fn initial_plan(&self, _request: &str) -> Result<Vec<StepRequest>, PlanningError> {
            Ok(vec![])
        }
        fn next_plan(
            &self,
            _request: &str,
            _history: &ExecutionHistory,
        ) -> Result<Plan, PlanningError> {
            Ok(Plan::done("nothing"))
        }
    }

    fn registry_with(tools: Vec<Arc<dyn AnalysisTool>>) -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        for tool in tools {
            registry.register(tool);
        }
        Arc::new(registry)
    }

    fn rule_planner() -> Arc<dyn Planner> {
        Arc::new(RulePlanner::new(PlannerDefaults {
            user_id: "u-test".to_string(),
            wordbook_id: "wb-test".to_string(),
        }))
    }

    #[tokio::test]
    async fn test_word_analysis_runs_two_steps_then_completes() {
        let registry = registry_with(vec![
            Arc::new(CountingTool {
                name: "collection_basic_info",
            }),
            Arc::new(CountingTool {
                name: "word_statistics",
            }),
        ]);
        let agent = NextPlanAgent::new(registry, rule_planner(), DEFAULT_MAX_STEPS);

        let report = agent.run("分析单词").await;

        assert_eq!(report.reason, TerminalReason::Completed);
        assert_eq!(report.history.len(), 2);
        assert_eq!(report.history[0].tool_name, "collection_basic_info");
        assert_eq!(report.history[1].tool_name, "word_statistics");
        assert!(report.history.iter().all(StepRecord::succeeded));
    }

    #[tokio::test]
    async fn test_step_ceiling_bounds_persistent_planner() {
        let registry = registry_with(vec![Arc::new(CountingTool { name: "noop" })]);
        let agent = NextPlanAgent::new(registry, Arc::new(PersistentPlanner), 2);

        let report = agent.run("anything").await;

        assert_eq!(report.reason, TerminalReason::StepCeiling);
        assert_eq!(report.history.len(), 2);
    }

    #[tokio::test]
    async fn test_terminate_sentinel_is_never_dispatched() {
        // The sentinel is not registered; if the loop tried to execute
        // it, the second record would carry an unknown-tool error.
        let registry = registry_with(vec![Arc::new(CountingTool { name: "noop" })]);
        let agent = NextPlanAgent::new(registry, Arc::new(TerminatingPlanner), DEFAULT_MAX_STEPS);

        let report = agent.run("anything").await;

        assert_eq!(report.reason, TerminalReason::ExplicitTerminate);
        assert_eq!(report.history.len(), 1);
        assert_eq!(report.history[0].tool_name, "noop");
    }

    #[tokio::test]
    async fn test_tool_failure_does_not_abort_the_run() {
        let registry = registry_with(vec![
            Arc::new(AlwaysFailTool),
            Arc::new(CountingTool {
                name: "word_statistics",
            }),
        ]);
        let agent = NextPlanAgent::new(registry, rule_planner(), DEFAULT_MAX_STEPS);

        let report = agent.run("统计词汇").await;

        // First step fails but is recorded; the loop replans and
        // continues to the statistics step.
        assert_eq!(report.reason, TerminalReason::Completed);
        assert_eq!(report.history.len(), 2);
        assert!(report.history[0].error.as_deref().unwrap().contains("store unavailable"));
        assert!(report.history[1].succeeded());
    }

    #[tokio::test]
    async fn test_empty_initial_plan_ends_with_no_plan() {
        let registry = registry_with(vec![]);
        let agent = NextPlanAgent::new(registry, Arc::new(EmptyInitialPlanner), DEFAULT_MAX_STEPS);

        let report = agent.run("anything").await;

        assert_eq!(report.reason, TerminalReason::NoPlan);
        assert!(report.history.is_empty());
    }

    #[tokio::test]
    async fn test_cancellation_retains_partial_history() {
        let registry = registry_with(vec![Arc::new(CountingTool { name: "noop" })]);
        let agent = NextPlanAgent::new(registry, Arc::new(PersistentPlanner), DEFAULT_MAX_STEPS);

        // Set before the run: the loop checks the flag before the very
        // first dispatch, so no step executes.
        agent.cancel_flag().set();
        let report = agent.run("anything").await;

        assert_eq!(report.reason, TerminalReason::Cancelled);
        assert!(report.history.is_empty());
    }

    #[tokio::test]
    async fn test_only_first_proposed_step_is_consumed() {
        /// Proposes two steps per cycle; only the first must execute
        /// before replanning.
        struct BatchingPlanner;

        impl Planner for BatchingPlanner {
            fn initial_plan(&self, _request: &str) -> Result<Vec<StepRequest>, PlanningError> {
                Ok(vec![StepRequest::bare("noop")])
            }
            fn next_plan(
                &self,
                _request: &str,
                history: &ExecutionHistory,
            ) -> Result<Plan, PlanningError> {
                if history.len() >= 2 {
                    return Ok(Plan::done("enough"));
                }
                Ok(Plan {
                    reasoning: Some("two at once".to_string()),
                    next_steps: vec![StepRequest::bare("noop"), StepRequest::bare("never_run")],
                })
            }
        }

        let registry = registry_with(vec![Arc::new(CountingTool { name: "noop" })]);
        let agent = NextPlanAgent::new(registry, Arc::new(BatchingPlanner), DEFAULT_MAX_STEPS);

        let report = agent.run("anything").await;

        assert_eq!(report.reason, TerminalReason::Completed);
        assert_eq!(report.history.len(), 2);
        assert!(report.history.iter().all(|r| r.tool_name == "noop"));
    }
}
