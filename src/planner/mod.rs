//! Planner
//!
//! Deterministic, rule-based planning: an initial plan derived from
//! the raw request and an incremental "next plan" derived from the
//! request plus the execution history. Rules are checked in a fixed
//! priority order; the first match wins and later rules are
//! unreachable once an earlier one matches. That ordering is part of
//! the contract, kept for reproducibility.

pub mod extract;

use serde_json::{Map, Value};

use crate::agent::history::ExecutionHistory;
use crate::error::PlanningError;
use crate::tools::{
    COLLECTION_BASIC_INFO, LEARNING_PROGRESS_ANALYSIS, LEARNING_VISUALIZATION, WORDBOOK_ANALYSIS,
    WORD_STATISTICS,
};
use crate::types::{Plan, StepRequest};

use extract::extract_params;

/// Produces plans for the run loop. Pure with respect to history: it
/// reads but never mutates, and identical inputs yield identical
/// plans.
pub trait Planner: Send + Sync {
    /// The starting plan for a raw request. Never empty; if no rule
    /// matches, a safe introspection step is returned.
    fn initial_plan(&self, request: &str) -> Result<Vec<StepRequest>, PlanningError>;

    /// The next incremental plan, derived from the most recent step
    /// and the original request. Empty `next_steps` means done.
    fn next_plan(&self, request: &str, history: &ExecutionHistory)
        -> Result<Plan, PlanningError>;
}

/// Fallback identifiers used when a rule needs an entity the request
/// text does not name.
#[derive(Clone, Debug)]
pub struct PlannerDefaults {
    pub user_id: String,
    pub wordbook_id: String,
}

/// The built-in keyword planner.
pub struct RulePlanner {
    defaults: PlannerDefaults,
}

impl RulePlanner {
    pub fn new(defaults: PlannerDefaults) -> Self {
        Self { defaults }
    }

    fn mentions_words(request: &str) -> bool {
        request.contains("单词") || request.contains("词汇")
    }

    fn mentions_analysis(request: &str) -> bool {
        request.contains("分析") || request.contains("统计")
    }

    fn user_input(&self) -> Map<String, Value> {
        let mut input = Map::new();
        input.insert(
            "user_id".to_string(),
            Value::String(self.defaults.user_id.clone()),
        );
        input
    }
}

impl Planner for RulePlanner {
    fn initial_plan(&self, request: &str) -> Result<Vec<StepRequest>, PlanningError> {
        // Rule 1: word analysis starts from the collection overview;
        // the statistics step follows after the overview completes.
        if Self::mentions_words(request) && Self::mentions_analysis(request) {
            return Ok(vec![StepRequest::bare(COLLECTION_BASIC_INFO)]);
        }

        // Rule 2: learning progress for the default user.
        if request.contains("学习进度") {
            return Ok(vec![StepRequest::new(
                LEARNING_PROGRESS_ANALYSIS,
                self.user_input(),
            )]);
        }

        // Rule 3: wordbook analysis for the default wordbook.
        if request.contains("词书") {
            let mut input = Map::new();
            input.insert(
                "wordbook_id".to_string(),
                Value::String(self.defaults.wordbook_id.clone()),
            );
            return Ok(vec![StepRequest::new(WORDBOOK_ANALYSIS, input)]);
        }

        // Rule 4: visualization of the default user's progress trend.
        if request.contains("可视化") || request.contains("图表") {
            let mut input = self.user_input();
            input.insert(
                "chart_type".to_string(),
                Value::String("progress_trend".to_string()),
            );
            return Ok(vec![StepRequest::new(LEARNING_VISUALIZATION, input)]);
        }

        // Fallback: a safe, side-effect-free introspection step.
        Ok(vec![StepRequest::bare(COLLECTION_BASIC_INFO)])
    }

    fn next_plan(
        &self,
        request: &str,
        history: &ExecutionHistory,
    ) -> Result<Plan, PlanningError> {
        // Defensive: the run loop always records the initial step
        // before replanning, but an empty history still gets a
        // well-formed answer.
        let Some(last) = history.last() else {
            return Ok(Plan::done("no execution history, nothing to continue"));
        };

        // After the collection overview, a word-analysis request
        // continues with statistics; parameters are re-derived from
        // the request text on every planning call.
        if last.tool_name == COLLECTION_BASIC_INFO && Self::mentions_words(request) {
            let params = extract_params(request);
            return Ok(Plan::single(
                "collection overview done, continuing with word statistics",
                StepRequest::new(WORD_STATISTICS, params.to_input()),
            ));
        }

        // No rule matched: the analysis is complete.
        Ok(Plan::done("all required analysis steps have run"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{StepRecord, ToolOutput};

    fn planner() -> RulePlanner {
        RulePlanner::new(PlannerDefaults {
            user_id: "u-1".to_string(),
            wordbook_id: "wb-1".to_string(),
        })
    }

    fn history_with(tool_name: &str) -> ExecutionHistory {
        let mut history = ExecutionHistory::new();
        let request = StepRequest::bare(tool_name);
        history.append(StepRecord::success(&request, ToolOutput::text("ok")));
        history
    }

    #[test]
    fn test_word_analysis_starts_with_overview() {
        let steps = planner().initial_plan("分析单词").unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].tool_name, COLLECTION_BASIC_INFO);
        assert!(steps[0].tool_input.is_empty());
    }

    #[test]
    fn test_progress_rule_uses_default_user() {
        let steps = planner().initial_plan("查看学习进度").unwrap();
        assert_eq!(steps[0].tool_name, LEARNING_PROGRESS_ANALYSIS);
        assert_eq!(steps[0].tool_input.get("user_id").unwrap(), "u-1");
    }

    #[test]
    fn test_wordbook_rule_uses_default_wordbook() {
        let steps = planner().initial_plan("分析词书内容").unwrap();
        assert_eq!(steps[0].tool_name, WORDBOOK_ANALYSIS);
        assert_eq!(steps[0].tool_input.get("wordbook_id").unwrap(), "wb-1");
    }

    #[test]
    fn test_word_rule_outranks_wordbook_rule() {
        // The request matches both the word-analysis rule and the
        // wordbook rule; the earlier rule wins.
        let steps = planner().initial_plan("分析词书里的单词").unwrap();
        assert_eq!(steps[0].tool_name, COLLECTION_BASIC_INFO);
    }

    #[test]
    fn test_chart_rule_selects_visualization() {
        let steps = planner().initial_plan("生成学习图表").unwrap();
        assert_eq!(steps[0].tool_name, LEARNING_VISUALIZATION);
        assert_eq!(
            steps[0].tool_input.get("chart_type").unwrap(),
            "progress_trend"
        );
    }

    #[test]
    fn test_unmatched_request_falls_back_and_is_never_empty() {
        let steps = planner().initial_plan("hello there").unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].tool_name, COLLECTION_BASIC_INFO);
    }

    #[test]
    fn test_next_plan_on_empty_history_is_done() {
        let plan = planner()
            .next_plan("分析单词", &ExecutionHistory::new())
            .unwrap();
        assert!(plan.is_done());
        assert!(plan.reasoning.is_some());
    }

    #[test]
    fn test_next_plan_after_overview_is_statistics() {
        let history = history_with(COLLECTION_BASIC_INFO);
        let plan = planner().next_plan("分析德语A1单词", &history).unwrap();

        assert_eq!(plan.next_steps.len(), 1);
        let step = &plan.next_steps[0];
        assert_eq!(step.tool_name, WORD_STATISTICS);
        assert_eq!(step.tool_input.get("language").unwrap(), "de");
        assert_eq!(step.tool_input.get("tag").unwrap(), "A1");
    }

    #[test]
    fn test_next_plan_after_statistics_is_done() {
        let history = history_with(WORD_STATISTICS);
        let plan = planner().next_plan("分析单词", &history).unwrap();
        assert!(plan.is_done());
    }

    #[test]
    fn test_next_plan_is_idempotent() {
        let history = history_with(COLLECTION_BASIC_INFO);
        let p = planner();

        let first = p.next_plan("分析英语词汇", &history).unwrap();
        let second = p.next_plan("分析英语词汇", &history).unwrap();

        assert_eq!(first.reasoning, second.reasoning);
        assert_eq!(first.next_steps, second.next_steps);
        assert_eq!(history.len(), 1);
    }
}
