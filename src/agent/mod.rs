//! Agent Module
//!
//! The plan-execute-replan core: execution history, the step executor,
//! and the bounded run loop that drives them.

pub mod executor;
pub mod history;
pub mod run_loop;

pub use executor::StepExecutor;
pub use history::ExecutionHistory;
pub use run_loop::{CancelFlag, NextPlanAgent};
