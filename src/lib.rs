//! Wordbi -- Rule-Based BI Analysis Agent
//!
//! A single-agent task executor over word-learning data: it derives a plan
//! from a free-form request, executes one tool at a time, observes each
//! result, and replans until done or the step ceiling is hit.

pub mod types;
pub mod error;
pub mod config;
pub mod registry;
pub mod agent;
pub mod planner;
pub mod store;
pub mod tools;
