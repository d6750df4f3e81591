//! Execution History
//!
//! Append-only ordered log of completed steps, owned exclusively by
//! one run. Insertion order is execution order. The planner reads it
//! but never mutates it.

use crate::types::StepRecord;

#[derive(Debug, Default)]
pub struct ExecutionHistory {
    records: Vec<StepRecord>,
}

impl ExecutionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: StepRecord) {
        self.records.push(record);
    }

    /// The most recently executed step, if any.
    pub fn last(&self) -> Option<&StepRecord> {
        self.records.last()
    }

    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<StepRecord> {
        self.records
    }
}
