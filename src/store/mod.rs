//! Learning Data Store
//!
//! SQLite-backed word-learning data behind the `LearningStore` trait.
//! The store is an injected collaborator: opened once at startup,
//! handed to tools at registration, dropped on shutdown. The agent
//! core never touches it directly.

mod database;
mod schema;

pub use database::Database;
pub use schema::{CREATE_TABLES, SCHEMA_VERSION};

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Row count for one backing table.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionStats {
    pub name: String,
    pub row_count: u64,
}

/// One labeled bucket in a distribution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountBucket {
    pub label: String,
    pub count: u64,
}

/// Optional filters for word queries.
#[derive(Clone, Debug, Default)]
pub struct WordFilter {
    pub language: Option<String>,
    pub tag: Option<String>,
}

/// Aggregate statistics over the word collection.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordStatistics {
    pub total: u64,
    pub by_difficulty: Vec<CountBucket>,
    pub by_part_of_speech: Vec<CountBucket>,
    pub by_tag: Vec<CountBucket>,
}

/// Reviews on one calendar day.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyActivity {
    pub date: String,
    pub reviews: u64,
}

/// A user's review history rolled up.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    pub user_id: String,
    pub total_reviews: u64,
    pub distinct_words: u64,
    pub mastered: u64,
    pub learning: u64,
    pub daily_activity: Vec<DailyActivity>,
}

/// One learning goal with completion state.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSummary {
    pub description: String,
    pub target_words: u64,
    pub completed_words: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    pub percent: f64,
}

/// A wordbook with its content rolled up.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordbookSummary {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub language: String,
    pub is_system: bool,
    pub word_count: u64,
    pub by_difficulty: Vec<CountBucket>,
}

/// Query surface the analysis tools need. Implementations must be
/// safe to share across concurrent runs.
pub trait LearningStore: Send + Sync {
    fn collection_overview(&self) -> Result<Vec<CollectionStats>>;
    fn word_statistics(&self, filter: &WordFilter) -> Result<WordStatistics>;
    fn learning_progress(&self, user_id: &str) -> Result<ProgressSummary>;
    fn learning_goals(&self, user_id: &str) -> Result<Vec<GoalSummary>>;
    fn wordbook_summary(&self, wordbook_id: &str) -> Result<Option<WordbookSummary>>;
}
