//! SQLite Schema
//!
//! Tables for the word-learning corpus: words, review records,
//! learning goals, wordbooks, and wordbook membership.

/// Current schema version, recorded in `schema_version`.
pub const SCHEMA_VERSION: i64 = 1;

/// Idempotent table creation, applied on every open.
pub const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS words (
    id TEXT PRIMARY KEY,
    headword TEXT NOT NULL,
    language TEXT NOT NULL,
    difficulty TEXT,
    part_of_speech TEXT,
    tags TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS review_records (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    word_id TEXT NOT NULL REFERENCES words(id),
    reviewed_at TEXT NOT NULL,
    mastery INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS learning_goals (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    description TEXT NOT NULL,
    target_words INTEGER NOT NULL,
    completed_words INTEGER NOT NULL DEFAULT 0,
    deadline TEXT
);

CREATE TABLE IF NOT EXISTS wordbooks (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    language TEXT NOT NULL,
    is_system INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS wordbook_entries (
    wordbook_id TEXT NOT NULL REFERENCES wordbooks(id),
    word_id TEXT NOT NULL REFERENCES words(id),
    PRIMARY KEY (wordbook_id, word_id)
);

CREATE INDEX IF NOT EXISTS idx_words_language ON words(language);
CREATE INDEX IF NOT EXISTS idx_reviews_user ON review_records(user_id);
CREATE INDEX IF NOT EXISTS idx_goals_user ON learning_goals(user_id);
"#;
