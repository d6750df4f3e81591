//! Learning Database
//!
//! rusqlite implementation of `LearningStore`. Synchronous,
//! single-process access; the connection lives behind a mutex so the
//! handle can be shared across tools via `Arc`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use uuid::Uuid;

use super::schema::{CREATE_TABLES, SCHEMA_VERSION};
use super::{
    CollectionStats, CountBucket, DailyActivity, GoalSummary, LearningStore, ProgressSummary,
    WordFilter, WordStatistics, WordbookSummary,
};

/// Tables surfaced by the collection overview.
const COLLECTIONS: &[&str] = &["words", "review_records", "learning_goals", "wordbooks"];

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the database at `db_path` and apply the schema.
    pub fn open(db_path: &str) -> Result<Self> {
        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create db directory: {}", parent.display())
                })?;
            }
        }

        let conn = Connection::open(db_path)
            .with_context(|| format!("failed to open database: {db_path}"))?;

        // WAL for better concurrent read performance.
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (useful for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(CREATE_TABLES)
            .context("failed to create tables")?;
        conn.execute(
            "INSERT OR REPLACE INTO schema_version (version, applied_at) VALUES (?1, datetime('now'))",
            params![SCHEMA_VERSION],
        )
        .context("failed to record schema version")?;
        Ok(())
    }

    // ─── Inserts ─────────────────────────────────────────────────

    pub fn insert_word(
        &self,
        headword: &str,
        language: &str,
        difficulty: Option<&str>,
        part_of_speech: Option<&str>,
        tags: &[&str],
    ) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO words (id, headword, language, difficulty, part_of_speech, tags)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![id, headword, language, difficulty, part_of_speech, tags.join(",")],
        )?;
        Ok(id)
    }

    pub fn insert_review(
        &self,
        user_id: &str,
        word_id: &str,
        reviewed_at: &str,
        mastery: i64,
    ) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO review_records (id, user_id, word_id, reviewed_at, mastery)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![Uuid::new_v4().to_string(), user_id, word_id, reviewed_at, mastery],
        )?;
        Ok(())
    }

    pub fn insert_goal(
        &self,
        user_id: &str,
        description: &str,
        target_words: i64,
        completed_words: i64,
        deadline: Option<&str>,
    ) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO learning_goals (id, user_id, description, target_words, completed_words, deadline)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                Uuid::new_v4().to_string(),
                user_id,
                description,
                target_words,
                completed_words,
                deadline
            ],
        )?;
        Ok(())
    }

    pub fn insert_wordbook(
        &self,
        id: &str,
        name: &str,
        description: Option<&str>,
        language: &str,
        is_system: bool,
    ) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO wordbooks (id, name, description, language, is_system)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, name, description, language, is_system as i64],
        )?;
        Ok(())
    }

    pub fn add_wordbook_entry(&self, wordbook_id: &str, word_id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR IGNORE INTO wordbook_entries (wordbook_id, word_id) VALUES (?1, ?2)",
            params![wordbook_id, word_id],
        )?;
        Ok(())
    }

    // ─── Demo Data ───────────────────────────────────────────────

    /// Populate a small deterministic corpus so the CLI demo has
    /// something to analyze.
    pub fn seed_demo_data(&self, user_id: &str, wordbook_id: &str) -> Result<()> {
        let german: &[(&str, &str, &str, &[&str])] = &[
            ("Haus", "A1", "名词", &["A1", "建筑"]),
            ("Tisch", "A1", "名词", &["A1", "家具"]),
            ("Stuhl", "A1", "名词", &["A1", "家具"]),
            ("gehen", "A1", "动词", &["A1"]),
            ("schnell", "A2", "形容词", &["A2"]),
            ("Gebäude", "B1", "名词", &["B1", "建筑"]),
            ("verstehen", "B1", "动词", &["B1"]),
            ("Wolkenkratzer", "C1", "名词", &["C1", "建筑"]),
        ];
        let english: &[(&str, &str, &str, &[&str])] = &[
            ("house", "A1", "名词", &["A1", "建筑"]),
            ("run", "A1", "动词", &["A1"]),
            ("beautiful", "A2", "形容词", &["A2"]),
            ("architecture", "B2", "名词", &["B2", "建筑"]),
        ];

        self.insert_wordbook(
            wordbook_id,
            "German Starter",
            Some("A basic German vocabulary set"),
            "de",
            true,
        )?;

        let mut day = 1;
        for (headword, level, pos, tags) in german {
            let word_id = self.insert_word(headword, "de", Some(level), Some(pos), tags)?;
            self.add_wordbook_entry(wordbook_id, &word_id)?;
            // A couple of reviews per word, spread over recent days.
            self.insert_review(
                user_id,
                &word_id,
                &format!("2026-08-{:02}T10:00:00Z", day),
                3,
            )?;
            self.insert_review(
                user_id,
                &word_id,
                &format!("2026-08-{:02}T10:00:00Z", day + 1),
                if day % 2 == 0 { 5 } else { 2 },
            )?;
            day += 1;
        }
        for (headword, level, pos, tags) in english {
            self.insert_word(headword, "en", Some(level), Some(pos), tags)?;
        }

        self.insert_goal(
            user_id,
            "Master 100 German A1 words",
            100,
            42,
            Some("2026-12-31"),
        )?;
        self.insert_goal(user_id, "Finish the starter wordbook", 8, 8, None)?;

        Ok(())
    }

    // ─── Query Helpers ───────────────────────────────────────────

    /// WHERE clause plus parameters for a word filter. Tags are stored
    /// comma-separated, so tag matching wraps both sides in commas.
    fn filter_sql(filter: &WordFilter) -> (String, Vec<String>) {
        let mut clauses = Vec::new();
        let mut values = Vec::new();
        if let Some(language) = &filter.language {
            clauses.push("language = ?");
            values.push(language.clone());
        }
        if let Some(tag) = &filter.tag {
            clauses.push("(',' || tags || ',') LIKE ?");
            values.push(format!("%,{},%", tag));
        }
        let sql = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };
        (sql, values)
    }

    fn count_by(
        conn: &Connection,
        column: &str,
        where_sql: &str,
        values: &[String],
    ) -> Result<Vec<CountBucket>> {
        let sql = format!(
            "SELECT COALESCE({column}, 'unknown') AS label, COUNT(*) AS n
             FROM words{where_sql} GROUP BY label ORDER BY label"
        );
        let mut stmt = conn.prepare(&sql)?;
        let buckets = stmt
            .query_map(params_from_iter(values.iter()), |row| {
                Ok(CountBucket {
                    label: row.get(0)?,
                    count: row.get::<_, i64>(1)? as u64,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(buckets)
    }
}

impl LearningStore for Database {
    fn collection_overview(&self) -> Result<Vec<CollectionStats>> {
        let conn = self.conn.lock().unwrap();
        let mut stats = Vec::new();
        for table in COLLECTIONS {
            let count: i64 =
                conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                    row.get(0)
                })?;
            stats.push(CollectionStats {
                name: (*table).to_string(),
                row_count: count as u64,
            });
        }
        Ok(stats)
    }

    fn word_statistics(&self, filter: &WordFilter) -> Result<WordStatistics> {
        let conn = self.conn.lock().unwrap();
        let (where_sql, values) = Self::filter_sql(filter);

        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM words{where_sql}"),
            params_from_iter(values.iter()),
            |row| row.get(0),
        )?;

        let by_difficulty = Self::count_by(&conn, "difficulty", &where_sql, &values)?;
        let by_part_of_speech = Self::count_by(&conn, "part_of_speech", &where_sql, &values)?;

        // Tags are comma-separated in one column; split and count here.
        let mut tag_counts: BTreeMap<String, u64> = BTreeMap::new();
        {
            let sql = format!("SELECT tags FROM words{where_sql}");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
                row.get::<_, String>(0)
            })?;
            for tags in rows {
                for tag in tags?.split(',').filter(|t| !t.is_empty()) {
                    *tag_counts.entry(tag.to_string()).or_insert(0) += 1;
                }
            }
        }
        let by_tag = tag_counts
            .into_iter()
            .map(|(label, count)| CountBucket { label, count })
            .collect();

        Ok(WordStatistics {
            total: total as u64,
            by_difficulty,
            by_part_of_speech,
            by_tag,
        })
    }

    fn learning_progress(&self, user_id: &str) -> Result<ProgressSummary> {
        let conn = self.conn.lock().unwrap();

        let total_reviews: i64 = conn.query_row(
            "SELECT COUNT(*) FROM review_records WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        let distinct_words: i64 = conn.query_row(
            "SELECT COUNT(DISTINCT word_id) FROM review_records WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        // A word counts as mastered once its best review hits 4+.
        let mastered: i64 = conn.query_row(
            "SELECT COUNT(*) FROM (
                 SELECT word_id, MAX(mastery) AS best
                 FROM review_records WHERE user_id = ?1 GROUP BY word_id
             ) WHERE best >= 4",
            params![user_id],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(
            "SELECT substr(reviewed_at, 1, 10) AS day, COUNT(*) AS n
             FROM review_records WHERE user_id = ?1
             GROUP BY day ORDER BY day",
        )?;
        let daily_activity = stmt
            .query_map(params![user_id], |row| {
                Ok(DailyActivity {
                    date: row.get(0)?,
                    reviews: row.get::<_, i64>(1)? as u64,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(ProgressSummary {
            user_id: user_id.to_string(),
            total_reviews: total_reviews as u64,
            distinct_words: distinct_words as u64,
            mastered: mastered as u64,
            learning: (distinct_words - mastered).max(0) as u64,
            daily_activity,
        })
    }

    fn learning_goals(&self, user_id: &str) -> Result<Vec<GoalSummary>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT description, target_words, completed_words, deadline
             FROM learning_goals WHERE user_id = ?1 ORDER BY description",
        )?;
        let goals = stmt
            .query_map(params![user_id], |row| {
                let target: i64 = row.get(1)?;
                let completed: i64 = row.get(2)?;
                let percent = if target > 0 {
                    (completed as f64 / target as f64) * 100.0
                } else {
                    0.0
                };
                Ok(GoalSummary {
                    description: row.get(0)?,
                    target_words: target as u64,
                    completed_words: completed as u64,
                    deadline: row.get(3)?,
                    percent,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(goals)
    }

    fn wordbook_summary(&self, wordbook_id: &str) -> Result<Option<WordbookSummary>> {
        let conn = self.conn.lock().unwrap();
        let header = conn
            .query_row(
                "SELECT id, name, description, language, is_system
                 FROM wordbooks WHERE id = ?1",
                params![wordbook_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, i64>(4)? != 0,
                    ))
                },
            )
            .optional()?;

        let Some((id, name, description, language, is_system)) = header else {
            return Ok(None);
        };

        let word_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM wordbook_entries WHERE wordbook_id = ?1",
            params![wordbook_id],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(
            "SELECT COALESCE(w.difficulty, 'unknown') AS label, COUNT(*) AS n
             FROM wordbook_entries e JOIN words w ON w.id = e.word_id
             WHERE e.wordbook_id = ?1 GROUP BY label ORDER BY label",
        )?;
        let by_difficulty = stmt
            .query_map(params![wordbook_id], |row| {
                Ok(CountBucket {
                    label: row.get(0)?,
                    count: row.get::<_, i64>(1)? as u64,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Some(WordbookSummary {
            id,
            name,
            description,
            language,
            is_system,
            word_count: word_count as u64,
            by_difficulty,
        }))
    }
}
