//! SQLite-backed repository for topics and processed texts.
//!
//! | Method | Purpose |
//! |--------|---------|
//! | [`create_or_get_topic`](Repository::create_or_get_topic) | Atomic upsert of a topic by name |
//! | [`save_processed_text`](Repository::save_processed_text) | Insert one processed text |
//! | [`get_all_topics`](Repository::get_all_topics) | Topics, most recently updated first |
//! | [`get_texts_by_topic`](Repository::get_texts_by_topic) | Texts of a topic, newest first |
//! | [`search_topics`](Repository::search_topics) | Case-insensitive substring match on names |
//!
//! Equal timestamps are ordered by descending `id`, so "most recent first"
//! is a total order even within one millisecond.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::error::StoreError;
use crate::models::{format_ts_iso, now_millis, ProcessedText, Topic};

/// Row counts reported by `organizer stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
    pub topics: i64,
    pub texts: i64,
}

/// Wraps a [`SqlitePool`]; cheap to clone and share across requests.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Return the topic named `name`, creating it if absent.
    ///
    /// A single `INSERT ... ON CONFLICT(name) DO UPDATE` statement, so two
    /// concurrent calls with the same name both get the same row. An existing
    /// topic keeps its description and `created_at`; only `updated_at` moves.
    pub async fn create_or_get_topic(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Topic, StoreError> {
        let now = now_millis();

        let row = sqlx::query(
            r#"
            INSERT INTO topics (name, description, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(name) DO UPDATE SET
                updated_at = excluded.updated_at
            RETURNING id, name, description, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(description.unwrap_or(""))
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::from_insert(e, None))?;

        let topic = topic_from_row(&row);
        tracing::debug!(topic_id = topic.id, name = %topic.name, "topic resolved");
        Ok(topic)
    }

    /// Insert one processed text under `topic_id`.
    pub async fn save_processed_text(
        &self,
        original_text: &str,
        processed_text: &str,
        topic_id: i64,
    ) -> Result<ProcessedText, StoreError> {
        let now = now_millis();

        let row = sqlx::query(
            r#"
            INSERT INTO processed_texts (original_text, processed_text, topic_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, original_text, processed_text, topic_id, created_at, updated_at
            "#,
        )
        .bind(original_text)
        .bind(processed_text)
        .bind(topic_id)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::from_insert(e, Some(topic_id)))?;

        let text = text_from_row(&row);
        tracing::debug!(text_id = text.id, topic_id, "processed text saved");
        Ok(text)
    }

    pub async fn get_all_topics(&self) -> Result<Vec<Topic>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, description, created_at, updated_at
            FROM topics
            ORDER BY updated_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(topic_from_row).collect())
    }

    /// Texts filed under `topic_id`, newest first. Unknown ids yield an empty list.
    pub async fn get_texts_by_topic(&self, topic_id: i64) -> Result<Vec<ProcessedText>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, original_text, processed_text, topic_id, created_at, updated_at
            FROM processed_texts
            WHERE topic_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(topic_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(text_from_row).collect())
    }

    /// Topics whose name contains `query`, ignoring case.
    ///
    /// Scans every topic and filters in process; the recency order of
    /// [`get_all_topics`](Self::get_all_topics) is preserved.
    pub async fn search_topics(&self, query: &str) -> Result<Vec<Topic>, StoreError> {
        let needle = query.to_lowercase();
        let topics = self.get_all_topics().await?;
        let total = topics.len();

        let matches: Vec<Topic> = topics
            .into_iter()
            .filter(|t| t.name.to_lowercase().contains(&needle))
            .collect();

        tracing::debug!(query, scanned = total, matched = matches.len(), "topic search");
        Ok(matches)
    }

    pub async fn counts(&self) -> Result<Counts, StoreError> {
        let topics: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM topics")
            .fetch_one(&self.pool)
            .await?;
        let texts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM processed_texts")
            .fetch_one(&self.pool)
            .await?;
        Ok(Counts { topics, texts })
    }
}

fn topic_from_row(row: &SqliteRow) -> Topic {
    Topic {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        created_at: format_ts_iso(row.get("created_at")),
        updated_at: format_ts_iso(row.get("updated_at")),
    }
}

fn text_from_row(row: &SqliteRow) -> ProcessedText {
    ProcessedText {
        id: row.get("id"),
        original_text: row.get("original_text"),
        processed_text: row.get("processed_text"),
        topic_id: row.get("topic_id"),
        created_at: format_ts_iso(row.get("created_at")),
        updated_at: format_ts_iso(row.get("updated_at")),
    }
}
