//! Core data models.
//!
//! Topics group processed texts. Both are serialized with camelCase field
//! names and RFC 3339 timestamps, which is the shape the HTTP API returns.

use serde::Serialize;

/// A named grouping under which processed texts are filed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
}

/// An original text together with its structured HTML rendition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedText {
    pub id: i64,
    pub original_text: String,
    pub processed_text: String,
    pub topic_id: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// The `{id, name}` pair echoed back after processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicRef {
    pub id: i64,
    pub name: String,
}

impl From<&Topic> for TopicRef {
    fn from(topic: &Topic) -> Self {
        Self {
            id: topic.id,
            name: topic.name.clone(),
        }
    }
}

/// Current time as Unix milliseconds, the stored timestamp unit.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Render stored Unix milliseconds as an RFC 3339 UTC string.
pub fn format_ts_iso(ts_millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ts_millis)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
        .unwrap_or_else(|| ts_millis.to_string())
}
