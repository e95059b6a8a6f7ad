//! The text-processing workflow.
//!
//! One pass per request: resolve the topic name (given or identified by the
//! model), create-or-get the topic, structure the text, store the pair. Used
//! by `POST /api/process-text` and by `organizer process`.

use anyhow::Result;
use serde::Serialize;
use std::io::Read;
use std::path::Path;

use crate::ai::{self, Structurer};
use crate::config::Config;
use crate::db;
use crate::error::AppError;
use crate::models::TopicRef;
use crate::repository::Repository;

/// Result of a successful processing run; also the HTTP response body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessOutcome {
    pub processed_text: String,
    pub topic: TopicRef,
}

/// Structure `text` and file it under `topic`, or under an identified topic
/// when `topic` is `None` or blank.
///
/// Validation happens before any database or model call.
pub async fn process_text(
    repo: &Repository,
    structurer: &Structurer,
    text: &str,
    topic: Option<&str>,
) -> Result<ProcessOutcome, AppError> {
    if text.is_empty() {
        return Err(AppError::Validation(
            "Please provide valid text to analyze".to_string(),
        ));
    }

    let topic_name = match topic.map(str::trim).filter(|t| !t.is_empty()) {
        Some(name) => name.to_string(),
        None => structurer.identify_topic(text).await,
    };

    let topic = repo.create_or_get_topic(&topic_name, None).await?;
    let processed = structurer.analyze_and_structure_text(text).await?;
    let saved = repo
        .save_processed_text(text, &processed, topic.id)
        .await?;

    tracing::info!(topic_id = topic.id, text_id = saved.id, topic = %topic.name, "text processed");

    Ok(ProcessOutcome {
        processed_text: processed,
        topic: TopicRef::from(&topic),
    })
}

/// CLI entry point for `organizer process`.
///
/// Reads the text from `text`, else from `file`, else from stdin.
pub async fn run_process(
    config: &Config,
    text: Option<String>,
    file: Option<&Path>,
    topic: Option<String>,
) -> Result<()> {
    let text = match (text, file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(path)?,
        (None, None) => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let pool = db::connect(config).await?;
    let repo = Repository::new(pool.clone());
    let structurer = Structurer::new(ai::create_model(&config.ai)?, &config.ai);

    let result = process_text(&repo, &structurer, &text, topic.as_deref()).await;
    pool.close().await;
    let outcome = result?;

    println!("Topic: {} (id {})", outcome.topic.name, outcome.topic.id);
    println!();
    println!("{}", outcome.processed_text);

    Ok(())
}
