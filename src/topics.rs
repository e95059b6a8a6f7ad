//! Topic and text listings for the CLI.
//!
//! `organizer topics`, `organizer search <query>` and `organizer texts <id>`
//! print the same data the HTTP API returns as JSON.

use anyhow::Result;

use crate::config::Config;
use crate::db;
use crate::models::Topic;
use crate::repository::Repository;

pub async fn run_topics(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let topics = Repository::new(pool.clone()).get_all_topics().await;
    pool.close().await;

    print_topics(&topics?);
    Ok(())
}

pub async fn run_search(config: &Config, query: &str) -> Result<()> {
    if query.is_empty() {
        anyhow::bail!("search query must not be empty");
    }

    let pool = db::connect(config).await?;
    let topics = Repository::new(pool.clone()).search_topics(query).await;
    pool.close().await;

    print_topics(&topics?);
    Ok(())
}

pub async fn run_texts(config: &Config, topic_id: i64) -> Result<()> {
    let pool = db::connect(config).await?;
    let texts = Repository::new(pool.clone())
        .get_texts_by_topic(topic_id)
        .await;
    pool.close().await;
    let texts = texts?;

    if texts.is_empty() {
        println!("No texts for topic {}.", topic_id);
        return Ok(());
    }

    for text in &texts {
        println!("--- #{} ({})", text.id, text.created_at);
        println!("{}", text.processed_text);
        println!();
    }

    Ok(())
}

fn print_topics(topics: &[Topic]) {
    if topics.is_empty() {
        println!("No topics.");
        return;
    }

    println!("{:<6} {:<32} UPDATED", "ID", "NAME");
    for topic in topics {
        println!("{:<6} {:<32} {}", topic.id, topic.name, topic.updated_at);
    }
}
