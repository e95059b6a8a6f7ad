//! Integration tests for the SQLite repository.

use std::time::Duration;

use tempfile::TempDir;
use text_organizer::config::Config;
use text_organizer::error::StoreError;
use text_organizer::repository::{Counts, Repository};
use text_organizer::{db, migrate};

// ─── Helpers ────────────────────────────────────────────────────────

fn test_config(tmp: &TempDir) -> Config {
    let db_path = tmp.path().join("data").join("organizer.sqlite");
    let config_content = format!(
        r#"
[db]
path = "{}"

[ai]
provider = "disabled"
"#,
        db_path.display()
    );
    toml::from_str(&config_content).unwrap()
}

async fn test_repo(tmp: &TempDir) -> Repository {
    let cfg = test_config(tmp);
    let pool = db::connect(&cfg).await.unwrap();
    migrate::apply(&pool).await.unwrap();
    Repository::new(pool)
}

/// Keep consecutive writes in distinct milliseconds.
async fn tick() {
    tokio::time::sleep(Duration::from_millis(5)).await;
}

// ─── Tests ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_or_get_topic_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    let repo = test_repo(&tmp).await;

    let first = repo
        .create_or_get_topic("Gardening", Some("plants"))
        .await
        .unwrap();
    tick().await;
    let second = repo.create_or_get_topic("Gardening", None).await.unwrap();

    assert!(first.id > 0);
    assert_eq!(first.id, second.id);
    assert_eq!(second.name, "Gardening");
    // The existing row keeps its description and creation time.
    assert_eq!(second.description, "plants");
    assert_eq!(second.created_at, first.created_at);
    assert!(second.updated_at > first.updated_at);

    let counts = repo.counts().await.unwrap();
    assert_eq!(counts, Counts { topics: 1, texts: 0 });
}

#[tokio::test]
async fn test_topic_names_are_case_sensitive() {
    let tmp = TempDir::new().unwrap();
    let repo = test_repo(&tmp).await;

    let lower = repo.create_or_get_topic("rust", None).await.unwrap();
    let upper = repo.create_or_get_topic("Rust", None).await.unwrap();

    assert_ne!(lower.id, upper.id);
    assert_eq!(repo.get_all_topics().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_concurrent_create_or_get_yields_one_topic() {
    let tmp = TempDir::new().unwrap();
    let repo = test_repo(&tmp).await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let repo = repo.clone();
        handles.push(tokio::spawn(async move {
            repo.create_or_get_topic("Race", None).await
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().unwrap().id);
    }

    ids.dedup();
    assert_eq!(ids.len(), 1, "all callers should see the same topic");
    assert_eq!(repo.counts().await.unwrap().topics, 1);
}

#[tokio::test]
async fn test_get_all_topics_most_recent_first() {
    let tmp = TempDir::new().unwrap();
    let repo = test_repo(&tmp).await;

    repo.create_or_get_topic("first", None).await.unwrap();
    tick().await;
    repo.create_or_get_topic("second", None).await.unwrap();
    tick().await;
    repo.create_or_get_topic("third", None).await.unwrap();

    let names: Vec<String> = repo
        .get_all_topics()
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(names, vec!["third", "second", "first"]);

    // Touching a topic through create-or-get moves it to the front.
    tick().await;
    repo.create_or_get_topic("first", None).await.unwrap();
    let top = repo.get_all_topics().await.unwrap();
    assert_eq!(top[0].name, "first");
}

#[tokio::test]
async fn test_search_topics_case_insensitive_substring() {
    let tmp = TempDir::new().unwrap();
    let repo = test_repo(&tmp).await;

    repo.create_or_get_topic("Foobar", None).await.unwrap();
    tick().await;
    repo.create_or_get_topic("BARFOO", None).await.unwrap();
    tick().await;
    repo.create_or_get_topic("baz", None).await.unwrap();

    let names: Vec<String> = repo
        .search_topics("foo")
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(names, vec!["BARFOO", "Foobar"]);

    let upper: Vec<String> = repo
        .search_topics("FOO")
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(upper, names);

    assert!(repo.search_topics("qux").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_search_topics_unicode() {
    let tmp = TempDir::new().unwrap();
    let repo = test_repo(&tmp).await;

    repo.create_or_get_topic("Žluté květiny", None).await.unwrap();
    repo.create_or_get_topic("Zahrada", None).await.unwrap();

    let found = repo.search_topics("žlu").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Žluté květiny");
}

#[tokio::test]
async fn test_texts_round_trip_byte_for_byte() {
    let tmp = TempDir::new().unwrap();
    let repo = test_repo(&tmp).await;

    let topic = repo.create_or_get_topic("Notes", None).await.unwrap();
    let original = "Ünïcödé line\r\n\ttabbed 'quoted' \"double\" 🚀\n\n  trailing  ";
    let processed = "<h2>2024-01-01</h2>\n<ol><li>Ünïcödé &amp; 🚀</li></ol>";

    let saved = repo
        .save_processed_text(original, processed, topic.id)
        .await
        .unwrap();
    assert!(saved.id > 0);
    assert_eq!(saved.topic_id, topic.id);

    let texts = repo.get_texts_by_topic(topic.id).await.unwrap();
    assert_eq!(texts.len(), 1);
    assert_eq!(texts[0].original_text.as_bytes(), original.as_bytes());
    assert_eq!(texts[0].processed_text.as_bytes(), processed.as_bytes());
    assert_eq!(texts[0], saved);
}

#[tokio::test]
async fn test_texts_newest_first_and_scoped_to_topic() {
    let tmp = TempDir::new().unwrap();
    let repo = test_repo(&tmp).await;

    let a = repo.create_or_get_topic("A", None).await.unwrap();
    let b = repo.create_or_get_topic("B", None).await.unwrap();

    repo.save_processed_text("one", "<p>one</p>", a.id).await.unwrap();
    tick().await;
    repo.save_processed_text("two", "<p>two</p>", a.id).await.unwrap();
    repo.save_processed_text("other", "<p>other</p>", b.id).await.unwrap();

    let originals: Vec<String> = repo
        .get_texts_by_topic(a.id)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.original_text)
        .collect();
    assert_eq!(originals, vec!["two", "one"]);

    assert_eq!(repo.counts().await.unwrap(), Counts { topics: 2, texts: 3 });
}

#[tokio::test]
async fn test_texts_for_empty_or_unknown_topic() {
    let tmp = TempDir::new().unwrap();
    let repo = test_repo(&tmp).await;

    let topic = repo.create_or_get_topic("Empty", None).await.unwrap();
    assert!(repo.get_texts_by_topic(topic.id).await.unwrap().is_empty());
    assert!(repo.get_texts_by_topic(424242).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_save_text_with_missing_topic_fails() {
    let tmp = TempDir::new().unwrap();
    let repo = test_repo(&tmp).await;

    let err = repo
        .save_processed_text("orphan", "<p>orphan</p>", 9999)
        .await
        .unwrap_err();
    assert!(
        matches!(err, StoreError::MissingTopic(9999)),
        "expected MissingTopic, got {:?}",
        err
    );
    assert_eq!(repo.counts().await.unwrap().texts, 0);
}

#[tokio::test]
async fn test_migrations_idempotent() {
    let tmp = TempDir::new().unwrap();
    let cfg = test_config(&tmp);

    migrate::run_migrations(&cfg).await.unwrap();
    migrate::run_migrations(&cfg).await.unwrap();

    let pool = db::connect(&cfg).await.unwrap();
    let repo = Repository::new(pool);
    assert_eq!(repo.counts().await.unwrap(), Counts { topics: 0, texts: 0 });
}
