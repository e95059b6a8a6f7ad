//! Database statistics.
//!
//! Used by `organizer stats` to show where the data lives and how much of
//! it there is.

use anyhow::Result;

use crate::config::Config;
use crate::db;
use crate::repository::Repository;

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let counts = Repository::new(pool.clone()).counts().await;
    pool.close().await;
    let counts = counts?;

    let location = match &config.db.url {
        Some(url) => url.clone(),
        None => config.db.path.display().to_string(),
    };
    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Text Organizer Database Stats");
    println!("============================");
    println!();
    println!("  Database:    {}", location);
    if config.db.url.is_none() {
        println!("  Size:        {}", format_bytes(db_size));
    }
    println!();
    println!("  Topics:      {}", counts.topics);
    println!("  Texts:       {}", counts.texts);

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }
}
