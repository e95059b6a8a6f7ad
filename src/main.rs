//! # Text Organizer CLI (`organizer`)
//!
//! ## Usage
//!
//! ```bash
//! organizer --config ./config/organizer.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `organizer init` | Create the SQLite database and run schema migrations |
//! | `organizer serve` | Start the HTTP server |
//! | `organizer process` | Structure a text and file it under a topic |
//! | `organizer topics` | List topics, most recently updated first |
//! | `organizer search <query>` | Find topics by name |
//! | `organizer texts <id>` | Show the texts of a topic |
//! | `organizer stats` | Show database statistics |
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `info`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use text_organizer::{config, migrate, process, server, stats, topics};

/// Text Organizer: structure free-form notes with a generative-language API
/// and file them under topics.
#[derive(Parser)]
#[command(name = "organizer", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// `DATABASE_URL`, when set, overrides the database location from the file.
    #[arg(long, global = true, default_value = "./config/organizer.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the `topics` and
    /// `processed_texts` tables. Running it again is harmless.
    Init,

    /// Start the HTTP server.
    ///
    /// Applies migrations, then serves the API on `[server].bind`.
    Serve,

    /// Structure a text and store it.
    ///
    /// The text comes from the TEXT argument, else `--file`, else stdin.
    Process {
        /// Text to process.
        text: Option<String>,

        /// Read the text from this file.
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,

        /// File under this topic instead of asking the model to name one.
        #[arg(long)]
        topic: Option<String>,
    },

    /// List all topics.
    Topics,

    /// Search topics by a case-insensitive substring of their name.
    Search {
        /// Substring to look for.
        query: String,
    },

    /// Show the processed texts of a topic.
    Texts {
        /// Numeric topic id.
        topic_id: i64,
    },

    /// Show database statistics.
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Process { text, file, topic } => {
            process::run_process(&cfg, text, file.as_deref(), topic).await?;
        }
        Commands::Topics => {
            topics::run_topics(&cfg).await?;
        }
        Commands::Search { query } => {
            topics::run_search(&cfg, &query).await?;
        }
        Commands::Texts { topic_id } => {
            topics::run_texts(&cfg, topic_id).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
    }

    Ok(())
}
