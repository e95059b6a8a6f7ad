//! TOML configuration.
//!
//! The file has three sections:
//!
//! ```toml
//! [db]
//! path = "./data/organizer.sqlite"
//!
//! [ai]
//! provider = "gemini"
//! model = "gemini-1.5-pro"
//!
//! [server]
//! bind = "0.0.0.0:5000"
//! ```
//!
//! Only `[db].path` is required; everything else has defaults. After parsing,
//! a `DATABASE_URL` environment variable overrides the database location.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
    /// SQLite connection string; takes precedence over `path` when set.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct AiConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Name of the environment variable holding the API credential.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Language the identified topic names are requested in.
    #[serde(default = "default_topic_language")]
    pub topic_language: String,
    #[serde(default = "default_fallback_topic")]
    pub fallback_topic: String,
    /// Number of leading characters sent for topic identification.
    #[serde(default = "default_topic_input_chars")]
    pub topic_input_chars: usize,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            topic_language: default_topic_language(),
            fallback_topic: default_fallback_topic(),
            topic_input_chars: default_topic_input_chars(),
        }
    }
}

fn default_provider() -> String {
    "gemini".to_string()
}
fn default_model() -> String {
    "gemini-1.5-pro".to_string()
}
fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}
fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_max_retries() -> u32 {
    2
}
fn default_topic_language() -> String {
    "English".to_string()
}
fn default_fallback_topic() -> String {
    "General topic".to_string()
}
fn default_topic_input_chars() -> usize {
    1000
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Directory with the single-page frontend, served for unmatched paths.
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            static_dir: None,
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:5000".to_string()
}

impl AiConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if let Ok(url) = std::env::var("DATABASE_URL") {
        if !url.trim().is_empty() {
            config.db.url = Some(url);
        }
    }

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.db.max_connections == 0 {
        anyhow::bail!("db.max_connections must be > 0");
    }

    match config.ai.provider.as_str() {
        "disabled" | "gemini" => {}
        other => anyhow::bail!(
            "Unknown ai provider: '{}'. Must be gemini or disabled.",
            other
        ),
    }

    if config.ai.is_enabled() && config.ai.model.trim().is_empty() {
        anyhow::bail!("ai.model must not be empty when provider is '{}'", config.ai.provider);
    }

    if config.ai.topic_input_chars == 0 {
        anyhow::bail!("ai.topic_input_chars must be > 0");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config: Config = toml::from_str("[db]\npath = \"/tmp/x.sqlite\"\n").unwrap();
        assert_eq!(config.db.max_connections, 5);
        assert_eq!(config.ai.provider, "gemini");
        assert_eq!(config.ai.api_key_env, "GEMINI_API_KEY");
        assert_eq!(config.ai.topic_input_chars, 1000);
        assert_eq!(config.server.bind, "0.0.0.0:5000");
        assert!(config.server.static_dir.is_none());
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let config: Config =
            toml::from_str("[db]\npath = \"x.sqlite\"\n[ai]\nprovider = \"openai\"\n").unwrap();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("Unknown ai provider"));
    }

    #[test]
    fn test_zero_pool_rejected() {
        let config: Config =
            toml::from_str("[db]\npath = \"x.sqlite\"\nmax_connections = 0\n").unwrap();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_load_config_reads_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("organizer.toml");
        std::fs::write(
            &path,
            "[db]\npath = \"notes.sqlite\"\n[ai]\nprovider = \"disabled\"\nfallback_topic = \"Misc\"\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert!(!config.ai.is_enabled());
        assert_eq!(config.ai.fallback_topic, "Misc");
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Path::new("/nonexistent/organizer.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
