use std::env;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database path backing the key-value store
    pub database_url: String,

    /// Maximum total bytes across stored records
    pub storage_quota_bytes: u64,

    /// Gemini API key; commentary is unconfigured without it
    pub gemini_api_key: Option<String>,

    /// Gemini API base URL
    pub gemini_api_url: String,

    /// Gemini model used for commentary
    pub gemini_model: String,

    /// Timeout in seconds for a single commentary request
    pub commentary_timeout: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:data/cricket.db".to_string()),

            storage_quota_bytes: env::var("STORAGE_QUOTA_BYTES")
                .unwrap_or_else(|_| "5242880".to_string())
                .parse()
                .context("STORAGE_QUOTA_BYTES must be a valid number")?,

            gemini_api_key: env::var("GEMINI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),

            gemini_api_url: env::var("GEMINI_API_URL")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string()),

            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-2.5-flash".to_string()),

            commentary_timeout: env::var("COMMENTARY_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("COMMENTARY_TIMEOUT_SECS must be a valid number")?,
        })
    }
}
