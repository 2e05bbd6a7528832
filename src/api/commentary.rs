use std::time::Duration;

use tracing::{error, warn};

use super::gemini::GeminiClient;
use crate::config::Config;

/// Returned when no API key is configured
pub const UNCONFIGURED_FALLBACK: &str = "Great shot!";

/// Returned when the generation call fails for any reason
pub const FAILURE_FALLBACK: &str = "What a play! 🏏";

/// Produces a one-line commentary string for a delivery. Never fails.
pub struct CommentaryGenerator {
    client: Option<GeminiClient>,
}

impl CommentaryGenerator {
    pub fn new(client: Option<GeminiClient>) -> Self {
        Self { client }
    }

    /// Generator that always answers with the unconfigured fallback
    pub fn unconfigured() -> Self {
        Self::new(None)
    }

    pub fn from_config(config: &Config) -> Self {
        let Some(api_key) = config.gemini_api_key.as_deref() else {
            warn!("GEMINI_API_KEY not set, commentary will use a fixed line");
            return Self::unconfigured();
        };

        match GeminiClient::new(
            &config.gemini_api_url,
            api_key,
            &config.gemini_model,
            Duration::from_secs(config.commentary_timeout),
        ) {
            Ok(client) => Self::new(Some(client)),
            Err(e) => {
                error!("Commentary disabled: {:#}", e);
                Self::unconfigured()
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    /// One short line for the ticker, or a fixed fallback
    pub async fn generate(&self, event: &str, batter: &str, bowler: &str, score: &str) -> String {
        let Some(client) = &self.client else {
            return UNCONFIGURED_FALLBACK.to_string();
        };

        match client
            .generate_text(&build_prompt(event, batter, bowler, score))
            .await
        {
            Ok(text) => text,
            Err(e) => {
                error!("Gemini commentary failed: {:#}", e);
                FAILURE_FALLBACK.to_string()
            }
        }
    }
}

fn build_prompt(event: &str, batter: &str, bowler: &str, score: &str) -> String {
    format!(
        "You are a cricket commentator.\n\
         The event is: {event}.\n\
         Batter: {batter}.\n\
         Bowler: {bowler}.\n\
         Current Score: {score}.\n\
         Write a VERY short, exciting, one-sentence commentary line (max 15 words) \
         suitable for a live ticker. Use emojis."
    )
}
