use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Client for the Gemini text generation API
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

/// generateContent request body
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

/// generateContent response (only the fields we read)
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GeminiClient {
    /// Create a new Gemini client
    pub fn new(base_url: &str, api_key: &str, model: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build Gemini HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    /// Generate text for a prompt; returns the first candidate's text, trimmed
    pub async fn generate_text(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        debug!("Requesting commentary from model {}", self.model);

        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to call Gemini")?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Gemini API error: {} - {}", status, text);
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .context("Failed to parse Gemini response")?;

        let text = parsed
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .find_map(|p| p.text)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .context("Gemini response contained no text")?;

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_text_extraction_shape() {
        let raw = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "  Cracking drive through cover! 🏏 \n"}]}}
            ]
        }"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        let text = parsed.candidates[0].content.as_ref().unwrap().parts[0]
            .text
            .as_deref()
            .unwrap();
        assert_eq!(text.trim(), "Cracking drive through cover! 🏏");
    }

    #[test]
    fn test_empty_response_parses() {
        let parsed: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.candidates.is_empty());
    }

    #[tokio::test]
    async fn test_failed_call_does_not_leak_key() {
        let client =
            GeminiClient::new("http://127.0.0.1:9", "SECRET123", "m", Duration::from_secs(2))
                .unwrap();

        let err = client.generate_text("hi").await.unwrap_err();
        let message = format!("{:#}", err);

        assert!(message.contains("generateContent"));
        assert!(!message.contains("SECRET123"));
    }

    #[test]
    fn test_request_body_shape() {
        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: "hi" }],
            }],
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"contents":[{"parts":[{"text":"hi"}]}]}"#
        );
    }
}
