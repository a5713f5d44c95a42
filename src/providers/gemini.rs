//! Google Gemini client (generateContent REST endpoint)
//!
//! API: https://ai.google.dev/api/generate-content

use eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::http::{build_client, check_status, with_retry, RetryPolicy};
use crate::utils::constants::{GEMINI_BASE_URL, GEMINI_MODEL};

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

/// generateContent response (only the parts we read)
#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
pub struct CandidatePart {
    pub text: Option<String>,
}

impl GenerateResponse {
    /// Text of the first candidate's first part
    pub fn text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .text
            .as_deref()
    }
}

/// Gemini REST client
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    policy: RetryPolicy,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, timeout: Duration, policy: RetryPolicy) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(eyre!("Gemini API key is empty"));
        }
        Ok(Self {
            client: build_client(timeout)?,
            base_url: GEMINI_BASE_URL.to_string(),
            api_key,
            model: GEMINI_MODEL.to_string(),
            policy,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Send a single-turn prompt and return the reply text
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        debug!("🤖 Gemini: sending prompt ({} chars)", prompt.len());

        let response: GenerateResponse = with_retry(&self.policy, "Gemini", || async {
            let response = self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(&body)
                .send()
                .await
                .map_err(|e| eyre!("Gemini request failed: {}", e))?;
            check_status(response)
                .await?
                .json::<GenerateResponse>()
                .await
                .map_err(|e| eyre!("Failed to parse Gemini response: {}", e))
        })
        .await?;

        response
            .text()
            .map(str::to_string)
            .ok_or_else(|| eyre!("Gemini returned no candidates"))
    }
}
