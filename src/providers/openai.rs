//! OpenAI chat completions client (alternative to Gemini)

use eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::http::{build_client, check_status, with_retry, RetryPolicy};
use crate::utils::constants::{OPENAI_BASE_URL, OPENAI_MODEL};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    pub content: Option<String>,
}

impl ChatResponse {
    pub fn text(&self) -> Option<&str> {
        self.choices.first()?.message.content.as_deref()
    }
}

/// OpenAI REST client
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    policy: RetryPolicy,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, timeout: Duration, policy: RetryPolicy) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(eyre!("OpenAI API key is empty"));
        }
        Ok(Self {
            client: build_client(timeout)?,
            base_url: OPENAI_BASE_URL.to_string(),
            api_key,
            model: OPENAI_MODEL.to_string(),
            policy,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Send a single user message and return the reply text
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.2,
        };

        debug!("🤖 OpenAI: sending prompt ({} chars)", prompt.len());

        let response: ChatResponse = with_retry(&self.policy, "OpenAI", || async {
            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await
                .map_err(|e| eyre!("OpenAI request failed: {}", e))?;
            check_status(response)
                .await?
                .json::<ChatResponse>()
                .await
                .map_err(|e| eyre!("Failed to parse OpenAI response: {}", e))
        })
        .await?;

        response
            .text()
            .map(str::to_string)
            .ok_or_else(|| eyre!("OpenAI returned no choices"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_text() {
        let raw = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"hi"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.text(), Some("hi"));
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(OpenAiClient::new("", Duration::from_secs(1), RetryPolicy::none()).is_err());
    }
}
