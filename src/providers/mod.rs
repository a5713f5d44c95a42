//! Providers Module - External Data Sources
//!
//! Apify for scraping, Gemini/OpenAI for content analysis, demo data as the
//! always-available fallback.

pub mod apify;
pub mod demo;
pub mod gemini;
pub mod http;
pub mod openai;

pub use apify::*;
pub use demo::*;
pub use gemini::*;
pub use http::*;
pub use openai::*;

use eyre::Result;

/// Configured LLM backend
pub enum LlmClient {
    Gemini(GeminiClient),
    OpenAi(OpenAiClient),
}

impl LlmClient {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Gemini(_) => "gemini",
            Self::OpenAi(_) => "openai",
        }
    }

    /// Single prompt in, reply text out
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        match self {
            Self::Gemini(client) => client.generate(prompt).await,
            Self::OpenAi(client) => client.generate(prompt).await,
        }
    }
}
