//! Instagram Analytics Library
//!
//! Hashtag-driven Instagram post analytics:
//! - Apify scraping with retry/backoff and demo-data fallback
//! - Filtering, sorting and dashboard metrics
//! - Gemini / OpenAI content analysis with a neutral fallback
//! - API key management across env, `secrets.toml` and `config.yaml`
//! - `.env` template rendering and linting

pub mod api;
pub mod core;
pub mod models;
pub mod providers;
pub mod utils;

pub use crate::core::{
    BookmarkStore, ContentAnalyzer, KeyStatus, PostScraper, SaveFormat, SecretsStore,
};
pub use models::{AppConfig, AppError, AppResult, ErrorCode, Post, SearchOutcome, SearchQuery};
pub use utils::{CacheStats, PostCache, TelemetryCollector, TelemetryStats};
