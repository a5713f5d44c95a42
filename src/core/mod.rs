//! Core Module - Business Logic
//!
//! Search orchestration, post analytics, AI content analysis, bookmarks and
//! the API key store.

pub mod analytics;
pub mod bookmarks;
pub mod content;
pub mod hashtags;
pub mod scraper;
pub mod secrets;

pub use analytics::*;
pub use bookmarks::*;
pub use content::*;
pub use hashtags::*;
pub use scraper::*;
pub use secrets::*;
