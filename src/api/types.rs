//! API Request/Response Types

use serde::{Deserialize, Serialize};

use crate::core::hashtags::HashtagCategory;
use crate::core::secrets::{KeyTestReport, SecretSource};
use crate::models::errors::AppError;
use crate::models::types::{
    AiProvider, ContentAnalysis, DashboardMetrics, Post, PostSource, SortBy, Theme, TimeFilter,
};
use crate::utils::cache::CacheStats;
use crate::utils::telemetry::TelemetryStats;

/// API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    pub latency_ms: f64,
    pub timestamp: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, latency_ms: f64) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(error: ApiError, latency_ms: f64) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// API Error
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl From<&AppError> for ApiError {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.code_str().to_string(),
            message: err.message.clone(),
            details: None,
        }
    }
}

// ============================================
// Health / Status / Settings
// ============================================

#[derive(Debug, Serialize)]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusQuery {
    /// Also call Apify and the AI provider to check the keys
    #[serde(default)]
    pub probe: bool,
}

#[derive(Debug, Serialize)]
pub struct KeyInfo {
    pub name: &'static str,
    pub masked: String,
    pub source: SecretSource,
}

#[derive(Debug, Serialize)]
pub struct StatusData {
    pub apify_connected: bool,
    pub ai_provider: AiProvider,
    pub ai_connected: bool,
    pub content_analysis_enabled: bool,
    pub missing_keys: Vec<&'static str>,
    pub keys: Vec<KeyInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe: Option<KeyTestReport>,
}

#[derive(Debug, Serialize)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Serialize)]
pub struct SettingsData {
    pub theme: Theme,
    pub posts_per_row: usize,
    pub enable_infinite_scroll: bool,
    pub default_time_filter: TimeFilter,
    pub default_sort_by: SortBy,
    pub max_posts_per_request: usize,
    pub cache_enabled: bool,
    pub enable_content_analysis: bool,
    pub enable_trend_prediction: bool,
    pub time_filters: Vec<FilterOption>,
    pub sort_options: Vec<String>,
    pub post_types: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct HashtagsData {
    pub categories: Vec<HashtagCategory>,
    pub all: Vec<&'static str>,
}

// ============================================
// Search
// ============================================

/// Search body; omitted filters take the configured defaults
#[derive(Debug, Default, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub hashtags: Vec<String>,
    pub time_filter: Option<String>,
    pub post_type: Option<String>,
    pub sort_by: Option<String>,
    pub limit: Option<usize>,
    #[serde(default)]
    pub refresh: bool,
}

/// Post card as the dashboard renders it
#[derive(Debug, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub caption_preview: String,
    pub engagement: u64,
    pub bookmarked: bool,
}

#[derive(Debug, Serialize)]
pub struct SearchData {
    pub hashtags: Vec<String>,
    pub source: PostSource,
    pub total: usize,
    pub metrics: Option<DashboardMetrics>,
    pub posts: Vec<PostView>,
    pub posts_per_row: usize,
}

// ============================================
// AI analysis
// ============================================

/// Analyze either a post from the last search or a free caption
#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeRequest {
    pub post_id: Option<String>,
    pub caption: Option<String>,
    /// Defaults to the hashtags found in the caption
    pub hashtags: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
    pub analysis: ContentAnalysis,
    pub ai_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<&'static str>,
}

// ============================================
// Bookmarks
// ============================================

#[derive(Debug, Serialize)]
pub struct BookmarksData {
    pub ids: Vec<String>,
    /// Bookmarked posts found in the last search
    pub posts: Vec<Post>,
}

#[derive(Debug, Serialize)]
pub struct BookmarkToggleData {
    pub id: String,
    pub bookmarked: bool,
    pub total: usize,
}

// ============================================
// Stats / Telemetry
// ============================================

#[derive(Debug, Serialize)]
pub struct StatsData {
    pub telemetry: TelemetryStats,
    pub cache: CacheStats,
    pub bookmarks: usize,
    pub uptime_seconds: u64,
    pub api_version: String,
}
