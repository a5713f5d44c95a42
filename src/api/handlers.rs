//! API Request Handlers

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Json, Path, Query, State,
    },
    http::StatusCode,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::types::*;
use crate::core::analytics::caption_preview;
use crate::core::bookmarks::BookmarkStore;
use crate::core::content::ContentAnalyzer;
use crate::core::hashtags::{all_hashtags, extract_hashtags, hashtag_presets};
use crate::core::scraper::PostScraper;
use crate::core::secrets::SecretsStore;
use crate::models::config::AppConfig;
use crate::models::errors::{AppError, ErrorCode};
use crate::models::types::{Post, PostType, PostTypeFilter, SortBy, TimeFilter};
use crate::utils::constants::{APP_VERSION, SECRET_KEYS};
use crate::utils::telemetry::TelemetryCollector;

type ApiFailure = (StatusCode, Json<ApiResponse<()>>);
type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiFailure>;

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

fn ok<T: serde::Serialize>(data: T, start: Instant) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data, elapsed_ms(start))))
}

fn fail(err: AppError, start: Instant) -> ApiFailure {
    let status = StatusCode::from_u16(err.code.http_status())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        warn!("⚠️ {}", err);
    }
    (
        status,
        Json(ApiResponse::error(ApiError::from(&err), elapsed_ms(start))),
    )
}

/// Malformed bodies and query strings still answer with the JSON envelope
fn rejected(message: String, start: Instant) -> ApiFailure {
    fail(AppError::bad_request(message), start)
}

/// Parse an optional filter token, reporting bad input as 400
fn parse_token<T>(raw: Option<&str>, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr<Err = AppError>,
{
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => raw.parse().map_err(|e: AppError| AppError::bad_request(e.message)),
        None => Ok(default),
    }
}

/// Shared application state
pub struct AppState {
    pub config: AppConfig,
    pub secrets: Arc<SecretsStore>,
    pub scraper: PostScraper,
    pub analyzer: ContentAnalyzer,
    pub bookmarks: BookmarkStore,
    /// Posts of the most recent search (for bookmarks and analysis by id)
    pub last_posts: RwLock<Vec<Post>>,
    pub telemetry: Arc<TelemetryCollector>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        secrets: Arc<SecretsStore>,
        bookmarks: BookmarkStore,
        telemetry: Arc<TelemetryCollector>,
    ) -> Self {
        let scraper = PostScraper::new(config.clone(), secrets.clone(), telemetry.clone());
        let analyzer = ContentAnalyzer::new(&config, secrets.llm_client(&config), telemetry.clone());

        Self {
            config,
            secrets,
            scraper,
            analyzer,
            bookmarks,
            last_posts: RwLock::new(Vec::new()),
            telemetry,
            start_time: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Background task: drop expired cache entries every `every`
    pub fn start_cleanup_task(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let cache = self.scraper.cache().clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                cache.cleanup_expired();
            }
        })
    }
}

// ============================================
// Health / Status / Settings
// ============================================

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthData>> {
    let start = Instant::now();

    let data = HealthData {
        status: "healthy".to_string(),
        version: APP_VERSION.to_string(),
        uptime_seconds: state.uptime_seconds(),
    };

    Json(ApiResponse::success(data, elapsed_ms(start)))
}

pub async fn get_status(
    State(state): State<Arc<AppState>>,
    query: Result<Query<StatusQuery>, QueryRejection>,
) -> ApiResult<StatusData> {
    let start = Instant::now();
    let Query(query) = query.map_err(|e| rejected(e.body_text(), start))?;
    let secrets = &state.secrets;

    let probe = if query.probe {
        info!("🔑 Probing API keys");
        Some(secrets.test_keys(&state.config).await)
    } else {
        None
    };

    let data = StatusData {
        apify_connected: state.scraper.live_available(),
        ai_provider: secrets.ai_provider(),
        ai_connected: state.analyzer.ai_available(),
        content_analysis_enabled: state.analyzer.is_enabled(),
        missing_keys: secrets.missing_keys(),
        keys: SECRET_KEYS
            .iter()
            .map(|&name| KeyInfo {
                name,
                masked: secrets.masked(name),
                source: secrets.source(name),
            })
            .collect(),
        probe,
    };

    ok(data, start)
}

pub async fn get_settings(State(state): State<Arc<AppState>>) -> ApiResult<SettingsData> {
    let start = Instant::now();
    let c = &state.config;

    let data = SettingsData {
        theme: c.theme,
        posts_per_row: c.posts_per_row,
        enable_infinite_scroll: c.enable_infinite_scroll,
        default_time_filter: c.default_time_filter,
        default_sort_by: c.default_sort_by,
        max_posts_per_request: c.max_posts_per_request,
        cache_enabled: c.cache_enabled,
        enable_content_analysis: c.enable_content_analysis,
        enable_trend_prediction: c.enable_trend_prediction,
        time_filters: TimeFilter::ALL
            .iter()
            .map(|f| FilterOption {
                value: f.as_str().to_string(),
                label: f.label().to_string(),
            })
            .collect(),
        sort_options: [
            SortBy::Likes,
            SortBy::Comments,
            SortBy::Shares,
            SortBy::Views,
            SortBy::Recent,
        ]
        .iter()
        .map(|s| s.as_str().to_string())
        .collect(),
        post_types: std::iter::once(PostTypeFilter::All.as_str().to_string())
            .chain(PostType::ALL.iter().map(|t| t.as_str().to_string()))
            .collect(),
    };

    ok(data, start)
}

pub async fn get_hashtags() -> ApiResult<HashtagsData> {
    let start = Instant::now();
    ok(
        HashtagsData {
            categories: hashtag_presets(),
            all: all_hashtags(),
        },
        start,
    )
}

// ============================================
// Search
// ============================================

pub async fn search_posts(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> ApiResult<SearchData> {
    let start = Instant::now();
    let Json(req) = payload.map_err(|e| rejected(e.body_text(), start))?;

    let mut query = state.scraper.default_query(req.hashtags);
    query.time_filter =
        parse_token(req.time_filter.as_deref(), query.time_filter).map_err(|e| fail(e, start))?;
    query.post_type =
        parse_token(req.post_type.as_deref(), query.post_type).map_err(|e| fail(e, start))?;
    query.sort_by = parse_token(req.sort_by.as_deref(), query.sort_by).map_err(|e| fail(e, start))?;
    if let Some(limit) = req.limit {
        query.limit = limit;
    }
    query.refresh = req.refresh;

    let outcome = state.scraper.search(query).await;
    let posts: Vec<PostView> = outcome
        .posts
        .iter()
        .map(|post| PostView {
            caption_preview: caption_preview(&post.caption),
            engagement: post.engagement(),
            bookmarked: state.bookmarks.contains(&post.id),
            post: post.clone(),
        })
        .collect();

    *state.last_posts.write().await = outcome.posts;

    ok(
        SearchData {
            hashtags: outcome.hashtags,
            source: outcome.source,
            total: posts.len(),
            metrics: outcome.metrics,
            posts,
            posts_per_row: state.config.posts_per_row,
        },
        start,
    )
}

// ============================================
// AI analysis
// ============================================

pub async fn analyze_content(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> ApiResult<AnalyzeData> {
    let start = Instant::now();
    let Json(req) = payload.map_err(|e| rejected(e.body_text(), start))?;

    let (caption, default_tags) = match (&req.post_id, &req.caption) {
        (Some(id), _) => {
            let posts = state.last_posts.read().await;
            let post = posts.iter().find(|p| &p.id == id).ok_or_else(|| {
                fail(
                    AppError::new(ErrorCode::ApiNotFound, format!("Post '{}' not in last search", id)),
                    start,
                )
            })?;
            (post.caption.clone(), post.hashtags.clone())
        }
        (None, Some(caption)) => (caption.clone(), extract_hashtags(caption)),
        (None, None) => {
            return Err(fail(
                AppError::bad_request("Provide either post_id or caption"),
                start,
            ))
        }
    };
    let hashtags = req.hashtags.unwrap_or(default_tags);

    let analysis = state
        .analyzer
        .analyze(&caption, &hashtags)
        .await
        .map_err(|e| fail(e, start))?;

    ok(
        AnalyzeData {
            post_id: req.post_id,
            analysis,
            ai_available: state.analyzer.ai_available(),
            provider: state.analyzer.provider_name(),
        },
        start,
    )
}

// ============================================
// Bookmarks
// ============================================

pub async fn list_bookmarks(State(state): State<Arc<AppState>>) -> ApiResult<BookmarksData> {
    let start = Instant::now();
    let posts = state.bookmarks.bookmarked_posts(&state.last_posts.read().await);

    ok(
        BookmarksData {
            ids: state.bookmarks.ids(),
            posts,
        },
        start,
    )
}

pub async fn toggle_bookmark(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<BookmarkToggleData> {
    let start = Instant::now();

    if id.trim().is_empty() {
        return Err(fail(AppError::bad_request("Empty post id"), start));
    }
    let bookmarked = state.bookmarks.toggle(&id).map_err(|e| fail(e, start))?;

    ok(
        BookmarkToggleData {
            id,
            bookmarked,
            total: state.bookmarks.len(),
        },
        start,
    )
}

// ============================================
// Stats / Telemetry
// ============================================

pub async fn get_stats(State(state): State<Arc<AppState>>) -> ApiResult<StatsData> {
    let start = Instant::now();

    ok(
        StatsData {
            telemetry: state.telemetry.get_stats(),
            cache: state.scraper.cache().stats(),
            bookmarks: state.bookmarks.len(),
            uptime_seconds: state.uptime_seconds(),
            api_version: APP_VERSION.to_string(),
        },
        start,
    )
}
