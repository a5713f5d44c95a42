//! Post search orchestration
//!
//! cache ─▶ live Apify scrape ─▶ demo fallback, then
//! filter ▸ truncate ▸ sort ▸ metrics.

use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use super::analytics::{compute_metrics, filter_by_time, filter_by_type, sort_posts};
use super::hashtags::normalize_hashtag;
use super::secrets::SecretsStore;
use crate::models::config::AppConfig;
use crate::models::errors::{AppError, ErrorCode};
use crate::models::types::{Post, PostSource, SearchOutcome, SearchQuery};
use crate::providers::demo::demo_posts;
use crate::providers::http::StatusError;
use crate::utils::cache::PostCache;
use crate::utils::constants::{DEFAULT_HASHTAGS, DEFAULT_SEARCH_LIMIT, ENV_APIFY_TOKEN};
use crate::utils::telemetry::TelemetryCollector;

pub struct PostScraper {
    config: AppConfig,
    secrets: Arc<SecretsStore>,
    cache: PostCache,
    telemetry: Arc<TelemetryCollector>,
    apify_base_url: Option<String>,
}

impl PostScraper {
    pub fn new(
        config: AppConfig,
        secrets: Arc<SecretsStore>,
        telemetry: Arc<TelemetryCollector>,
    ) -> Self {
        Self {
            config,
            secrets,
            cache: PostCache::new(),
            telemetry,
            apify_base_url: None,
        }
    }

    pub fn with_cache(mut self, cache: PostCache) -> Self {
        self.cache = cache;
        self
    }

    /// Send Apify requests elsewhere (self-hosted proxy, tests)
    pub fn with_apify_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.apify_base_url = Some(base_url.into());
        self
    }

    pub fn cache(&self) -> &PostCache {
        &self.cache
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Whether live scraping is possible right now
    pub fn live_available(&self) -> bool {
        self.secrets.is_set("apify_token")
    }

    /// Query with the configured default filters
    pub fn default_query(&self, hashtags: Vec<String>) -> SearchQuery {
        SearchQuery {
            hashtags,
            time_filter: self.config.default_time_filter,
            post_type: Default::default(),
            sort_by: self.config.default_sort_by,
            limit: DEFAULT_SEARCH_LIMIT.min(self.config.max_posts_per_request),
            refresh: false,
        }
    }

    /// Run a search; never fails, falling back to demo data
    pub async fn search(&self, query: SearchQuery) -> SearchOutcome {
        let start = Instant::now();
        let query = self.normalize(query);
        let key = query.cache_key();

        if self.config.cache_enabled && !query.refresh {
            if let Some(entry) = self.cache.get(&key) {
                return self.finish(entry.posts, &query, PostSource::Cache, start);
            }
        }

        let (posts, source) = self.fetch(&query).await;

        let now = Utc::now();
        let mut posts = filter_by_time(filter_by_type(posts, query.post_type), query.time_filter, now);
        posts.truncate(query.limit);

        if self.config.cache_enabled && source == PostSource::Live {
            self.cache.set(&key, posts.clone(), source);
        }

        self.finish(posts, &query, source, start)
    }

    fn normalize(&self, mut query: SearchQuery) -> SearchQuery {
        let mut tags: Vec<String> = Vec::with_capacity(query.hashtags.len());
        for tag in query.hashtags.iter().map(|t| normalize_hashtag(t)) {
            if tag.len() > 1 && !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        if tags.is_empty() {
            tags = DEFAULT_HASHTAGS.iter().map(|t| t.to_string()).collect();
        }
        query.hashtags = tags;
        query.limit = self.config.clamp_limit(query.limit);
        query
    }

    async fn fetch(&self, query: &SearchQuery) -> (Vec<Post>, PostSource) {
        let now = Utc::now();
        let demo = || {
            demo_posts(
                &query.hashtags,
                query.time_filter,
                query.post_type,
                query.limit,
                now,
            )
        };

        let Some(mut client) = self.secrets.apify_client(&self.config) else {
            warn!("⚠️ {} - serving demo data", AppError::missing_api_key(ENV_APIFY_TOKEN));
            return (demo(), PostSource::Demo);
        };
        if let Some(base_url) = &self.apify_base_url {
            client = client.with_base_url(base_url.clone());
        }

        let proxy = self.secrets.get("proxy_url");
        let proxy = Some(proxy.as_str()).filter(|p| !p.is_empty());

        match client
            .scrape_hashtags(&query.hashtags, query.limit, query.time_filter.cutoff(now), proxy)
            .await
        {
            Ok(items) => {
                let posts = items.into_iter().map(|item| item.into_post(now)).collect();
                (posts, PostSource::Live)
            }
            Err(e) => {
                warn!("⚠️ {} - serving demo data", scrape_error(&e));
                self.telemetry.record_scrape_failure();
                (demo(), PostSource::Demo)
            }
        }
    }

    fn finish(
        &self,
        mut posts: Vec<Post>,
        query: &SearchQuery,
        source: PostSource,
        start: Instant,
    ) -> SearchOutcome {
        sort_posts(&mut posts, query.sort_by);
        let metrics = compute_metrics(&posts);
        let latency_ms = start.elapsed().as_millis() as u64;

        self.telemetry.record_search(source, posts.len(), latency_ms);
        info!(
            "📰 Search {} -> {} posts ({}, {}ms)",
            query.hashtags.join(" "),
            posts.len(),
            source.as_str(),
            latency_ms
        );

        SearchOutcome {
            hashtags: query.hashtags.clone(),
            posts,
            metrics,
            source,
            latency_ms,
        }
    }
}

/// Map a failed scrape onto a stable error code for logging
fn scrape_error(err: &eyre::Report) -> AppError {
    match err.downcast_ref::<StatusError>() {
        Some(status) if status.is_auth_failure() => AppError::new(
            ErrorCode::ApifyUnauthorized,
            format!("Apify rejected the token: {}", status),
        ),
        _ => AppError::apify_error(err.to_string()),
    }
}
