//! Application configuration
//!
//! Typed view over the environment variables listed in the `.env` template.
//! Lenient loading (`from_env`) falls back to defaults with a warning; strict
//! validation (`validate_lookup`) reports every bad value instead.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

use super::errors::AppError;
use super::types::{AiProvider, SortBy, Theme, TimeFilter};
use crate::utils::constants::*;

/// Parse a boolean token (`true/false/1/0/yes/no/on/off`)
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Runtime configuration
#[derive(Clone)]
pub struct AppConfig {
    // App configuration
    pub debug_mode: bool,
    pub cache_enabled: bool,
    pub max_posts_per_request: usize,

    // Scraping settings
    /// Base delay between scrape retries
    pub scraping_delay: Duration,
    pub max_retries: u32,
    /// Per-request HTTP timeout
    pub timeout: Duration,
    pub default_time_filter: TimeFilter,
    pub default_sort_by: SortBy,

    // AI settings
    pub ai_provider: AiProvider,
    pub enable_content_analysis: bool,
    pub enable_trend_prediction: bool,

    // UI settings
    pub theme: Theme,
    pub posts_per_row: usize,
    pub enable_infinite_scroll: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            debug_mode: DEFAULT_DEBUG_MODE,
            cache_enabled: DEFAULT_CACHE_ENABLED,
            max_posts_per_request: DEFAULT_MAX_POSTS_PER_REQUEST,
            scraping_delay: Duration::from_secs(DEFAULT_SCRAPING_DELAY_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            default_time_filter: TimeFilter::default(),
            default_sort_by: SortBy::default(),
            ai_provider: AiProvider::default(),
            enable_content_analysis: DEFAULT_ENABLE_CONTENT_ANALYSIS,
            enable_trend_prediction: DEFAULT_ENABLE_TREND_PREDICTION,
            theme: Theme::default(),
            posts_per_row: DEFAULT_POSTS_PER_ROW,
            enable_infinite_scroll: DEFAULT_ENABLE_INFINITE_SCROLL,
        }
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("debug_mode", &self.debug_mode)
            .field("cache_enabled", &self.cache_enabled)
            .field("max_posts_per_request", &self.max_posts_per_request)
            .field("scraping_delay_secs", &self.scraping_delay.as_secs())
            .field("max_retries", &self.max_retries)
            .field("timeout_secs", &self.timeout.as_secs())
            .field("default_time_filter", &self.default_time_filter.as_str())
            .field("default_sort_by", &self.default_sort_by.as_str())
            .field("ai_provider", &self.ai_provider.as_str())
            .field("enable_content_analysis", &self.enable_content_analysis)
            .field("enable_trend_prediction", &self.enable_trend_prediction)
            .field("theme", &self.theme.as_str())
            .field("posts_per_row", &self.posts_per_row)
            .field("enable_infinite_scroll", &self.enable_infinite_scroll)
            .finish()
    }
}

/// Collects typed values from a lookup, remembering every rejected value
struct Reader<F> {
    lookup: F,
    errors: Vec<AppError>,
}

impl<F> Reader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn raw(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|v| !v.trim().is_empty())
    }

    fn bool(&mut self, key: &str, default: bool) -> bool {
        match self.raw(key) {
            None => default,
            Some(raw) => parse_bool(&raw).unwrap_or_else(|| {
                self.errors.push(AppError::invalid_value(key, &raw, "true|false"));
                default
            }),
        }
    }

    fn int<T>(&mut self, key: &str, default: T, min: T, max: T) -> T
    where
        T: FromStr + PartialOrd + Copy + fmt::Display,
    {
        match self.raw(key) {
            None => default,
            Some(raw) => match raw.trim().parse::<T>() {
                Ok(v) if v >= min && v <= max => v,
                _ => {
                    self.errors.push(AppError::invalid_value(
                        key,
                        &raw,
                        &format!("integer in {}..={}", min, max),
                    ));
                    default
                }
            },
        }
    }

    fn token<T>(&mut self, key: &str, default: T) -> T
    where
        T: FromStr<Err = AppError>,
    {
        match self.raw(key) {
            None => default,
            Some(raw) => raw.parse::<T>().unwrap_or_else(|e| {
                self.errors.push(AppError::new(e.code, format!("{}: {}", key, e.message)));
                default
            }),
        }
    }
}

impl AppConfig {
    /// Load `.env` (if any) and read the process environment
    pub fn from_env() -> Self {
        match dotenvy::dotenv() {
            Ok(path) => info!("📄 Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => warn!("⚠️ Could not parse .env file: {}", e),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; invalid values fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let (config, errors) = Self::read(lookup);
        for err in &errors {
            warn!("⚠️ {} - using default", err);
        }
        config
    }

    /// Strict check: one message per invalid value (empty when all valid)
    pub fn validate_lookup<F>(lookup: F) -> Vec<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::read(lookup).1.into_iter().map(|e| e.to_string()).collect()
    }

    fn read<F>(lookup: F) -> (Self, Vec<AppError>)
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut r = Reader {
            lookup,
            errors: Vec::new(),
        };

        let config = Self {
            debug_mode: r.bool(ENV_DEBUG_MODE, DEFAULT_DEBUG_MODE),
            cache_enabled: r.bool(ENV_CACHE_ENABLED, DEFAULT_CACHE_ENABLED),
            max_posts_per_request: r.int(
                ENV_MAX_POSTS_PER_REQUEST,
                DEFAULT_MAX_POSTS_PER_REQUEST,
                1,
                MAX_POSTS_PER_REQUEST_LIMIT,
            ),
            scraping_delay: Duration::from_secs(r.int(
                ENV_SCRAPING_DELAY,
                DEFAULT_SCRAPING_DELAY_SECS,
                0,
                3600,
            )),
            max_retries: r.int(ENV_MAX_RETRIES, DEFAULT_MAX_RETRIES, 0, 20),
            timeout: Duration::from_secs(r.int(ENV_TIMEOUT_SECONDS, DEFAULT_TIMEOUT_SECS, 1, 3600)),
            default_time_filter: r.token(ENV_DEFAULT_TIME_FILTER, TimeFilter::default()),
            default_sort_by: r.token(ENV_DEFAULT_SORT_BY, SortBy::default()),
            ai_provider: r.token(ENV_AI_PROVIDER, AiProvider::default()),
            enable_content_analysis: r.bool(
                ENV_ENABLE_CONTENT_ANALYSIS,
                DEFAULT_ENABLE_CONTENT_ANALYSIS,
            ),
            enable_trend_prediction: r.bool(
                ENV_ENABLE_TREND_PREDICTION,
                DEFAULT_ENABLE_TREND_PREDICTION,
            ),
            theme: r.token(ENV_THEME, Theme::default()),
            posts_per_row: r.int(ENV_POSTS_PER_ROW, DEFAULT_POSTS_PER_ROW, 1, MAX_POSTS_PER_ROW),
            enable_infinite_scroll: r.bool(
                ENV_ENABLE_INFINITE_SCROLL,
                DEFAULT_ENABLE_INFINITE_SCROLL,
            ),
        };

        (config, r.errors)
    }

    /// Clamp a requested result count into `1..=max_posts_per_request`
    pub fn clamp_limit(&self, requested: usize) -> usize {
        requested.clamp(1, self.max_posts_per_request)
    }
}
