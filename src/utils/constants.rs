//! Constants Module - Single Source of Truth
//!
//! Endpoint URLs, environment variable names, defaults and hashtag presets.
//! Other modules reference these instead of repeating literals.

// ============================================
// APPLICATION CONSTANTS
// ============================================

/// Application name
pub const APP_NAME: &str = "Instagram Analytics Dashboard";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent for HTTP requests
pub const USER_AGENT: &str = concat!("insta-analytics/", env!("CARGO_PKG_VERSION"));

// ============================================
// ENVIRONMENT VARIABLE NAMES
// ============================================

// API keys
pub const ENV_APIFY_TOKEN: &str = "APIFY_TOKEN";
pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_INSTAGRAM_SESSION_ID: &str = "INSTAGRAM_SESSION_ID";
pub const ENV_PROXY_URL: &str = "PROXY_URL";

// App configuration
pub const ENV_DEBUG_MODE: &str = "DEBUG_MODE";
pub const ENV_CACHE_ENABLED: &str = "CACHE_ENABLED";
pub const ENV_MAX_POSTS_PER_REQUEST: &str = "MAX_POSTS_PER_REQUEST";

// Scraping settings
pub const ENV_SCRAPING_DELAY: &str = "SCRAPING_DELAY";
pub const ENV_MAX_RETRIES: &str = "MAX_RETRIES";
pub const ENV_TIMEOUT_SECONDS: &str = "TIMEOUT_SECONDS";
pub const ENV_DEFAULT_TIME_FILTER: &str = "DEFAULT_TIME_FILTER";
pub const ENV_DEFAULT_SORT_BY: &str = "DEFAULT_SORT_BY";

// AI settings
pub const ENV_AI_PROVIDER: &str = "AI_PROVIDER";
pub const ENV_ENABLE_CONTENT_ANALYSIS: &str = "ENABLE_CONTENT_ANALYSIS";
pub const ENV_ENABLE_TREND_PREDICTION: &str = "ENABLE_TREND_PREDICTION";

// UI settings
pub const ENV_THEME: &str = "THEME";
pub const ENV_POSTS_PER_ROW: &str = "POSTS_PER_ROW";
pub const ENV_ENABLE_INFINITE_SCROLL: &str = "ENABLE_INFINITE_SCROLL";

/// Secret names in their canonical lowercase form
pub const SECRET_KEYS: [&str; 5] = [
    "apify_token",
    "gemini_api_key",
    "instagram_session_id",
    "proxy_url",
    "openai_api_key",
];

// ============================================
// DEFAULTS
// ============================================

pub const DEFAULT_DEBUG_MODE: bool = false;
pub const DEFAULT_CACHE_ENABLED: bool = true;
pub const DEFAULT_MAX_POSTS_PER_REQUEST: usize = 100;
pub const DEFAULT_SCRAPING_DELAY_SECS: u64 = 2;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_ENABLE_CONTENT_ANALYSIS: bool = true;
pub const DEFAULT_ENABLE_TREND_PREDICTION: bool = true;
pub const DEFAULT_POSTS_PER_ROW: usize = 3;
pub const DEFAULT_ENABLE_INFINITE_SCROLL: bool = false;

/// Upper bound accepted for MAX_POSTS_PER_REQUEST
pub const MAX_POSTS_PER_REQUEST_LIMIT: usize = 1000;

/// Upper bound accepted for POSTS_PER_ROW
pub const MAX_POSTS_PER_ROW: usize = 6;

/// Default number of posts loaded per search
pub const DEFAULT_SEARCH_LIMIT: usize = 50;

/// Hashtags pre-selected when none are given
pub const DEFAULT_HASHTAGS: [&str; 3] = ["#ui", "#design", "#tech"];

/// Default result cache TTL (seconds)
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Default concurrency for batch AI analysis
pub const DEFAULT_ANALYSIS_CONCURRENCY: usize = 4;

/// Max hashtags extracted from a caption
pub const MAX_CAPTION_HASHTAGS: usize = 5;

/// Caption characters shown on a post card
pub const CAPTION_PREVIEW_CHARS: usize = 100;

// ============================================
// FILE LOCATIONS
// ============================================

pub const ENV_FILE: &str = ".env";
pub const SECRETS_TOML_FILE: &str = "secrets.toml";
pub const CONFIG_YAML_FILE: &str = "config.yaml";
pub const BOOKMARKS_FILE: &str = "bookmarks.json";
pub const TELEMETRY_DIR: &str = "./telemetry";

// ============================================
// EXTERNAL ENDPOINTS
// ============================================

/// Apify REST API base
pub const APIFY_BASE_URL: &str = "https://api.apify.com/v2";

/// Apify actor id (slash replaced by tilde in URLs)
pub const APIFY_HASHTAG_ACTOR: &str = "apify~instagram-hashtag-scraper";

/// Gemini REST API base
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini model used for content analysis
pub const GEMINI_MODEL: &str = "gemini-pro";

/// OpenAI REST API base
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI model used for content analysis
pub const OPENAI_MODEL: &str = "gpt-4o-mini";

/// Public post URL prefix
pub const INSTAGRAM_POST_URL: &str = "https://instagram.com/p/";

// ============================================
// HASHTAG PRESETS
// ============================================

/// Popular hashtags per dashboard category
pub const HASHTAG_PRESETS: [(&str, &[&str]); 4] = [
    (
        "Tech",
        &[
            "#tech",
            "#technology",
            "#ai",
            "#machinelearning",
            "#coding",
            "#programming",
            "#developer",
            "#software",
            "#innovation",
            "#startup",
            "#techtrends",
            "#digitaltransformation",
        ],
    ),
    (
        "UI/UX Design",
        &[
            "#ux",
            "#ui",
            "#design",
            "#userexperience",
            "#webdesign",
            "#appdesign",
            "#designthinking",
            "#prototype",
            "#wireframe",
            "#figma",
            "#sketch",
            "#adobe",
        ],
    ),
    (
        "Product Design",
        &[
            "#productdesign",
            "#industrialdesign",
            "#design",
            "#innovation",
            "#designprocess",
            "#prototype",
            "#usercentered",
            "#designstrategy",
        ],
    ),
    (
        "AI",
        &[
            "#ai",
            "#artificialintelligence",
            "#machinelearning",
            "#deeplearning",
            "#chatgpt",
            "#automation",
            "#neural",
            "#algorithm",
            "#aiart",
            "#generativeai",
        ],
    ),
];

/// Mask a secret for display: first 4 characters then `****`
pub fn mask_secret(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    let prefix: String = value.chars().take(4).collect();
    format!("{}****", prefix)
}

/// Hide the `user:password@` part of a proxy URL
pub fn mask_proxy_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***@{}", &url[..scheme_end], &url[at + 1..])
        }
        _ => url.to_string(),
    }
}
