//! Type definitions for the analytics dashboard
//! Posts, filter tokens, AI analysis results and dashboard metrics

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::{AppError, ErrorCode};

/// Lowercase a token and treat spaces, dashes and underscores alike.
/// `"48 Hours"`, `"48-hours"` and `"48_HOURS"` all become `"48_hours"`.
pub fn normalize_token(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

fn token_error(kind: &str, raw: &str, expected: &str) -> AppError {
    AppError::new(
        ErrorCode::ConfigInvalidValue,
        format!("invalid {} {:?} (expected {})", kind, raw, expected),
    )
}

// ============================================
// Post type
// ============================================

/// Instagram content type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    Posts,
    Carousels,
    Reels,
}

impl PostType {
    pub const ALL: [PostType; 3] = [PostType::Posts, PostType::Carousels, PostType::Reels];

    pub fn as_str(&self) -> &'static str {
        match self {
            PostType::Posts => "posts",
            PostType::Carousels => "carousels",
            PostType::Reels => "reels",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            PostType::Posts => "🖼️",
            PostType::Carousels => "🎠",
            PostType::Reels => "🎬",
        }
    }
}

impl fmt::Display for PostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content type filter ("All" or a single type)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PostTypeFilter {
    #[default]
    All,
    Only(PostType),
}

impl PostTypeFilter {
    pub fn matches(&self, post_type: PostType) -> bool {
        match self {
            PostTypeFilter::All => true,
            PostTypeFilter::Only(t) => *t == post_type,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PostTypeFilter::All => "all",
            PostTypeFilter::Only(t) => t.as_str(),
        }
    }
}

impl FromStr for PostTypeFilter {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "all" | "" => Ok(Self::All),
            "posts" | "post" | "image" | "images" => Ok(Self::Only(PostType::Posts)),
            "carousels" | "carousel" | "sidecar" => Ok(Self::Only(PostType::Carousels)),
            "reels" | "reel" | "video" | "videos" => Ok(Self::Only(PostType::Reels)),
            _ => Err(token_error("post type", s, "all|posts|carousels|reels")),
        }
    }
}

impl TryFrom<String> for PostTypeFilter {
    type Error = AppError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PostTypeFilter> for String {
    fn from(value: PostTypeFilter) -> Self {
        value.as_str().to_string()
    }
}

// ============================================
// Time filter
// ============================================

/// How far back to look for posts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TimeFilter {
    Today,
    FortyEightHours,
    FourDays,
    Week,
    #[default]
    Month,
}

impl TimeFilter {
    pub const ALL: [TimeFilter; 5] = [
        TimeFilter::Today,
        TimeFilter::FortyEightHours,
        TimeFilter::FourDays,
        TimeFilter::Week,
        TimeFilter::Month,
    ];

    /// Number of days covered by the filter
    pub fn days(&self) -> i64 {
        match self {
            TimeFilter::Today => 1,
            TimeFilter::FortyEightHours => 2,
            TimeFilter::FourDays => 4,
            TimeFilter::Week => 7,
            TimeFilter::Month => 30,
        }
    }

    /// Oldest timestamp still inside the window
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(self.days())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeFilter::Today => "today",
            TimeFilter::FortyEightHours => "48_hours",
            TimeFilter::FourDays => "4_days",
            TimeFilter::Week => "week",
            TimeFilter::Month => "month",
        }
    }

    /// Human label as shown in the dashboard
    pub fn label(&self) -> &'static str {
        match self {
            TimeFilter::Today => "Today",
            TimeFilter::FortyEightHours => "48 Hours",
            TimeFilter::FourDays => "4 Days",
            TimeFilter::Week => "Week",
            TimeFilter::Month => "Month",
        }
    }
}

impl FromStr for TimeFilter {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "today" | "1d" | "24h" | "24_hours" => Ok(Self::Today),
            "48_hours" | "48h" | "2d" | "2_days" => Ok(Self::FortyEightHours),
            "4_days" | "4d" => Ok(Self::FourDays),
            "week" | "7d" | "7_days" | "1w" => Ok(Self::Week),
            "month" | "30d" | "30_days" => Ok(Self::Month),
            _ => Err(token_error(
                "time filter",
                s,
                "today|48_hours|4_days|week|month",
            )),
        }
    }
}

impl TryFrom<String> for TimeFilter {
    type Error = AppError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeFilter> for String {
    fn from(value: TimeFilter) -> Self {
        value.as_str().to_string()
    }
}

// ============================================
// Sort order
// ============================================

/// Dashboard sort key (always descending)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SortBy {
    #[default]
    Likes,
    Comments,
    Shares,
    Views,
    Recent,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Likes => "likes",
            SortBy::Comments => "comments",
            SortBy::Shares => "shares",
            SortBy::Views => "views",
            SortBy::Recent => "recent",
        }
    }
}

impl FromStr for SortBy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "likes" => Ok(Self::Likes),
            "comments" => Ok(Self::Comments),
            "shares" => Ok(Self::Shares),
            "views" => Ok(Self::Views),
            "recent" | "newest" | "date" => Ok(Self::Recent),
            _ => Err(token_error(
                "sort key",
                s,
                "likes|comments|shares|views|recent",
            )),
        }
    }
}

impl TryFrom<String> for SortBy {
    type Error = AppError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SortBy> for String {
    fn from(value: SortBy) -> Self {
        value.as_str().to_string()
    }
}

// ============================================
// AI provider & theme
// ============================================

/// Which LLM backs content analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AiProvider {
    #[default]
    Gemini,
    OpenAi,
    None,
}

impl AiProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            AiProvider::Gemini => "gemini",
            AiProvider::OpenAi => "openai",
            AiProvider::None => "none",
        }
    }

    /// Secret name required by this provider
    pub fn required_key(&self) -> Option<&'static str> {
        match self {
            AiProvider::Gemini => Some("gemini_api_key"),
            AiProvider::OpenAi => Some("openai_api_key"),
            AiProvider::None => None,
        }
    }
}

impl FromStr for AiProvider {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "openai" | "open_ai" | "gpt" => Ok(Self::OpenAi),
            "none" | "off" | "disabled" => Ok(Self::None),
            _ => Err(token_error("AI provider", s, "gemini|openai|none")),
        }
    }
}

impl TryFrom<String> for AiProvider {
    type Error = AppError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AiProvider> for String {
    fn from(value: AiProvider) -> Self {
        value.as_str().to_string()
    }
}

/// Dashboard colour theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    Auto,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::Auto => "auto",
        }
    }
}

impl FromStr for Theme {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            "auto" | "system" => Ok(Self::Auto),
            _ => Err(token_error("theme", s, "light|dark|auto")),
        }
    }
}

impl TryFrom<String> for Theme {
    type Error = AppError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Theme> for String {
    fn from(value: Theme) -> Self {
        value.as_str().to_string()
    }
}

// ============================================
// Posts
// ============================================

/// A single Instagram post as shown on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    /// Owner username (without '@')
    pub creator: String,
    pub thumbnail: String,
    pub likes: u64,
    pub comments: u64,
    /// Instagram exposes no share count; the video view count stands in
    pub shares: u64,
    pub views: u64,
    pub caption: String,
    pub post_type: PostType,
    pub url: String,
    pub timestamp: DateTime<Utc>,
    pub hashtags: Vec<String>,
}

impl Post {
    /// likes + comments + shares
    pub fn engagement(&self) -> u64 {
        self.likes + self.comments + self.shares
    }
}

/// Where a result set came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostSource {
    /// Fresh Apify scrape
    Live,
    /// Synthetic posts (Apify missing or failed)
    Demo,
    /// Served from the result cache
    Cache,
}

impl PostSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostSource::Live => "live",
            PostSource::Demo => "demo",
            PostSource::Cache => "cache",
        }
    }
}

/// Search parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub time_filter: TimeFilter,
    #[serde(default)]
    pub post_type: PostTypeFilter,
    #[serde(default)]
    pub sort_by: SortBy,
    pub limit: usize,
    /// Bypass the result cache
    #[serde(default)]
    pub refresh: bool,
}

impl SearchQuery {
    /// Cache key: lowercase hashtags (sorted, '#'-prefixed) plus filters
    pub fn cache_key(&self) -> String {
        let mut tags: Vec<String> = self
            .hashtags
            .iter()
            .map(|t| format!("#{}", t.trim().trim_start_matches('#').to_lowercase()))
            .collect();
        tags.sort();
        tags.dedup();
        format!(
            "{}|{}|{}|{}",
            tags.join(","),
            self.time_filter.as_str(),
            self.post_type.as_str(),
            self.limit
        )
    }
}

/// Aggregated numbers for the metric cards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardMetrics {
    pub total_posts: usize,
    pub avg_likes: f64,
    pub avg_engagement: f64,
    pub top_creator: String,
}

/// Result of a search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// Normalized hashtags actually searched
    pub hashtags: Vec<String>,
    pub posts: Vec<Post>,
    pub metrics: Option<DashboardMetrics>,
    pub source: PostSource,
    pub latency_ms: u64,
}

// ============================================
// AI analysis
// ============================================

/// LLM assessment of a post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentAnalysis {
    /// Tech / UI-UX / Product Design / AI / Other
    pub category: String,
    /// Positive / Neutral / Negative
    pub sentiment: String,
    /// High / Medium / Low
    pub engagement_prediction: String,
    /// 0-100
    pub content_quality: u8,
    /// 0-100, absent when trend prediction is disabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trending_potential: Option<u8>,
}

impl ContentAnalysis {
    /// Neutral answer used whenever the AI is unavailable
    pub fn fallback() -> Self {
        Self {
            category: "General".to_string(),
            sentiment: "Positive".to_string(),
            engagement_prediction: "Medium".to_string(),
            content_quality: 75,
            trending_potential: Some(60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_token() {
        assert_eq!(normalize_token(" 48 Hours "), "48_hours");
        assert_eq!(normalize_token("4-Days"), "4_days");
    }

    #[test]
    fn test_time_filter_tokens() {
        assert_eq!("Today".parse::<TimeFilter>().unwrap(), TimeFilter::Today);
        assert_eq!("48 Hours".parse::<TimeFilter>().unwrap(), TimeFilter::FortyEightHours);
        assert_eq!("48h".parse::<TimeFilter>().unwrap(), TimeFilter::FortyEightHours);
        assert_eq!("4_days".parse::<TimeFilter>().unwrap(), TimeFilter::FourDays);
        assert_eq!("WEEK".parse::<TimeFilter>().unwrap(), TimeFilter::Week);
        assert!("year".parse::<TimeFilter>().is_err());
        assert_eq!(TimeFilter::default(), TimeFilter::Month);
    }

    #[test]
    fn test_time_filter_days() {
        let days: Vec<i64> = TimeFilter::ALL.iter().map(|t| t.days()).collect();
        assert_eq!(days, vec![1, 2, 4, 7, 30]);
    }

    #[test]
    fn test_post_type_filter() {
        assert_eq!("All".parse::<PostTypeFilter>().unwrap(), PostTypeFilter::All);
        assert_eq!(
            "Reels".parse::<PostTypeFilter>().unwrap(),
            PostTypeFilter::Only(PostType::Reels)
        );
        assert!(PostTypeFilter::All.matches(PostType::Carousels));
        assert!(!PostTypeFilter::Only(PostType::Posts).matches(PostType::Reels));
    }

    #[test]
    fn test_enum_tokens() {
        assert_eq!("Recent".parse::<SortBy>().unwrap(), SortBy::Recent);
        assert_eq!("OpenAI".parse::<AiProvider>().unwrap(), AiProvider::OpenAi);
        assert_eq!("dark".parse::<Theme>().unwrap(), Theme::Dark);
        assert!("neon".parse::<Theme>().is_err());
    }

    #[test]
    fn test_serde_tokens() {
        let json = serde_json::to_string(&TimeFilter::FortyEightHours).unwrap();
        assert_eq!(json, "\"48_hours\"");
        let parsed: TimeFilter = serde_json::from_str("\"48 Hours\"").unwrap();
        assert_eq!(parsed, TimeFilter::FortyEightHours);
        let bad: Result<SortBy, _> = serde_json::from_str("\"popularity\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_cache_key_normalization() {
        let a = SearchQuery {
            hashtags: vec!["#UI".to_string(), "design".to_string()],
            time_filter: TimeFilter::Week,
            post_type: PostTypeFilter::All,
            sort_by: SortBy::Likes,
            limit: 20,
            refresh: false,
        };
        let mut b = a.clone();
        b.hashtags = vec!["#design".to_string(), "#ui".to_string()];
        b.sort_by = SortBy::Views;
        assert_eq!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn test_fallback_analysis() {
        let fb = ContentAnalysis::fallback();
        assert_eq!(fb.category, "General");
        assert_eq!(fb.content_quality, 75);
        assert_eq!(fb.trending_potential, Some(60));
    }
}
