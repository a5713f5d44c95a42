//! Apify API Client - Instagram hashtag scraping
//!
//! Runs the `apify/instagram-hashtag-scraper` actor synchronously and reads
//! its dataset in the same call (`run-sync-get-dataset-items`).
//!
//! API: https://docs.apify.com/api/v2

use chrono::{DateTime, Utc};
use eyre::{eyre, Result};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::http::{build_client, check_status, with_retry, RetryPolicy, StatusError};
use crate::core::hashtags::{bare_hashtag, extract_hashtags};
use crate::models::types::{Post, PostType};
use crate::utils::constants::{APIFY_BASE_URL, APIFY_HASHTAG_ACTOR, INSTAGRAM_POST_URL};

/// One dataset item produced by the hashtag scraper
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApifyItem {
    pub id: Option<String>,
    pub short_code: Option<String>,
    pub owner_username: Option<String>,
    pub display_url: Option<String>,
    pub caption: Option<String>,
    /// -1 when the owner hides like counts
    pub likes_count: Option<i64>,
    pub comments_count: Option<i64>,
    pub video_view_count: Option<i64>,
    pub video_url: Option<String>,
    #[serde(default)]
    pub sidecar_medias: Option<Vec<serde_json::Value>>,
    pub timestamp: Option<String>,
}

fn non_negative(value: Option<i64>) -> Option<u64> {
    value.map(|v| v.max(0) as u64)
}

impl ApifyItem {
    /// Reels have a video URL, carousels have sidecar media
    pub fn post_type(&self) -> PostType {
        if self.video_url.as_deref().is_some_and(|u| !u.is_empty()) {
            PostType::Reels
        } else if self.sidecar_medias.as_ref().is_some_and(|m| !m.is_empty()) {
            PostType::Carousels
        } else {
            PostType::Posts
        }
    }

    /// Map into a dashboard post; missing timestamps become `now`
    pub fn into_post(self, now: DateTime<Utc>) -> Post {
        let post_type = self.post_type();
        let likes = non_negative(self.likes_count).unwrap_or(0);
        let video_views = non_negative(self.video_view_count);
        let caption = self.caption.unwrap_or_default();
        let timestamp = self
            .timestamp
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|ts| ts.with_timezone(&Utc))
            .unwrap_or(now);

        Post {
            id: self.id.unwrap_or_default(),
            creator: self
                .owner_username
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| "unknown".to_string()),
            thumbnail: self.display_url.unwrap_or_default(),
            likes,
            comments: non_negative(self.comments_count).unwrap_or(0),
            shares: video_views.unwrap_or(0),
            views: video_views.unwrap_or(likes.saturating_mul(10)),
            hashtags: extract_hashtags(&caption),
            caption,
            post_type,
            url: format!(
                "{}{}",
                INSTAGRAM_POST_URL,
                self.short_code.unwrap_or_default()
            ),
            timestamp,
        }
    }
}

/// Apify REST client
pub struct ApifyClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
    policy: RetryPolicy,
}

impl ApifyClient {
    pub fn new(token: impl Into<String>, timeout: std::time::Duration, policy: RetryPolicy) -> Result<Self> {
        let token = token.into();
        if token.is_empty() {
            return Err(eyre!("Apify token is empty"));
        }
        Ok(Self {
            client: build_client(timeout)?,
            base_url: APIFY_BASE_URL.to_string(),
            token,
            policy,
        })
    }

    /// Point the client at another host (self-hosted proxy, tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Actor input document
    pub fn build_input(
        hashtags: &[String],
        limit: usize,
        since: DateTime<Utc>,
        proxy_url: Option<&str>,
    ) -> serde_json::Value {
        let tags: Vec<String> = hashtags
            .iter()
            .map(|t| bare_hashtag(t))
            .filter(|t| !t.is_empty())
            .collect();

        let mut input = json!({
            "hashtags": tags,
            "resultsLimit": limit,
            "searchType": "hashtag",
            "addParentData": false,
            "dateFrom": since.to_rfc3339(),
        });

        if let Some(proxy) = proxy_url.filter(|p| !p.is_empty()) {
            input["proxy"] = json!({
                "useApifyProxy": false,
                "proxyUrls": [proxy],
            });
        }
        input
    }

    /// Scrape posts for the hashtags, newer than `since`
    pub async fn scrape_hashtags(
        &self,
        hashtags: &[String],
        limit: usize,
        since: DateTime<Utc>,
        proxy_url: Option<&str>,
    ) -> Result<Vec<ApifyItem>> {
        let url = format!(
            "{}/acts/{}/run-sync-get-dataset-items",
            self.base_url, APIFY_HASHTAG_ACTOR
        );
        let input = Self::build_input(hashtags, limit, since, proxy_url);

        info!(
            "🔍 Apify: scraping {} hashtag(s), limit {}",
            hashtags.len(),
            limit
        );

        let items: Vec<ApifyItem> = with_retry(&self.policy, "Apify scrape", || async {
            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.token)
                .json(&input)
                .send()
                .await
                .map_err(|e| eyre!("Apify request failed: {}", e))?;
            let response = check_status(response).await?;
            response
                .json::<Vec<ApifyItem>>()
                .await
                .map_err(|e| eyre!("Failed to parse Apify dataset: {}", e))
        })
        .await?;

        info!("📊 Apify: received {} items", items.len());
        Ok(items)
    }

    /// `true` when the token is accepted, `false` when rejected
    pub async fn verify_token(&self) -> Result<bool> {
        let url = format!("{}/users/me", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| eyre!("Apify request failed: {}", e))?;

        match check_status(response).await {
            Ok(_) => Ok(true),
            Err(e) => match e.downcast_ref::<StatusError>() {
                Some(status) if status.is_auth_failure() => Ok(false),
                _ => Err(e),
            },
        }
    }
}
