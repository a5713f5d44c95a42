//! AI content analysis
//!
//! Asks the configured LLM to classify a post and score it. Any failure
//! (no client, request error, unparsable reply) yields the neutral fallback
//! analysis instead of an error.

use futures_util::stream::{self, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::models::config::AppConfig;
use crate::models::errors::{AppError, AppResult};
use crate::models::types::{ContentAnalysis, Post};
use crate::providers::LlmClient;
use crate::utils::telemetry::TelemetryCollector;

/// Reply fields as the model sends them; scores may be numbers or strings
#[derive(Debug, Deserialize)]
struct RawAnalysis {
    category: Option<String>,
    sentiment: Option<String>,
    engagement_prediction: Option<String>,
    content_quality: Option<serde_json::Value>,
    trending_potential: Option<serde_json::Value>,
}

fn score(value: Option<&serde_json::Value>) -> Option<u8> {
    let raw = match value? {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => s.trim().trim_end_matches('%').parse::<f64>().ok()?,
        _ => return None,
    };
    Some(raw.round().clamp(0.0, 100.0) as u8)
}

fn text_or(value: Option<String>, default: String) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
}

/// JSON object inside a reply, without Markdown fences or surrounding prose
pub fn extract_json(reply: &str) -> &str {
    let mut text = reply.trim();
    if let Some(rest) = text.strip_prefix("```") {
        // drop the info string ("json") on the opening fence
        text = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
        text = text.trim_end().trim_end_matches("```").trim();
    }
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end > start => &text[start..=end],
        _ => text,
    }
}

/// Parse a model reply. Missing text fields take the fallback's values;
/// scores are clamped to 0-100.
pub fn parse_reply(reply: &str, include_trend: bool) -> AppResult<ContentAnalysis> {
    let raw: RawAnalysis = serde_json::from_str(extract_json(reply))?;
    let fallback = ContentAnalysis::fallback();

    Ok(ContentAnalysis {
        category: text_or(raw.category, fallback.category),
        sentiment: text_or(raw.sentiment, fallback.sentiment),
        engagement_prediction: text_or(raw.engagement_prediction, fallback.engagement_prediction),
        content_quality: score(raw.content_quality.as_ref()).unwrap_or(fallback.content_quality),
        trending_potential: if include_trend {
            score(raw.trending_potential.as_ref()).or(fallback.trending_potential)
        } else {
            None
        },
    })
}

/// Prompt sent to the model
pub fn build_prompt(caption: &str, hashtags: &[String], include_trend: bool) -> String {
    let trend_line = if include_trend {
        ",\n  \"trending_potential\": <score 0-100>"
    } else {
        ""
    };
    format!(
        "Analyze this Instagram post:\n\
         Caption: {}\n\
         Hashtags: {}\n\
         \n\
         Provide analysis in JSON format:\n\
         {{\n  \"category\": \"Tech/UI-UX/Product Design/AI/Other\",\n  \
         \"sentiment\": \"Positive/Neutral/Negative\",\n  \
         \"engagement_prediction\": \"High/Medium/Low\",\n  \
         \"content_quality\": <score 0-100>{}\n}}\n\
         Reply with the JSON object only.",
        caption,
        hashtags.join(", "),
        trend_line
    )
}

pub struct ContentAnalyzer {
    llm: Option<LlmClient>,
    enabled: bool,
    include_trend: bool,
    telemetry: Arc<TelemetryCollector>,
}

impl ContentAnalyzer {
    pub fn new(config: &AppConfig, llm: Option<LlmClient>, telemetry: Arc<TelemetryCollector>) -> Self {
        Self {
            llm,
            enabled: config.enable_content_analysis,
            include_trend: config.enable_trend_prediction,
            telemetry,
        }
    }

    /// Whether a model is configured (otherwise every answer is the fallback)
    pub fn ai_available(&self) -> bool {
        self.llm.is_some()
    }

    pub fn provider_name(&self) -> Option<&'static str> {
        self.llm.as_ref().map(LlmClient::name)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn fallback(&self) -> ContentAnalysis {
        let mut analysis = ContentAnalysis::fallback();
        if !self.include_trend {
            analysis.trending_potential = None;
        }
        analysis
    }

    /// Analyze one caption. Errors only when analysis is switched off.
    pub async fn analyze(&self, caption: &str, hashtags: &[String]) -> AppResult<ContentAnalysis> {
        if !self.enabled {
            return Err(AppError::feature_disabled("content analysis"));
        }

        let Some(llm) = &self.llm else {
            debug!("🤖 No AI provider configured - using fallback analysis");
            self.telemetry.record_ai_analysis(true);
            return Ok(self.fallback());
        };

        let prompt = build_prompt(caption, hashtags, self.include_trend);
        let parsed = match llm.generate(&prompt).await {
            Ok(reply) => parse_reply(&reply, self.include_trend),
            Err(e) => Err(AppError::ai_error(e.to_string())),
        };

        match parsed {
            Ok(analysis) => {
                self.telemetry.record_ai_analysis(false);
                Ok(analysis)
            }
            Err(e) => {
                warn!("⚠️ AI analysis failed ({}): {}", llm.name(), e);
                self.telemetry.record_ai_analysis(true);
                Ok(self.fallback())
            }
        }
    }

    /// Analyze several posts with at most `concurrency` requests in flight.
    /// Results keep the input order.
    pub async fn analyze_many(
        &self,
        posts: &[Post],
        concurrency: usize,
    ) -> AppResult<Vec<(String, ContentAnalysis)>> {
        if !self.enabled {
            return Err(AppError::feature_disabled("content analysis"));
        }

        let mut results: Vec<(usize, String, ContentAnalysis)> = stream::iter(posts.iter().enumerate())
            .map(|(idx, post)| async move {
                let analysis = self.analyze(&post.caption, &post.hashtags).await;
                analysis.map(|a| (idx, post.id.clone(), a))
            })
            .buffer_unordered(concurrency.max(1))
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect::<AppResult<Vec<_>>>()?;

        results.sort_by_key(|(idx, _, _)| *idx);
        Ok(results.into_iter().map(|(_, id, a)| (id, a)).collect())
    }
}
