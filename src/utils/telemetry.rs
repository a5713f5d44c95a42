//! Telemetry Module
//!
//! Anonymous usage statistics for the dashboard backend:
//! - searches by data source (live / demo / cache)
//! - scrape failures that forced a demo fallback
//! - AI analyses and how often they fell back
//!
//! No hashtags, captions or keys are recorded.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::models::types::PostSource;
use crate::utils::constants::TELEMETRY_DIR;

/// Aggregated statistics for reporting
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TelemetryStats {
    pub total_searches: u64,
    /// live / demo / cache -> count
    pub searches_by_source: HashMap<String, u64>,
    pub scrape_failures: u64,
    pub posts_served: u64,
    pub ai_analyses: u64,
    pub ai_fallbacks: u64,
    /// Average search latency (ms)
    pub avg_latency_ms: f64,
    pub period_start: u64,
    pub period_end: u64,
}

impl TelemetryStats {
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Plain-text summary for the CLI
    pub fn summary(&self) -> String {
        let count = |source: PostSource| {
            self.searches_by_source
                .get(source.as_str())
                .copied()
                .unwrap_or(0)
        };
        format!(
            "📊 Searches: {} (live {}, demo {}, cache {})\n\
             ⚠️ Scrape failures: {}\n\
             📰 Posts served: {}\n\
             🤖 AI analyses: {} ({} fallback)\n\
             ⚡ Avg search latency: {:.1}ms",
            self.total_searches,
            count(PostSource::Live),
            count(PostSource::Demo),
            count(PostSource::Cache),
            self.scrape_failures,
            self.posts_served,
            self.ai_analyses,
            self.ai_fallbacks,
            self.avg_latency_ms,
        )
    }
}

/// Main telemetry collector
pub struct TelemetryCollector {
    total_searches: AtomicU64,
    scrape_failures: AtomicU64,
    posts_served: AtomicU64,
    ai_analyses: AtomicU64,
    ai_fallbacks: AtomicU64,
    total_latency_ms: AtomicU64,
    source_counts: RwLock<HashMap<PostSource, u64>>,
    session_start: u64,
    export_dir: PathBuf,
}

impl TelemetryCollector {
    pub fn new() -> Self {
        Self::with_export_dir(PathBuf::from(TELEMETRY_DIR))
    }

    pub fn with_export_dir(export_dir: PathBuf) -> Self {
        Self {
            total_searches: AtomicU64::new(0),
            scrape_failures: AtomicU64::new(0),
            posts_served: AtomicU64::new(0),
            ai_analyses: AtomicU64::new(0),
            ai_fallbacks: AtomicU64::new(0),
            total_latency_ms: AtomicU64::new(0),
            source_counts: RwLock::new(HashMap::new()),
            session_start: current_timestamp(),
            export_dir,
        }
    }

    /// Record a completed search
    pub fn record_search(&self, source: PostSource, posts: usize, latency_ms: u64) {
        self.total_searches.fetch_add(1, Ordering::Relaxed);
        self.posts_served.fetch_add(posts as u64, Ordering::Relaxed);
        self.total_latency_ms.fetch_add(latency_ms, Ordering::Relaxed);

        if let Ok(mut counts) = self.source_counts.write() {
            *counts.entry(source).or_insert(0) += 1;
        }
    }

    /// Live scrape failed and demo data was served instead
    pub fn record_scrape_failure(&self) {
        self.scrape_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ai_analysis(&self, fallback: bool) {
        self.ai_analyses.fetch_add(1, Ordering::Relaxed);
        if fallback {
            self.ai_fallbacks.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn get_stats(&self) -> TelemetryStats {
        let total_searches = self.total_searches.load(Ordering::Relaxed);
        let total_latency = self.total_latency_ms.load(Ordering::Relaxed);

        let avg_latency = if total_searches > 0 {
            total_latency as f64 / total_searches as f64
        } else {
            0.0
        };

        let searches_by_source = self
            .source_counts
            .read()
            .map(|counts| {
                counts
                    .iter()
                    .map(|(k, v)| (k.as_str().to_string(), *v))
                    .collect()
            })
            .unwrap_or_default();

        TelemetryStats {
            total_searches,
            searches_by_source,
            scrape_failures: self.scrape_failures.load(Ordering::Relaxed),
            posts_served: self.posts_served.load(Ordering::Relaxed),
            ai_analyses: self.ai_analyses.load(Ordering::Relaxed),
            ai_fallbacks: self.ai_fallbacks.load(Ordering::Relaxed),
            avg_latency_ms: avg_latency,
            period_start: self.session_start,
            period_end: current_timestamp(),
        }
    }

    /// Write current stats to `stats_<unix>.json` in the export directory
    pub fn export_stats_json(&self) -> Result<PathBuf, std::io::Error> {
        fs::create_dir_all(&self.export_dir)?;

        let stats = self.get_stats();
        let filename = format!("stats_{}.json", current_timestamp());
        let path = self.export_dir.join(filename);

        let json = serde_json::to_string_pretty(&stats)?;
        fs::write(&path, json)?;

        Ok(path)
    }

    /// Reset counters (new reporting period)
    pub fn reset(&self) {
        self.total_searches.store(0, Ordering::Relaxed);
        self.scrape_failures.store(0, Ordering::Relaxed);
        self.posts_served.store(0, Ordering::Relaxed);
        self.ai_analyses.store(0, Ordering::Relaxed);
        self.ai_fallbacks.store(0, Ordering::Relaxed);
        self.total_latency_ms.store(0, Ordering::Relaxed);

        if let Ok(mut counts) = self.source_counts.write() {
            counts.clear();
        }
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
