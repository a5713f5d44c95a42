//! Hashtag helpers: caption extraction and category presets

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::utils::constants::{HASHTAG_PRESETS, MAX_CAPTION_HASHTAGS};

lazy_static! {
    static ref HASHTAG_RE: Regex = Regex::new(r"#\w+").expect("static regex");
}

/// Hashtags found in a caption, in order, at most five
pub fn extract_hashtags(caption: &str) -> Vec<String> {
    HASHTAG_RE
        .find_iter(caption)
        .take(MAX_CAPTION_HASHTAGS)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// `"Design"` / `"#Design "` -> `"#design"`
pub fn normalize_hashtag(raw: &str) -> String {
    format!("#{}", raw.trim().trim_start_matches('#').to_lowercase())
}

/// Hashtag without the leading '#', as the scraper expects it
pub fn bare_hashtag(raw: &str) -> String {
    raw.trim().trim_start_matches('#').to_lowercase()
}

/// One preset category
#[derive(Debug, Clone, Serialize)]
pub struct HashtagCategory {
    pub name: &'static str,
    pub hashtags: Vec<&'static str>,
}

/// Preset categories in dashboard order
pub fn hashtag_presets() -> Vec<HashtagCategory> {
    HASHTAG_PRESETS
        .iter()
        .map(|&(name, tags)| HashtagCategory {
            name,
            hashtags: tags.to_vec(),
        })
        .collect()
}

/// Sorted, deduplicated union of all presets
pub fn all_hashtags() -> Vec<&'static str> {
    HASHTAG_PRESETS
        .iter()
        .flat_map(|(_, tags)| tags.iter().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_in_order() {
        let tags = extract_hashtags("Loving this #ui and #UX_design work! #figma");
        assert_eq!(tags, vec!["#ui", "#UX_design", "#figma"]);
    }

    #[test]
    fn test_extract_caps_at_five() {
        let tags = extract_hashtags("#a #b #c #d #e #f #g");
        assert_eq!(tags.len(), 5);
        assert_eq!(tags.last().map(String::as_str), Some("#e"));
    }

    #[test]
    fn test_extract_none() {
        assert!(extract_hashtags("no tags here # alone").is_empty());
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_hashtag(" Design"), "#design");
        assert_eq!(normalize_hashtag("#AI"), "#ai");
        assert_eq!(bare_hashtag("#Tech"), "tech");
    }

    #[test]
    fn test_all_hashtags_sorted_unique() {
        let all = all_hashtags();
        let mut sorted = all.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(all, sorted);
        // "#design" appears in two presets but only once here
        assert_eq!(all.iter().filter(|t| **t == "#design").count(), 1);
        assert!(all.contains(&"#generativeai"));
    }

    #[test]
    fn test_presets() {
        let presets = hashtag_presets();
        let names: Vec<&str> = presets.iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Tech", "UI/UX Design", "Product Design", "AI"]);
        assert_eq!(presets[0].hashtags.len(), 12);
    }
}
