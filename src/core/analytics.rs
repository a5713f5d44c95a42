//! Post analytics: filtering, sorting and dashboard metrics

use chrono::{DateTime, Utc};
use std::cmp::Reverse;

use crate::models::types::{DashboardMetrics, Post, PostTypeFilter, SortBy, TimeFilter};
use crate::utils::constants::CAPTION_PREVIEW_CHARS;

/// Keep posts of the requested content type
pub fn filter_by_type(posts: Vec<Post>, filter: PostTypeFilter) -> Vec<Post> {
    posts
        .into_iter()
        .filter(|p| filter.matches(p.post_type))
        .collect()
}

/// Keep posts newer than the time filter's cutoff
pub fn filter_by_time(posts: Vec<Post>, filter: TimeFilter, now: DateTime<Utc>) -> Vec<Post> {
    let cutoff = filter.cutoff(now);
    posts.into_iter().filter(|p| p.timestamp >= cutoff).collect()
}

/// Sort descending by the chosen metric. Stable: ties keep their order.
pub fn sort_posts(posts: &mut [Post], sort_by: SortBy) {
    match sort_by {
        SortBy::Likes => posts.sort_by_key(|p| Reverse(p.likes)),
        SortBy::Comments => posts.sort_by_key(|p| Reverse(p.comments)),
        SortBy::Shares => posts.sort_by_key(|p| Reverse(p.shares)),
        SortBy::Views => posts.sort_by_key(|p| Reverse(p.views)),
        SortBy::Recent => posts.sort_by_key(|p| Reverse(p.timestamp)),
    }
}

/// Metric cards. `None` for an empty result set.
pub fn compute_metrics(posts: &[Post]) -> Option<DashboardMetrics> {
    let first = posts.first()?;
    let total = posts.len();

    let likes: u64 = posts.iter().map(|p| p.likes).sum();
    let engagement: u64 = posts.iter().map(Post::engagement).sum();

    // First post with the highest like count wins ties
    let top = posts
        .iter()
        .fold(first, |best, p| if p.likes > best.likes { p } else { best });

    Some(DashboardMetrics {
        total_posts: total,
        avg_likes: likes as f64 / total as f64,
        avg_engagement: engagement as f64 / total as f64,
        top_creator: top.creator.clone(),
    })
}

/// First 100 characters of a caption, with "..." when cut
pub fn caption_preview(caption: &str) -> String {
    if caption.chars().count() > CAPTION_PREVIEW_CHARS {
        let head: String = caption.chars().take(CAPTION_PREVIEW_CHARS).collect();
        format!("{}...", head)
    } else {
        caption.to_string()
    }
}

/// Split posts into grid rows of `per_row` cards
pub fn rows(posts: &[Post], per_row: usize) -> Vec<&[Post]> {
    posts.chunks(per_row.max(1)).collect()
}

/// Format a count with thousands separators (12,345)
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
