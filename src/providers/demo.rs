//! Demo data source
//!
//! Deterministic synthetic posts used when Apify is not configured or a live
//! scrape fails, so the dashboard always has something to show.

use chrono::{DateTime, Duration, Utc};

use crate::models::types::{Post, PostType, PostTypeFilter, TimeFilter};

/// Generate `limit` demo posts, then drop the ones outside the time window
pub fn demo_posts(
    hashtags: &[String],
    time_filter: TimeFilter,
    post_type: PostTypeFilter,
    limit: usize,
    now: DateTime<Utc>,
) -> Vec<Post> {
    let topic = hashtags.first().map(String::as_str).unwrap_or("design");
    let tags: Vec<String> = if hashtags.is_empty() {
        vec!["#design".to_string()]
    } else {
        hashtags.iter().take(3).cloned().collect()
    };
    let cutoff = time_filter.cutoff(now);

    (0..limit)
        .map(|i| {
            let n = i as u64;
            Post {
                id: format!("post_{}", i),
                creator: format!("designer_{}", i % 10),
                thumbnail: format!("https://picsum.photos/300/200?random={}", i),
                likes: 1500 + n * 100,
                comments: 45 + n * 5,
                shares: 20 + n * 2,
                views: 5000 + n * 200,
                caption: format!(
                    "Amazing {} inspiration! Check out this innovative approach to modern design solutions.",
                    topic
                ),
                post_type: match post_type {
                    PostTypeFilter::Only(t) => t,
                    PostTypeFilter::All => PostType::ALL[i % 3],
                },
                url: format!("https://instagram.com/p/mock_{}", i),
                timestamp: now - Duration::days((i % 30) as i64),
                hashtags: tags.clone(),
            }
        })
        .filter(|p| p.timestamp >= cutoff)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_keeps_everything() {
        let now = Utc::now();
        let posts = demo_posts(&["#ui".to_string()], TimeFilter::Month, PostTypeFilter::All, 40, now);
        assert_eq!(posts.len(), 40);
        assert_eq!(posts[0].creator, "designer_0");
        assert_eq!(posts[11].creator, "designer_1");
        assert_eq!(posts[3].likes, 1800);
        assert_eq!(posts[3].comments, 60);
        assert_eq!(posts[3].shares, 26);
        assert_eq!(posts[3].views, 5600);
        assert!(posts[0].caption.starts_with("Amazing #ui inspiration!"));
    }

    #[test]
    fn test_type_cycle_and_forced_type() {
        let now = Utc::now();
        let mixed = demo_posts(&[], TimeFilter::Month, PostTypeFilter::All, 6, now);
        let types: Vec<PostType> = mixed.iter().map(|p| p.post_type).collect();
        assert_eq!(
            types,
            vec![
                PostType::Posts,
                PostType::Carousels,
                PostType::Reels,
                PostType::Posts,
                PostType::Carousels,
                PostType::Reels
            ]
        );
        assert_eq!(mixed[0].hashtags, vec!["#design"]);
        assert!(mixed[0].caption.contains("Amazing design inspiration"));

        let reels = demo_posts(&[], TimeFilter::Month, PostTypeFilter::Only(PostType::Reels), 4, now);
        assert!(reels.iter().all(|p| p.post_type == PostType::Reels));
    }

    #[test]
    fn test_time_window() {
        let now = Utc::now();
        // Ages are i % 30 days: "Week" keeps ages 0..=7
        let week = demo_posts(&[], TimeFilter::Week, PostTypeFilter::All, 30, now);
        assert_eq!(week.len(), 8);
        let today = demo_posts(&[], TimeFilter::Today, PostTypeFilter::All, 30, now);
        assert_eq!(today.len(), 2);
    }

    #[test]
    fn test_hashtags_limited_to_three() {
        let tags: Vec<String> = ["#a", "#b", "#c", "#d"].iter().map(|s| s.to_string()).collect();
        let posts = demo_posts(&tags, TimeFilter::Month, PostTypeFilter::All, 1, Utc::now());
        assert_eq!(posts[0].hashtags, vec!["#a", "#b", "#c"]);
    }

    #[test]
    fn test_zero_limit() {
        assert!(demo_posts(&[], TimeFilter::Month, PostTypeFilter::All, 0, Utc::now()).is_empty());
    }
}
