//! Bookmarked posts
//!
//! Ordered set of post ids, optionally persisted to a JSON file.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, info, warn};

use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::models::types::Post;

pub struct BookmarkStore {
    ids: RwLock<Vec<String>>,
    path: Option<PathBuf>,
}

impl Default for BookmarkStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl BookmarkStore {
    pub fn in_memory() -> Self {
        Self {
            ids: RwLock::new(Vec::new()),
            path: None,
        }
    }

    /// Load from `path`; a missing file is an empty store
    pub fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        let ids = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str::<Vec<String>>(&raw).map_err(|e| {
                    AppError::with_source(
                        ErrorCode::ConfigSecretsFile,
                        format!("Invalid bookmarks file {}", path.display()),
                        e,
                    )
                })?
            }
        } else {
            Vec::new()
        };

        info!("🔖 Loaded {} bookmark(s) from {}", ids.len(), path.display());
        Ok(Self {
            ids: RwLock::new(ids),
            path: Some(path),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Add if absent (returns `true`), remove if present (returns `false`).
    /// The file is rewritten while the lock is held, so writes never interleave.
    pub fn toggle(&self, id: &str) -> AppResult<bool> {
        let mut ids = self
            .ids
            .write()
            .map_err(|_| AppError::internal("bookmark lock poisoned"))?;
        let added = match ids.iter().position(|b| b == id) {
            Some(pos) => {
                ids.remove(pos);
                false
            }
            None => {
                ids.push(id.to_string());
                true
            }
        };
        debug!("🔖 {} {}", if added { "Bookmarked" } else { "Unbookmarked" }, id);

        self.persist(&ids)?;
        Ok(added)
    }

    pub fn ids(&self) -> Vec<String> {
        self.ids.read().map(|ids| ids.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.ids.read().map(|ids| ids.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids
            .read()
            .map(|ids| ids.iter().any(|b| b == id))
            .unwrap_or(false)
    }

    /// Posts from `posts` that are bookmarked, in post order
    pub fn bookmarked_posts(&self, posts: &[Post]) -> Vec<Post> {
        posts
            .iter()
            .filter(|p| self.contains(&p.id))
            .cloned()
            .collect()
    }

    /// Write to a sibling temp file, then rename over the target
    fn persist(&self, ids: &[String]) -> AppResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(ids)?;

        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, json)
            .and_then(|_| fs::rename(&tmp, path))
            .map_err(|e| {
                warn!("⚠️ Failed to write bookmarks to {}: {}", path.display(), e);
                let _ = fs::remove_file(&tmp);
                AppError::from(e)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::types::{PostTypeFilter, TimeFilter};
    use crate::providers::demo::demo_posts;
    use chrono::Utc;

    #[test]
    fn test_toggle_is_involution() {
        let store = BookmarkStore::in_memory();
        assert!(store.toggle("post_1").unwrap());
        assert!(store.contains("post_1"));
        assert!(!store.toggle("post_1").unwrap());
        assert!(!store.contains("post_1"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_insertion_order() {
        let store = BookmarkStore::in_memory();
        store.toggle("b").unwrap();
        store.toggle("a").unwrap();
        store.toggle("c").unwrap();
        store.toggle("a").unwrap();
        assert_eq!(store.ids(), vec!["b", "c"]);
    }

    #[test]
    fn test_bookmarked_posts_follow_post_order() {
        let posts = demo_posts(&[], TimeFilter::Month, PostTypeFilter::All, 5, Utc::now());
        let store = BookmarkStore::in_memory();
        store.toggle("post_3").unwrap();
        store.toggle("post_1").unwrap();
        let ids: Vec<String> = store
            .bookmarked_posts(&posts)
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["post_1", "post_3"]);
    }

    #[test]
    fn test_persistence_roundtrip() {
        let dir = std::env::temp_dir().join(format!("insta_bookmarks_{}", std::process::id()));
        let path = dir.join("bookmarks.json");
        let _ = fs::remove_dir_all(&dir);

        let store = BookmarkStore::open(&path).unwrap();
        assert!(store.is_empty());
        store.toggle("post_7").unwrap();
        store.toggle("post_2").unwrap();

        let reopened = BookmarkStore::open(&path).unwrap();
        assert_eq!(reopened.ids(), vec!["post_7", "post_2"]);

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_concurrent_toggles_keep_file_valid() {
        let dir = std::env::temp_dir().join(format!("insta_bookmarks_mt_{}", std::process::id()));
        let path = dir.join("bookmarks.json");
        let _ = fs::remove_dir_all(&dir);

        let store = BookmarkStore::open(&path).unwrap();
        for round in 0..3 {
            std::thread::scope(|scope| {
                for t in 0..8 {
                    let store = &store;
                    scope.spawn(move || store.toggle(&format!("post_{}", t)).unwrap());
                }
            });

            let reopened = BookmarkStore::open(&path).unwrap();
            // even rounds add all eight, odd rounds remove them again
            let expected = if round % 2 == 0 { 8 } else { 0 };
            assert_eq!(reopened.len(), expected, "round {}", round);
            assert_eq!(reopened.ids(), store.ids());
        }
        assert!(!dir.join("bookmarks.json.tmp").exists());

        let _ = fs::remove_dir_all(dir);
    }
}
