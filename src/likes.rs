//! Article like ledger.
//!
//! Maps an article id to the users who liked it. The whole ledger is written
//! through to the [`PersistenceStore`] after every mutation, so a ledger
//! reopened on the same backend sees exactly the same likes.

use crate::error::Result;
use crate::storage::{Document, PersistenceStore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key the ledger is persisted under unless configured otherwise
pub const DEFAULT_STORAGE_KEY: &str = "article_likes";

/// Persisted shape: article id -> user ids in like order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LikesData(pub BTreeMap<String, Vec<String>>);

// Version 0 is the bare map older clients wrote; only the envelope changed.
impl Document for LikesData {
    const SCHEMA_VERSION: u32 = 1;
}

impl LikesData {
    /// Collapse repeated user ids, keeping the first like
    fn dedup(&mut self) {
        for users in self.0.values_mut() {
            let mut seen = std::collections::HashSet::new();
            users.retain(|u| seen.insert(u.clone()));
        }
    }
}

/// Like count for a single article
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleLikes {
    pub article_id: String,
    pub count: usize,
}

pub struct LikeLedger {
    store: PersistenceStore,
    key: String,
    data: LikesData,
}

impl LikeLedger {
    /// Open the ledger stored under [`DEFAULT_STORAGE_KEY`]
    pub fn open(store: PersistenceStore) -> Result<Self> {
        Self::open_with_key(store, DEFAULT_STORAGE_KEY)
    }

    /// Open the ledger stored under `key`
    pub fn open_with_key(store: PersistenceStore, key: &str) -> Result<Self> {
        let mut data: LikesData = store.load(key)?;
        data.dedup();
        tracing::debug!(key, articles = data.0.len(), "opened like ledger");
        Ok(Self {
            store,
            key: key.to_string(),
            data,
        })
    }

    pub fn storage_key(&self) -> &str {
        &self.key
    }

    fn persist(&mut self) -> Result<()> {
        self.store.save(&self.key, &self.data)?;
        Ok(())
    }

    /// Flip `user_id`'s like on `article_id` and return whether it is now liked.
    ///
    /// The in-memory ledger is updated even if persisting fails; the error
    /// is returned so the caller can decide whether to retry.
    pub fn toggle_like(&mut self, article_id: &str, user_id: &str) -> Result<bool> {
        let users = self.data.0.entry(article_id.to_string()).or_default();
        let liked = match users.iter().position(|u| u == user_id) {
            Some(idx) => {
                users.remove(idx);
                false
            }
            None => {
                users.push(user_id.to_string());
                true
            }
        };
        tracing::info!(article_id, user_id, liked, "toggled like");
        self.persist()?;
        Ok(liked)
    }

    pub fn is_liked(&self, article_id: &str, user_id: &str) -> bool {
        self.data
            .0
            .get(article_id)
            .is_some_and(|users| users.iter().any(|u| u == user_id))
    }

    pub fn likes_count(&self, article_id: &str) -> usize {
        self.data.0.get(article_id).map_or(0, Vec::len)
    }

    /// Users who liked `article_id`, in like order
    pub fn likers(&self, article_id: &str) -> &[String] {
        self.data
            .0
            .get(article_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Snapshot of the whole ledger
    pub fn all_likes(&self) -> &BTreeMap<String, Vec<String>> {
        &self.data.0
    }

    pub fn total_likes_count(&self) -> usize {
        self.data.0.values().map(Vec::len).sum()
    }

    /// Articles by like count, highest first; equal counts order by article id
    pub fn most_liked_articles(&self, limit: usize) -> Vec<ArticleLikes> {
        let mut ranked: Vec<ArticleLikes> = self
            .data
            .0
            .iter()
            .map(|(article_id, users)| ArticleLikes {
                article_id: article_id.clone(),
                count: users.len(),
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.article_id.cmp(&b.article_id))
        });
        ranked.truncate(limit);
        ranked
    }

    /// Drop every like on `article_id`. Returns false if it had no entry.
    pub fn clear_article(&mut self, article_id: &str) -> Result<bool> {
        if self.data.0.remove(article_id).is_none() {
            return Ok(false);
        }
        tracing::info!(article_id, "cleared article likes");
        self.persist()?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStore, KeyValueStore, MemoryStore};
    use tempfile::TempDir;

    fn ledger() -> LikeLedger {
        LikeLedger::open(PersistenceStore::in_memory()).unwrap()
    }

    fn like_n(ledger: &mut LikeLedger, article: &str, n: usize) {
        for i in 0..n {
            ledger.toggle_like(article, &format!("user-{}", i)).unwrap();
        }
    }

    #[test]
    fn test_toggle_flips_membership() {
        let mut ledger = ledger();
        assert!(!ledger.is_liked("a1", "u1"));
        assert!(ledger.toggle_like("a1", "u1").unwrap());
        assert!(ledger.is_liked("a1", "u1"));
        assert_eq!(ledger.likes_count("a1"), 1);
        assert!(!ledger.toggle_like("a1", "u1").unwrap());
        assert!(!ledger.is_liked("a1", "u1"));
    }

    #[test]
    fn test_double_toggle_restores_state() {
        let mut ledger = ledger();
        ledger.toggle_like("a1", "u2").unwrap();
        for user in ["u1", "u2"] {
            let was_liked = ledger.is_liked("a1", user);
            let count = ledger.likes_count("a1");
            ledger.toggle_like("a1", user).unwrap();
            ledger.toggle_like("a1", user).unwrap();
            assert_eq!(ledger.is_liked("a1", user), was_liked);
            assert_eq!(ledger.likes_count("a1"), count);
        }
    }

    #[test]
    fn test_unknown_article_counts_zero() {
        let ledger = ledger();
        assert_eq!(ledger.likes_count("missing"), 0);
        assert!(ledger.likers("missing").is_empty());
        assert_eq!(ledger.total_likes_count(), 0);
    }

    #[test]
    fn test_total_is_sum_of_counts() {
        let mut ledger = ledger();
        like_n(&mut ledger, "a", 3);
        like_n(&mut ledger, "b", 5);
        ledger.toggle_like("b", "user-0").unwrap();
        let sum: usize = ledger
            .all_likes()
            .keys()
            .map(|a| ledger.likes_count(a))
            .sum();
        assert_eq!(ledger.total_likes_count(), sum);
        assert_eq!(sum, 7);
    }

    #[test]
    fn test_most_liked_ordering() {
        let mut ledger = ledger();
        like_n(&mut ledger, "A", 3);
        like_n(&mut ledger, "B", 7);
        like_n(&mut ledger, "C", 1);
        let top = ledger.most_liked_articles(2);
        let ids: Vec<&str> = top.iter().map(|a| a.article_id.as_str()).collect();
        assert_eq!(ids, vec!["B", "A"]);
        assert_eq!(top[0].count, 7);
    }

    #[test]
    fn test_most_liked_ties_by_article_id() {
        let mut ledger = ledger();
        like_n(&mut ledger, "zeta", 2);
        like_n(&mut ledger, "alpha", 2);
        like_n(&mut ledger, "mid", 4);
        let ids: Vec<String> = ledger
            .most_liked_articles(10)
            .into_iter()
            .map(|a| a.article_id)
            .collect();
        assert_eq!(ids, vec!["mid", "alpha", "zeta"]);
    }

    #[test]
    fn test_unliked_article_keeps_empty_entry() {
        let mut ledger = ledger();
        ledger.toggle_like("a1", "u1").unwrap();
        ledger.toggle_like("a1", "u1").unwrap();
        assert!(ledger.all_likes().contains_key("a1"));
        assert_eq!(ledger.likes_count("a1"), 0);
        assert!(ledger.clear_article("a1").unwrap());
        assert!(!ledger.all_likes().contains_key("a1"));
        assert!(!ledger.clear_article("a1").unwrap());
    }

    #[test]
    fn test_likes_survive_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let mut ledger =
                LikeLedger::open(PersistenceStore::new(FileStore::new(dir.path()))).unwrap();
            ledger.toggle_like("a1", "u1").unwrap();
            ledger.toggle_like("a1", "u2").unwrap();
        }
        let reopened = LikeLedger::open(PersistenceStore::new(FileStore::new(dir.path()))).unwrap();
        assert_eq!(reopened.likers("a1"), ["u1", "u2"]);
    }

    #[test]
    fn test_reads_legacy_document_and_dedups() {
        let mut mem = MemoryStore::new();
        mem.set_item(DEFAULT_STORAGE_KEY, r#"{"1":["u1","u2","u1"],"2":[]}"#)
            .unwrap();
        let ledger = LikeLedger::open(PersistenceStore::new(mem)).unwrap();
        assert_eq!(ledger.likes_count("1"), 2);
        assert_eq!(ledger.likes_count("2"), 0);
        assert!(ledger.is_liked("1", "u2"));
    }

    #[test]
    fn test_no_storage_still_tracks_in_memory() {
        let mut ledger = LikeLedger::open(PersistenceStore::unavailable()).unwrap();
        assert!(ledger.toggle_like("a1", "u1").unwrap());
        assert_eq!(ledger.likes_count("a1"), 1);
    }

    #[test]
    fn test_custom_key() {
        let ledger = LikeLedger::open_with_key(PersistenceStore::in_memory(), "likes_v2").unwrap();
        assert_eq!(ledger.storage_key(), "likes_v2");
    }
}
