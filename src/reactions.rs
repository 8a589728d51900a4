//! Admin reaction ledger.
//!
//! Admins leave at most one reaction per mentoring session. Saving again
//! overwrites the previous reaction (last write wins) while keeping its id
//! and creation time. Callers that need to detect concurrent edits can use
//! [`ReactionLedger::save_reaction_checked`], which compares the reaction's
//! version counter before writing.
//!
//! The ledger lives in memory only and validates nothing; run
//! [`ReactionInput::validate`] before saving user-entered data.

use crate::error::{LedgerError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Tag ids offered to admins when reacting to a session
pub const REACTION_TAGS: &[&str] = &[
    "excellent",
    "creative",
    "needs-improvement",
    "well-structured",
    "engaged-mentee",
    "clear-goals",
];

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// Fields an admin supplies when saving a reaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionInput {
    pub admin_id: String,
    pub rating: u8,
    pub comment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl ReactionInput {
    pub fn new(admin_id: &str, rating: u8, comment: &str) -> Self {
        Self {
            admin_id: admin_id.to_string(),
            rating,
            comment: comment.to_string(),
            recommendation: None,
            tags: BTreeSet::new(),
        }
    }

    pub fn with_recommendation(mut self, recommendation: &str) -> Self {
        self.recommendation = Some(recommendation.to_string());
        self
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tags.insert(tag.to_string());
        self
    }

    /// Check the input is worth saving: rating in range, comment not blank
    pub fn validate(&self) -> Result<()> {
        if !(MIN_RATING..=MAX_RATING).contains(&self.rating) {
            return Err(LedgerError::Validation {
                field: "rating".to_string(),
                message: format!(
                    "must be between {} and {}, got {}",
                    MIN_RATING, MAX_RATING, self.rating
                ),
            });
        }
        if self.comment.trim().is_empty() {
            return Err(LedgerError::Validation {
                field: "comment".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// A saved reaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminReaction {
    pub id: String,
    pub session_id: String,
    pub admin_id: String,
    pub rating: u8,
    pub comment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Starts at 1, bumped on every save
    pub version: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionStats {
    pub total_reactions: usize,
    pub average_rating: f64,
    pub tag_frequency: BTreeMap<String, usize>,
}

/// Source of "now" for timestamps
pub type Clock = Box<dyn Fn() -> DateTime<Utc>>;

pub struct ReactionLedger {
    reactions: BTreeMap<String, AdminReaction>,
    clock: Clock,
}

impl Default for ReactionLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ReactionLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactionLedger")
            .field("reactions", &self.reactions)
            .finish_non_exhaustive()
    }
}

impl ReactionLedger {
    pub fn new() -> Self {
        Self::with_clock(Box::new(Utc::now))
    }

    pub fn with_clock(clock: Clock) -> Self {
        Self {
            reactions: BTreeMap::new(),
            clock,
        }
    }

    fn new_id() -> String {
        format!("reaction_{}", uuid::Uuid::new_v4().simple())
    }

    /// Create or overwrite the reaction for `session_id`
    pub fn save_reaction(&mut self, session_id: &str, input: ReactionInput) -> AdminReaction {
        let now = (self.clock)();
        let existing = self.reactions.get(session_id);

        let reaction = AdminReaction {
            id: existing.map_or_else(Self::new_id, |r| r.id.clone()),
            session_id: session_id.to_string(),
            admin_id: input.admin_id,
            rating: input.rating,
            comment: input.comment,
            recommendation: input.recommendation,
            tags: input.tags,
            created_at: existing.map_or(now, |r| r.created_at),
            updated_at: now,
            version: existing.map_or(1, |r| r.version + 1),
        };

        tracing::info!(
            session_id,
            reaction_id = %reaction.id,
            version = reaction.version,
            "saved admin reaction"
        );
        self.reactions
            .insert(session_id.to_string(), reaction.clone());
        reaction
    }

    /// Save only if the stored version still equals `expected_version`.
    ///
    /// Pass 0 to require that no reaction exists yet.
    pub fn save_reaction_checked(
        &mut self,
        session_id: &str,
        input: ReactionInput,
        expected_version: u64,
    ) -> Result<AdminReaction> {
        let current = self.reactions.get(session_id).map_or(0, |r| r.version);
        if current != expected_version {
            tracing::warn!(
                session_id,
                expected_version,
                current,
                "rejected stale reaction write"
            );
            return Err(LedgerError::StaleWrite {
                session_id: session_id.to_string(),
                expected: expected_version,
                current,
            });
        }
        Ok(self.save_reaction(session_id, input))
    }

    pub fn reaction(&self, session_id: &str) -> Option<&AdminReaction> {
        self.reactions.get(session_id)
    }

    /// Every reaction, ordered by session id
    pub fn all_reactions(&self) -> Vec<&AdminReaction> {
        self.reactions.values().collect()
    }

    pub fn delete_reaction(&mut self, session_id: &str) -> bool {
        let removed = self.reactions.remove(session_id).is_some();
        if removed {
            tracing::info!(session_id, "deleted admin reaction");
        }
        removed
    }

    pub fn reactions_by_admin(&self, admin_id: &str) -> Vec<&AdminReaction> {
        self.reactions
            .values()
            .filter(|r| r.admin_id == admin_id)
            .collect()
    }

    /// Mean rating rounded to one decimal; 0 when there are no reactions
    pub fn average_rating(&self) -> f64 {
        if self.reactions.is_empty() {
            return 0.0;
        }
        let sum: u64 = self.reactions.values().map(|r| u64::from(r.rating)).sum();
        let mean = sum as f64 / self.reactions.len() as f64;
        (mean * 10.0).round() / 10.0
    }

    pub fn reaction_stats(&self) -> ReactionStats {
        let mut tag_frequency = BTreeMap::new();
        for tag in self.reactions.values().flat_map(|r| r.tags.iter()) {
            *tag_frequency.entry(tag.clone()).or_insert(0) += 1;
        }

        ReactionStats {
            total_reactions: self.reactions.len(),
            average_rating: self.average_rating(),
            tag_frequency,
        }
    }

    pub fn len(&self) -> usize {
        self.reactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reactions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::cell::Cell;

    /// Clock that advances one second per call
    fn ticking_clock() -> Clock {
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let ticks = Cell::new(0);
        Box::new(move || {
            let n = ticks.get();
            ticks.set(n + 1);
            base + Duration::seconds(n)
        })
    }

    fn ledger() -> ReactionLedger {
        ReactionLedger::with_clock(ticking_clock())
    }

    #[test]
    fn test_first_save_creates() {
        let mut ledger = ledger();
        let r = ledger.save_reaction("s1", ReactionInput::new("1", 4, "Solid session"));
        assert!(r.id.starts_with("reaction_"));
        assert_eq!(r.created_at, r.updated_at);
        assert_eq!(r.version, 1);
        assert_eq!(ledger.reaction("s1"), Some(&r));
    }

    #[test]
    fn test_resave_preserves_identity() {
        let mut ledger = ledger();
        let first = ledger.save_reaction(
            "s1",
            ReactionInput::new("1", 2, "Needs work").with_tag("needs-improvement"),
        );
        let second = ledger.save_reaction(
            "s1",
            ReactionInput::new("7", 5, "Much better")
                .with_tag("excellent")
                .with_recommendation("Pair on the next design review"),
        );

        assert_eq!(second.id, first.id);
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at > first.updated_at);
        assert_eq!(second.admin_id, "7");
        assert_eq!(second.rating, 5);
        assert_eq!(second.comment, "Much better");
        assert_eq!(
            second.recommendation.as_deref(),
            Some("Pair on the next design review")
        );
        assert!(second.tags.contains("excellent"));
        assert!(!second.tags.contains("needs-improvement"));
        assert_eq!(second.version, 2);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_average_rating() {
        let mut ledger = ledger();
        assert_eq!(ledger.average_rating(), 0.0);
        for (session, rating) in [("a", 5), ("b", 3), ("c", 4)] {
            ledger.save_reaction(session, ReactionInput::new("1", rating, "ok"));
        }
        assert_eq!(ledger.average_rating(), 4.0);
    }

    #[test]
    fn test_average_rounds_to_one_decimal() {
        let mut ledger = ledger();
        for (session, rating) in [("a", 5), ("b", 4), ("c", 4)] {
            ledger.save_reaction(session, ReactionInput::new("1", rating, "ok"));
        }
        assert_eq!(ledger.average_rating(), 4.3);
    }

    #[test]
    fn test_stats_and_admin_filter() {
        let mut ledger = ledger();
        ledger.save_reaction(
            "a",
            ReactionInput::new("1", 5, "great")
                .with_tag("excellent")
                .with_tag("clear-goals"),
        );
        ledger.save_reaction(
            "b",
            ReactionInput::new("2", 3, "fine").with_tag("excellent"),
        );

        let stats = ledger.reaction_stats();
        assert_eq!(stats.total_reactions, 2);
        assert_eq!(stats.average_rating, 4.0);
        assert_eq!(stats.tag_frequency.get("excellent"), Some(&2));
        assert_eq!(stats.tag_frequency.get("clear-goals"), Some(&1));

        let by_admin = ledger.reactions_by_admin("2");
        assert_eq!(by_admin.len(), 1);
        assert_eq!(by_admin[0].session_id, "b");
        assert!(ledger.reactions_by_admin("9").is_empty());
    }

    #[test]
    fn test_delete() {
        let mut ledger = ledger();
        ledger.save_reaction("a", ReactionInput::new("1", 5, "great"));
        assert!(ledger.delete_reaction("a"));
        assert!(!ledger.delete_reaction("a"));
        assert!(ledger.is_empty());
        assert!(ledger.all_reactions().is_empty());
    }

    #[test]
    fn test_checked_save_rejects_stale_version() {
        let mut ledger = ledger();
        let created = ledger
            .save_reaction_checked("a", ReactionInput::new("1", 4, "first"), 0)
            .unwrap();
        assert_eq!(created.version, 1);

        let updated = ledger
            .save_reaction_checked("a", ReactionInput::new("2", 5, "second"), 1)
            .unwrap();
        assert_eq!(updated.version, 2);

        let err = ledger
            .save_reaction_checked("a", ReactionInput::new("1", 1, "stale"), 1)
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::StaleWrite {
                expected: 1,
                current: 2,
                ..
            }
        ));
        assert_eq!(ledger.reaction("a").unwrap().comment, "second");
    }

    #[test]
    fn test_ledger_does_not_validate() {
        let mut ledger = ledger();
        let r = ledger.save_reaction("a", ReactionInput::new("1", 0, ""));
        assert_eq!(r.rating, 0);
    }

    #[test]
    fn test_input_validation() {
        assert!(ReactionInput::new("1", 3, "ok").validate().is_ok());

        let err = ReactionInput::new("1", 0, "ok").validate().unwrap_err();
        assert!(matches!(err, LedgerError::Validation { ref field, .. } if field == "rating"));

        let err = ReactionInput::new("1", 6, "ok").validate().unwrap_err();
        assert!(err.to_string().contains("between 1 and 5"));

        let err = ReactionInput::new("1", 3, "   ").validate().unwrap_err();
        assert!(matches!(err, LedgerError::Validation { ref field, .. } if field == "comment"));
    }

    #[test]
    fn test_preset_tags() {
        assert_eq!(REACTION_TAGS.len(), 6);
        assert!(REACTION_TAGS.contains(&"engaged-mentee"));
    }
}
