//! Mentor profile store.
//!
//! In-memory map from mentor id to profile, usually seeded from
//! [`crate::fixtures`]. The store is the only writer: every mutator does a
//! read-modify-write of a single record and replaces it wholesale.

use crate::models::{MentorProfile, MentorRank, Recommendation, TimeSlot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which availability flag to flip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Flash,
    LongTerm,
}

impl Availability {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "flash" => Some(Self::Flash),
            "longterm" | "long-term" | "long_term" => Some(Self::LongTerm),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MentorStats {
    pub total_sessions: u32,
    pub completed_sessions: u32,
    pub average_rating: f64,
    pub total_mentees: usize,
}

/// Partial update; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MentorPatch {
    #[serde(default)]
    pub self_introduction: Option<String>,
    #[serde(default)]
    pub skills: Option<Vec<String>>,
    #[serde(default)]
    pub specialties: Option<Vec<String>>,
    #[serde(default)]
    pub experience: Option<String>,
    #[serde(default)]
    pub recommendations: Option<Vec<Recommendation>>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub review_count: Option<u32>,
    #[serde(default)]
    pub points: Option<u32>,
    #[serde(default)]
    pub rank: Option<MentorRank>,
    #[serde(default)]
    pub available_for_flash: Option<bool>,
    #[serde(default)]
    pub available_for_long_term: Option<bool>,
    #[serde(default)]
    pub available_slots: Option<Vec<TimeSlot>>,
}

impl MentorPatch {
    fn apply(self, profile: &mut MentorProfile) {
        if let Some(v) = self.self_introduction {
            profile.self_introduction = v;
        }
        if let Some(v) = self.skills {
            profile.skills = v;
        }
        if let Some(v) = self.specialties {
            profile.specialties = v;
        }
        if let Some(v) = self.experience {
            profile.experience = v;
        }
        if let Some(v) = self.recommendations {
            profile.recommendations = v;
        }
        if let Some(v) = self.rating {
            profile.rating = v;
        }
        if let Some(v) = self.review_count {
            profile.review_count = v;
        }
        if let Some(v) = self.points {
            profile.points = v;
        }
        if let Some(v) = self.rank {
            profile.rank = v;
        }
        if let Some(v) = self.available_for_flash {
            profile.available_for_flash = v;
        }
        if let Some(v) = self.available_for_long_term {
            profile.available_for_long_term = v;
        }
        if let Some(v) = self.available_slots {
            profile.available_slots = v;
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MentorProfileStore {
    profiles: BTreeMap<String, MentorProfile>,
}

impl MentorProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with the given profiles; later duplicates win
    pub fn with_profiles(profiles: impl IntoIterator<Item = MentorProfile>) -> Self {
        let mut store = Self::new();
        for profile in profiles {
            store.profiles.insert(profile.id.clone(), profile);
        }
        store
    }

    /// Store seeded from the built-in fixtures
    pub fn seeded() -> Self {
        Self::with_profiles(crate::fixtures::mentor_profiles())
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Every profile, ordered by id
    pub fn all(&self) -> Vec<&MentorProfile> {
        self.profiles.values().collect()
    }

    pub fn get(&self, id: &str) -> Option<&MentorProfile> {
        self.profiles.get(id)
    }

    /// Replace the record stored under `id`
    pub fn update(&mut self, id: &str, profile: MentorProfile) -> &MentorProfile {
        tracing::info!(mentor_id = id, "replaced mentor profile");
        self.profiles.insert(id.to_string(), profile);
        &self.profiles[id]
    }

    /// Read-modify-write a single record; false when `id` is unknown
    fn modify(&mut self, id: &str, f: impl FnOnce(&mut MentorProfile)) -> bool {
        let Some(current) = self.profiles.get(id) else {
            tracing::debug!(mentor_id = id, "mentor not found");
            return false;
        };
        let mut updated = current.clone();
        f(&mut updated);
        self.profiles.insert(id.to_string(), updated);
        true
    }

    pub fn update_avatar(&mut self, id: &str, avatar_url: &str) -> bool {
        self.modify(id, |p| p.user.avatar_url = Some(avatar_url.to_string()))
    }

    /// Add a skill unless already present
    pub fn add_skill(&mut self, id: &str, skill: &str) -> bool {
        self.modify(id, |p| {
            if !p.skills.iter().any(|s| s == skill) {
                p.skills.push(skill.to_string());
            }
        })
    }

    pub fn remove_skill(&mut self, id: &str, skill: &str) -> bool {
        self.modify(id, |p| p.skills.retain(|s| s != skill))
    }

    pub fn toggle_availability(&mut self, id: &str, kind: Availability) -> bool {
        self.modify(id, |p| match kind {
            Availability::Flash => p.available_for_flash = !p.available_for_flash,
            Availability::LongTerm => p.available_for_long_term = !p.available_for_long_term,
        })
    }

    /// Set the rating; the review count is kept when `review_count` is None
    pub fn update_rating(&mut self, id: &str, rating: f64, review_count: Option<u32>) -> bool {
        self.modify(id, |p| {
            p.rating = rating;
            if let Some(count) = review_count {
                p.review_count = count;
            }
        })
    }

    /// Case-insensitive substring search over name, skills and specialties
    pub fn search(&self, query: &str) -> Vec<&MentorProfile> {
        let needle = query.to_lowercase();
        self.profiles
            .values()
            .filter(|p| p.matches(&needle))
            .collect()
    }

    pub fn by_rank(&self, rank: MentorRank) -> Vec<&MentorProfile> {
        self.profiles.values().filter(|p| p.rank == rank).collect()
    }

    /// Highest rated first
    pub fn top_mentors(&self, limit: usize) -> Vec<&MentorProfile> {
        let mut ranked: Vec<&MentorProfile> = self.profiles.values().collect();
        ranked.sort_by(|a, b| b.rating.total_cmp(&a.rating));
        ranked.truncate(limit);
        ranked
    }

    pub fn mentor_stats(&self, id: &str) -> Option<MentorStats> {
        self.profiles.get(id).map(|p| MentorStats {
            total_sessions: p.sessions_completed,
            completed_sessions: p.sessions_completed,
            average_rating: p.rating,
            total_mentees: p.mentees.len(),
        })
    }

    /// Apply patches to known ids; unknown ids are skipped. Returns how many applied.
    pub fn update_many(&mut self, updates: Vec<(String, MentorPatch)>) -> usize {
        let mut applied = 0;
        for (id, patch) in updates {
            if self.modify(&id, |p| patch.apply(p)) {
                applied += 1;
            }
        }
        tracing::info!(applied, "bulk mentor update");
        applied
    }

    /// Pretty-printed JSON array of every profile
    pub fn export_all(&self) -> serde_json::Result<String> {
        let profiles: Vec<&MentorProfile> = self.profiles.values().collect();
        serde_json::to_string_pretty(&profiles)
    }

    /// Import a JSON array of profiles, overwriting records that share an id.
    ///
    /// Returns false and leaves the store untouched if the input does not parse.
    pub fn import_all(&mut self, json: &str) -> bool {
        let profiles: Vec<MentorProfile> = match serde_json::from_str(json) {
            Ok(profiles) => profiles,
            Err(err) => {
                tracing::warn!(error = %err, "mentor import failed");
                return false;
            }
        };
        let count = profiles.len();
        for profile in profiles {
            self.profiles.insert(profile.id.clone(), profile);
        }
        tracing::info!(count, "imported mentor profiles");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    fn profile_with_skills(id: &str, name: &str, skills: &[&str]) -> MentorProfile {
        let mut profile = fixtures::mentor_profiles().remove(0);
        profile.id = id.to_string();
        profile.user.name = name.to_string();
        profile.skills = skills.iter().map(|s| s.to_string()).collect();
        profile.specialties = Vec::new();
        profile
    }

    #[test]
    fn test_seeded_store() {
        let store = MentorProfileStore::seeded();
        assert_eq!(store.len(), 3);
        assert!(store.get("1").is_some());
        assert!(store.get("99").is_none());
    }

    #[test]
    fn test_search_matches_skills_case_insensitively() {
        let store = MentorProfileStore::with_profiles(vec![
            profile_with_skills("a", "Alice", &["React", "TypeScript"]),
            profile_with_skills("b", "Bob", &["Go", "Python"]),
        ]);
        let found = store.search("react");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "a");
    }

    #[test]
    fn test_search_matches_name_and_specialty() {
        let store = MentorProfileStore::seeded();
        let by_name: Vec<&str> = store.search("SUZUKI").iter().map(|p| p.id.as_str()).collect();
        assert_eq!(by_name, vec!["2"]);
        let by_specialty: Vec<&str> = store
            .search("agile delivery")
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(by_specialty, vec!["3"]);
        assert!(store.search("cobol").is_empty());
    }

    #[test]
    fn test_update_replaces_record() {
        let mut store = MentorProfileStore::seeded();
        let mut edited = store.get("1").unwrap().clone();
        edited.self_introduction = "Rewritten".to_string();
        edited.skills = vec!["Rust".to_string()];
        store.update("1", edited);
        let stored = store.get("1").unwrap();
        assert_eq!(stored.self_introduction, "Rewritten");
        assert_eq!(stored.skills, vec!["Rust"]);
    }

    #[test]
    fn test_skill_mutators() {
        let mut store = MentorProfileStore::seeded();
        assert!(store.add_skill("2", "Rust"));
        assert!(store.add_skill("2", "Rust"));
        let count = store.get("2").unwrap().skills.iter().filter(|s| *s == "Rust").count();
        assert_eq!(count, 1);

        assert!(store.remove_skill("2", "Rust"));
        assert!(!store.get("2").unwrap().skills.contains(&"Rust".to_string()));
        assert!(!store.add_skill("missing", "Rust"));
        assert!(!store.remove_skill("missing", "Rust"));
    }

    #[test]
    fn test_toggle_availability() {
        let mut store = MentorProfileStore::seeded();
        assert!(!store.get("2").unwrap().available_for_long_term);
        assert!(store.toggle_availability("2", Availability::LongTerm));
        assert!(store.get("2").unwrap().available_for_long_term);
        assert!(store.toggle_availability("2", Availability::Flash));
        assert!(!store.get("2").unwrap().available_for_flash);
        assert!(!store.toggle_availability("missing", Availability::Flash));
        assert_eq!(Availability::from_str("long-term"), Some(Availability::LongTerm));
    }

    #[test]
    fn test_update_rating_keeps_review_count() {
        let mut store = MentorProfileStore::seeded();
        assert!(store.update_rating("1", 4.2, None));
        let p = store.get("1").unwrap();
        assert_eq!(p.rating, 4.2);
        assert_eq!(p.review_count, 12);

        assert!(store.update_rating("1", 4.4, Some(13)));
        assert_eq!(store.get("1").unwrap().review_count, 13);
    }

    #[test]
    fn test_update_avatar() {
        let mut store = MentorProfileStore::seeded();
        assert!(store.update_avatar("3", "https://example.com/new.png"));
        assert_eq!(
            store.get("3").unwrap().user.avatar_url.as_deref(),
            Some("https://example.com/new.png")
        );
        assert!(!store.update_avatar("missing", "x"));
    }

    #[test]
    fn test_rank_and_top() {
        let store = MentorProfileStore::seeded();
        let platinum = store.by_rank(MentorRank::Platinum);
        assert_eq!(platinum.len(), 1);
        assert_eq!(platinum[0].id, "2");

        let top: Vec<&str> = store.top_mentors(2).iter().map(|p| p.id.as_str()).collect();
        assert_eq!(top, vec!["2", "1"]);
    }

    #[test]
    fn test_mentor_stats() {
        let store = MentorProfileStore::seeded();
        let stats = store.mentor_stats("1").unwrap();
        assert_eq!(stats.total_sessions, 48);
        assert_eq!(stats.total_mentees, 2);
        assert_eq!(stats.average_rating, 4.8);
        assert!(store.mentor_stats("missing").is_none());
    }

    #[test]
    fn test_update_many_skips_unknown() {
        let mut store = MentorProfileStore::seeded();
        let applied = store.update_many(vec![
            (
                "1".to_string(),
                MentorPatch {
                    points: Some(9000),
                    ..Default::default()
                },
            ),
            (
                "missing".to_string(),
                MentorPatch {
                    points: Some(1),
                    ..Default::default()
                },
            ),
        ]);
        assert_eq!(applied, 1);
        let p = store.get("1").unwrap();
        assert_eq!(p.points, 9000);
        assert_eq!(p.rating, 4.8);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_import_overwrites_same_id() {
        let mut store = MentorProfileStore::seeded();
        let mut incoming = store.get("1").unwrap().clone();
        incoming.experience = "Imported experience".to_string();
        incoming.rating = 3.1;
        let json = serde_json::to_string(&vec![incoming]).unwrap();

        assert!(store.import_all(&json));
        assert_eq!(store.len(), 3);
        let matching: Vec<&MentorProfile> = store.all().into_iter().filter(|p| p.id == "1").collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].experience, "Imported experience");
        assert_eq!(matching[0].rating, 3.1);
    }

    #[test]
    fn test_import_rejects_garbage() {
        let mut store = MentorProfileStore::seeded();
        let before = store.export_all().unwrap();
        assert!(!store.import_all("not json"));
        assert!(!store.import_all(r#"{"id": "1"}"#));
        assert_eq!(store.export_all().unwrap(), before);
    }

    #[test]
    fn test_export_then_import_into_empty_store() {
        let seeded = MentorProfileStore::seeded();
        let json = seeded.export_all().unwrap();
        assert!(json.contains("\"selfIntroduction\""));

        let mut fresh = MentorProfileStore::new();
        assert!(fresh.import_all(&json));
        assert_eq!(fresh.len(), 3);
        assert_eq!(fresh.get("2"), seeded.get("2"));
    }
}
