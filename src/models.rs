//! Domain records shared by the ledgers and fixtures.
//!
//! Field names serialize in camelCase so exported JSON matches the shape the
//! platform's web client reads and writes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Mentor,
    Mentee,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub roles: Vec<UserRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invited_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invited_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl User {
    pub fn has_role(&self, role: UserRole) -> bool {
        self.roles.contains(&role)
    }
}

/// Mentor tier, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MentorRank {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl MentorRank {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "bronze" => Some(Self::Bronze),
            "silver" => Some(Self::Silver),
            "gold" => Some(Self::Gold),
            "platinum" => Some(Self::Platinum),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bronze => "bronze",
            Self::Silver => "silver",
            Self::Gold => "gold",
            Self::Platinum => "platinum",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub id: String,
    pub mentor_id: String,
    pub author_id: String,
    pub content: String,
    #[serde(default)]
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
}

/// Weekly recurring slot a mentor is open for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    /// 0 = Sunday
    pub day_of_week: u8,
    /// "HH:MM"
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MentorProfile {
    pub id: String,
    pub user_id: String,
    pub user: User,
    #[serde(default)]
    pub self_introduction: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub specialties: Vec<String>,
    #[serde(default)]
    pub experience: String,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub points: u32,
    pub rank: MentorRank,
    #[serde(default)]
    pub available_for_flash: bool,
    #[serde(default)]
    pub available_for_long_term: bool,
    #[serde(default)]
    pub sessions_completed: u32,
    #[serde(default)]
    pub mentees: Vec<String>,
    #[serde(default)]
    pub available_slots: Vec<TimeSlot>,
}

impl MentorProfile {
    /// Case-insensitive substring match on name, skills or specialties.
    /// `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        self.user.name.to_lowercase().contains(needle)
            || self.skills.iter().any(|s| s.to_lowercase().contains(needle))
            || self
                .specialties
                .iter()
                .any(|s| s.to_lowercase().contains(needle))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeArticle {
    pub id: String,
    pub title: String,
    pub author_id: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Likes recorded before the ledger existed
    #[serde(default)]
    pub likes: u32,
    #[serde(default)]
    pub views: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionType {
    LongTerm,
    Flash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Pending,
    Approved,
    Ongoing,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MentoringSession {
    pub id: String,
    pub mentor_id: String,
    pub mentee_id: String,
    #[serde(rename = "type")]
    pub session_type: SessionType,
    pub status: SessionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
    /// Minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_parse() {
        assert_eq!(MentorRank::from_str("Gold"), Some(MentorRank::Gold));
        assert_eq!(MentorRank::from_str("diamond"), None);
        assert!(MentorRank::Platinum > MentorRank::Bronze);
        assert_eq!(MentorRank::Silver.as_str(), "silver");
    }

    #[test]
    fn test_session_wire_names() {
        let json = serde_json::to_value(SessionType::LongTerm).unwrap();
        assert_eq!(json, "long-term");
        let status: SessionStatus = serde_json::from_str("\"ongoing\"").unwrap();
        assert_eq!(status, SessionStatus::Ongoing);
    }

    #[test]
    fn test_user_camel_case_fields() {
        let json = r#"{
            "id": "9",
            "email": "x@company.com",
            "name": "X",
            "roles": ["mentor"],
            "createdAt": "2024-01-01T00:00:00Z",
            "avatarUrl": "https://example.com/x.svg"
        }"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert!(user.has_role(UserRole::Mentor));
        assert!(!user.has_role(UserRole::Admin));
        assert_eq!(user.avatar_url.as_deref(), Some("https://example.com/x.svg"));
        assert!(user.invited_by.is_none());
    }
}
