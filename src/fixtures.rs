//! Static seed data standing in for a real backend.

use crate::models::{
    KnowledgeArticle, MentorProfile, MentorRank, MentoringSession, Recommendation, SessionStatus,
    SessionType, TimeSlot, User, UserRole,
};
use chrono::{DateTime, TimeZone, Utc};

fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0)
        .single()
        .unwrap_or_default()
}

fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    at(y, m, d, 0)
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn slots(items: &[(u8, &str)]) -> Vec<TimeSlot> {
    items
        .iter()
        .map(|(day_of_week, time)| TimeSlot {
            day_of_week: *day_of_week,
            time: time.to_string(),
        })
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn user(
    id: &str,
    email: &str,
    name: &str,
    roles: &[UserRole],
    department: &str,
    invited: Option<(&str, DateTime<Utc>)>,
    created_at: DateTime<Utc>,
    avatar_seed: &str,
) -> User {
    User {
        id: id.to_string(),
        email: email.to_string(),
        name: name.to_string(),
        roles: roles.to_vec(),
        department: Some(department.to_string()),
        invited_by: invited.map(|(by, _)| by.to_string()),
        invited_at: invited.map(|(_, when)| when),
        created_at,
        avatar_url: Some(format!(
            "https://api.dicebear.com/7.x/avataaars/svg?seed={}",
            avatar_seed
        )),
    }
}

pub fn users() -> Vec<User> {
    use UserRole::*;
    vec![
        user(
            "1",
            "admin@company.com",
            "Taro Yamada",
            &[Admin],
            "Corporate Planning",
            None,
            day(2024, 1, 1),
            "admin",
        ),
        user(
            "2",
            "tanaka@company.com",
            "Hanako Tanaka",
            &[Mentor, Mentee],
            "Engineering",
            Some(("1", day(2024, 1, 15))),
            day(2024, 1, 15),
            "tanaka",
        ),
        user(
            "3",
            "suzuki@company.com",
            "Ichiro Suzuki",
            &[Mentor],
            "Infrastructure",
            Some(("1", day(2024, 1, 20))),
            day(2024, 1, 20),
            "suzuki",
        ),
        user(
            "4",
            "sato@company.com",
            "Misaki Sato",
            &[Mentee],
            "Engineering",
            Some(("2", day(2024, 2, 1))),
            day(2024, 2, 1),
            "sato",
        ),
        user(
            "5",
            "watanabe@company.com",
            "Kenta Watanabe",
            &[Mentor, Mentee],
            "Product",
            Some(("1", day(2024, 2, 10))),
            day(2024, 2, 10),
            "watanabe",
        ),
    ]
}

fn user_by_id(users: &[User], id: &str) -> Option<User> {
    users.iter().find(|u| u.id == id).cloned()
}

fn recommendation(
    id: &str,
    mentor_id: &str,
    author_id: &str,
    content: &str,
    created_at: DateTime<Utc>,
) -> Recommendation {
    Recommendation {
        id: id.to_string(),
        mentor_id: mentor_id.to_string(),
        author_id: author_id.to_string(),
        content: content.to_string(),
        is_approved: true,
        created_at,
    }
}

pub fn mentor_profiles() -> Vec<MentorProfile> {
    let users = users();
    let mut profiles = Vec::new();

    if let Some(user) = user_by_id(&users, "2") {
        profiles.push(MentorProfile {
            id: "1".to_string(),
            user_id: user.id.clone(),
            user,
            self_introduction: "Ten years of frontend work across React, Vue.js and Next.js. \
                Enjoys helping junior engineers grow inside a team."
                .to_string(),
            skills: strings(&["React", "TypeScript", "Next.js", "Vue.js", "Node.js"]),
            specialties: strings(&[
                "Frontend development",
                "Performance tuning",
                "Architecture design",
            ]),
            experience: "Led a large e-commerce build; former startup CTO.".to_string(),
            recommendations: vec![
                recommendation(
                    "1",
                    "1",
                    "1",
                    "Explains things patiently from the mentee's point of view.",
                    day(2024, 2, 1),
                ),
                recommendation(
                    "2",
                    "1",
                    "4",
                    "Helped with both technical questions and career advice.",
                    day(2024, 3, 1),
                ),
            ],
            rating: 4.8,
            review_count: 12,
            points: 2500,
            rank: MentorRank::Gold,
            available_for_flash: true,
            available_for_long_term: true,
            sessions_completed: 48,
            mentees: strings(&["4", "5"]),
            available_slots: slots(&[(1, "19:00"), (3, "19:00"), (5, "19:00")]),
        });
    }

    if let Some(user) = user_by_id(&users, "3") {
        profiles.push(MentorProfile {
            id: "2".to_string(),
            user_id: user.id.clone(),
            user,
            self_introduction: "Backend specialist focused on microservice architecture \
                and cloud infrastructure."
                .to_string(),
            skills: strings(&["Go", "Python", "Kubernetes", "AWS", "PostgreSQL"]),
            specialties: strings(&[
                "Backend development",
                "Infrastructure",
                "System design",
            ]),
            experience: "Fifteen years; financial systems architect and infrastructure lead."
                .to_string(),
            recommendations: vec![recommendation(
                "3",
                "2",
                "1",
                "Deep, practical advice that mentees keep coming back to.",
                day(2024, 2, 15),
            )],
            rating: 4.9,
            review_count: 20,
            points: 3500,
            rank: MentorRank::Platinum,
            available_for_flash: true,
            available_for_long_term: false,
            sessions_completed: 75,
            mentees: strings(&["1", "4"]),
            available_slots: slots(&[(2, "18:00"), (4, "18:00")]),
        });
    }

    if let Some(user) = user_by_id(&users, "5") {
        profiles.push(MentorProfile {
            id: "3".to_string(),
            user_id: user.id.clone(),
            user,
            self_introduction: "Bridges engineering and business with a background in both \
                product management and development."
                .to_string(),
            skills: strings(&[
                "Product Management",
                "Agile",
                "React",
                "Data Analysis",
                "UX Design",
            ]),
            specialties: strings(&["Product management", "Agile delivery", "Data analysis"]),
            experience: "Eight years as an engineer, then three as a product manager.".to_string(),
            recommendations: Vec::new(),
            rating: 4.5,
            review_count: 5,
            points: 800,
            rank: MentorRank::Silver,
            available_for_flash: true,
            available_for_long_term: true,
            sessions_completed: 15,
            mentees: strings(&["1"]),
            available_slots: slots(&[(1, "20:00"), (3, "20:00"), (5, "19:00")]),
        });
    }

    profiles
}

pub fn knowledge_articles() -> Vec<KnowledgeArticle> {
    vec![
        KnowledgeArticle {
            id: "1".to_string(),
            title: "What's new in React 18 and how to keep it fast".to_string(),
            author_id: "2".to_string(),
            tags: strings(&["React", "Performance", "Frontend"]),
            likes: 24,
            views: 156,
            created_at: day(2024, 2, 1),
            updated_at: day(2024, 2, 15),
        },
        KnowledgeArticle {
            id: "2".to_string(),
            title: "Running microservices on Kubernetes in production".to_string(),
            author_id: "3".to_string(),
            tags: strings(&["Kubernetes", "Microservices", "Infrastructure"]),
            likes: 32,
            views: 241,
            created_at: day(2024, 1, 15),
            updated_at: day(2024, 1, 20),
        },
        KnowledgeArticle {
            id: "3".to_string(),
            title: "Running effective one-on-ones".to_string(),
            author_id: "5".to_string(),
            tags: strings(&["Mentoring", "Communication", "Management"]),
            likes: 18,
            views: 98,
            created_at: day(2024, 3, 1),
            updated_at: day(2024, 3, 1),
        },
    ]
}

pub fn sessions() -> Vec<MentoringSession> {
    vec![
        MentoringSession {
            id: "1".to_string(),
            mentor_id: "1".to_string(),
            mentee_id: "4".to_string(),
            session_type: SessionType::LongTerm,
            status: SessionStatus::Ongoing,
            scheduled_at: Some(at(2024, 3, 1, 10)),
            duration: Some(60),
            created_at: day(2024, 2, 20),
        },
        MentoringSession {
            id: "2".to_string(),
            mentor_id: "2".to_string(),
            mentee_id: "4".to_string(),
            session_type: SessionType::Flash,
            status: SessionStatus::Completed,
            scheduled_at: Some(at(2024, 2, 15, 14)),
            duration: Some(30),
            created_at: day(2024, 2, 10),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profiles_link_to_users() {
        let profiles = mentor_profiles();
        assert_eq!(profiles.len(), 3);
        for profile in &profiles {
            assert_eq!(profile.user_id, profile.user.id);
            assert!(profile.user.has_role(UserRole::Mentor));
        }
    }

    #[test]
    fn test_fixture_ids_unique() {
        let users = users();
        let mut ids: Vec<&str> = users.iter().map(|u| u.id.as_str()).collect();
        ids.dedup();
        assert_eq!(ids.len(), users.len());
        assert_eq!(knowledge_articles().len(), 3);
        assert_eq!(sessions().len(), 2);
    }

    #[test]
    fn test_dates_resolve() {
        let articles = knowledge_articles();
        assert!(articles[0].created_at < articles[0].updated_at);
        assert_ne!(users()[0].created_at, DateTime::<Utc>::default());
    }
}
