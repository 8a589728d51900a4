//! Admin dashboard aggregates.
//!
//! Article like counts shown to admins are the baseline count carried by the
//! article record plus whatever the like ledger has recorded since.

use crate::likes::LikeLedger;
use crate::models::{KnowledgeArticle, MentoringSession, SessionStatus, User, UserRole};
use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::Serialize;

/// Read-only view of the platform data the dashboard summarizes
pub struct Catalog<'a> {
    pub users: &'a [User],
    pub articles: &'a [KnowledgeArticle],
    pub sessions: &'a [MentoringSession],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: usize,
    pub total_mentors: usize,
    pub total_mentees: usize,
    pub total_articles: usize,
    pub total_sessions: usize,
    pub completed_sessions: usize,
    pub total_likes: u64,
    pub total_views: u64,
    pub new_users_this_month: usize,
    pub active_sessions_today: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularArticle {
    pub id: String,
    pub title: String,
    pub author: String,
    pub likes: u64,
    pub views: u32,
}

/// Baseline likes plus ledger likes for one article
pub fn article_likes(article: &KnowledgeArticle, likes: &LikeLedger) -> u64 {
    u64::from(article.likes) + likes.likes_count(&article.id) as u64
}

fn start_of_month(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}

pub fn dashboard_stats(
    catalog: &Catalog<'_>,
    likes: &LikeLedger,
    now: DateTime<Utc>,
) -> DashboardStats {
    let month_start = start_of_month(now);
    let today = now.date_naive();

    let baseline_likes: u64 = catalog.articles.iter().map(|a| u64::from(a.likes)).sum();

    DashboardStats {
        total_users: catalog.users.len(),
        total_mentors: catalog
            .users
            .iter()
            .filter(|u| u.has_role(UserRole::Mentor))
            .count(),
        total_mentees: catalog
            .users
            .iter()
            .filter(|u| u.has_role(UserRole::Mentee))
            .count(),
        total_articles: catalog.articles.len(),
        total_sessions: catalog.sessions.len(),
        completed_sessions: catalog
            .sessions
            .iter()
            .filter(|s| s.status == SessionStatus::Completed)
            .count(),
        total_likes: baseline_likes + likes.total_likes_count() as u64,
        total_views: catalog.articles.iter().map(|a| u64::from(a.views)).sum(),
        new_users_this_month: catalog
            .users
            .iter()
            .filter(|u| u.created_at >= month_start)
            .count(),
        active_sessions_today: catalog
            .sessions
            .iter()
            .filter(|s| {
                s.status == SessionStatus::Ongoing
                    && s.scheduled_at.is_some_and(|at| at.date_naive() == today)
            })
            .count(),
    }
}

/// Articles by combined like count, highest first; ties by article id
pub fn popular_articles(
    catalog: &Catalog<'_>,
    likes: &LikeLedger,
    limit: usize,
) -> Vec<PopularArticle> {
    let mut articles: Vec<PopularArticle> = catalog
        .articles
        .iter()
        .map(|article| PopularArticle {
            id: article.id.clone(),
            title: article.title.clone(),
            author: catalog
                .users
                .iter()
                .find(|u| u.id == article.author_id)
                .map(|u| u.name.clone())
                .unwrap_or_else(|| article.author_id.clone()),
            likes: article_likes(article, likes),
            views: article.views,
        })
        .collect();
    articles.sort_by(|a, b| b.likes.cmp(&a.likes).then_with(|| a.id.cmp(&b.id)));
    articles.truncate(limit);
    articles
}
