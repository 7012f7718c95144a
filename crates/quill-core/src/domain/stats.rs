use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::User;

/// Platform-wide counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlatformOverview {
    pub total_users: u64,
    pub total_posts: u64,
    pub published_posts: u64,
    pub draft_posts: u64,
    pub total_comments: u64,
}

/// Reduced projection of a recently published post.
#[derive(Debug, Clone)]
pub struct RecentPost {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub author_username: Option<String>,
    pub views: u64,
    pub published_at: Option<DateTime<Utc>>,
}

/// Admin dashboard snapshot.
#[derive(Debug, Clone)]
pub struct PlatformStats {
    pub overview: PlatformOverview,
    pub recent_users: Vec<User>,
    pub recent_posts: Vec<RecentPost>,
}
