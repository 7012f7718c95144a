use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{
    Caller, PlatformOverview, PlatformStats, PostFilter, PostStatus, RecentPost,
};
use crate::error::DomainError;
use crate::ports::{PostRepository, UserRepository};

const RECENT_LIMIT: u64 = 5;

/// Aggregate counters for the admin dashboard.
#[derive(Clone)]
pub struct StatsService {
    users: Arc<dyn UserRepository>,
    posts: Arc<dyn PostRepository>,
}

impl StatsService {
    pub fn new(users: Arc<dyn UserRepository>, posts: Arc<dyn PostRepository>) -> Self {
        Self { users, posts }
    }

    /// Every read is issued concurrently; the first failure fails the whole
    /// snapshot.
    pub async fn overview(&self, caller: &Caller) -> Result<PlatformStats, DomainError> {
        caller.require_admin()?;

        let published = PostFilter::by_status(PostStatus::Published);
        let drafts = PostFilter::by_status(PostStatus::Draft);
        let all = PostFilter::default();

        let (
            total_users,
            total_posts,
            published_posts,
            draft_posts,
            total_comments,
            recent_users,
            recent_posts,
        ) = futures::try_join!(
            self.users.count(),
            self.posts.count(&all),
            self.posts.count(&published),
            self.posts.count(&drafts),
            self.posts.count_comments(),
            self.users.recent(RECENT_LIMIT),
            self.posts.recent_published(RECENT_LIMIT),
        )?;

        let mut author_ids: Vec<Uuid> = recent_posts.iter().map(|p| p.author_id).collect();
        author_ids.sort_unstable();
        author_ids.dedup();
        let usernames: HashMap<Uuid, String> = self
            .users
            .find_many(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect();

        let recent_posts = recent_posts
            .into_iter()
            .map(|p| RecentPost {
                author_username: usernames.get(&p.author_id).cloned(),
                id: p.id,
                title: p.title,
                slug: p.slug,
                views: p.views,
                published_at: p.published_at,
            })
            .collect();

        Ok(PlatformStats {
            overview: PlatformOverview {
                total_users,
                total_posts,
                published_posts,
                draft_posts,
                total_comments,
            },
            recent_users,
            recent_posts,
        })
    }
}
