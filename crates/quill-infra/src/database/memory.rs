//! In-memory repositories - used when no database is configured.
//!
//! Records are kept in insertion order so that listings without an explicit
//! sort key come back oldest first, as they do from Postgres.
//! Note: Data is lost on process restart.

use std::cmp::Ordering;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use quill_core::domain::{Page, PageRequest, Post, PostFilter, PostSort, PostStatus, User};
use quill_core::error::RepoError;
use quill_core::ports::{BaseRepository, PostRepository, UserRepository};

/// Slice out one page of already filtered and sorted items.
fn paginate<T: Clone>(items: &[&T], page: PageRequest) -> Page<T> {
    let total = items.len() as u64;
    let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
    let slice = items
        .iter()
        .skip(offset)
        .take(limit)
        .map(|item| (*item).clone())
        .collect();
    Page::new(slice, total)
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// In-memory user store.
pub struct InMemoryUserRepository {
    store: RwLock<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(Vec::new()),
        }
    }

    fn clashes(existing: &User, candidate: &User) -> Option<&'static str> {
        if existing.id == candidate.id {
            return None;
        }
        if existing.email == candidate.email {
            Some("users.email")
        } else if existing.username == candidate.username {
            Some("users.username")
        } else {
            None
        }
    }

    fn newest_first(users: &mut [&User]) {
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let store = self.store.read().await;
        Ok(store.iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, user: User) -> Result<User, RepoError> {
        let mut store = self.store.write().await;
        if store.iter().any(|u| u.id == user.id) {
            return Err(RepoError::Constraint("users.id".to_string()));
        }
        if let Some(column) = store.iter().find_map(|u| Self::clashes(u, &user)) {
            return Err(RepoError::Constraint(column.to_string()));
        }
        store.push(user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, RepoError> {
        let mut store = self.store.write().await;
        if let Some(column) = store.iter().find_map(|u| Self::clashes(u, &user)) {
            return Err(RepoError::Constraint(column.to_string()));
        }
        let slot = store
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or(RepoError::NotFound)?;
        *slot = user.clone();
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut store = self.store.write().await;
        let before = store.len();
        store.retain(|u| u.id != id);
        if store.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let store = self.store.read().await;
        Ok(store.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let store = self.store.read().await;
        Ok(store.iter().find(|u| u.username == username).cloned())
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<User>, RepoError> {
        let store = self.store.read().await;
        Ok(store
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn list(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<User>, RepoError> {
        let needle = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let store = self.store.read().await;
        let mut hits: Vec<&User> = store
            .iter()
            .filter(|u| match &needle {
                None => true,
                Some(n) => {
                    contains_ci(&u.username, n)
                        || contains_ci(&u.email, n)
                        || u.first_name.as_deref().is_some_and(|f| contains_ci(f, n))
                        || u.last_name.as_deref().is_some_and(|l| contains_ci(l, n))
                }
            })
            .collect();
        Self::newest_first(&mut hits);

        Ok(paginate(&hits, page))
    }

    async fn count(&self) -> Result<u64, RepoError> {
        Ok(self.store.read().await.len() as u64)
    }

    async fn recent(&self, limit: u64) -> Result<Vec<User>, RepoError> {
        let store = self.store.read().await;
        let mut users: Vec<&User> = store.iter().collect();
        Self::newest_first(&mut users);
        Ok(users
            .into_iter()
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }
}

/// In-memory post store.
pub struct InMemoryPostRepository {
    store: RwLock<Vec<Post>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(Vec::new()),
        }
    }

    /// Ordering matching the Postgres repository. Sorting is stable, so
    /// `Insertion` keeps the store order.
    fn compare(sort: PostSort, a: &Post, b: &Post) -> Ordering {
        let newest = b.created_at.cmp(&a.created_at);
        match sort {
            PostSort::CreatedAt => newest,
            PostSort::Views => b.views.cmp(&a.views).then(newest),
            PostSort::Likes => b.like_count().cmp(&a.like_count()).then(newest),
            // `None` orders below `Some`, so descending puts unpublished last.
            PostSort::PublishedAt => b.published_at.cmp(&a.published_at).then(newest),
            PostSort::Insertion => Ordering::Equal,
        }
    }
}

impl Default for InMemoryPostRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let store = self.store.read().await;
        Ok(store.iter().find(|p| p.id == id).cloned())
    }

    async fn create(&self, post: Post) -> Result<Post, RepoError> {
        let mut store = self.store.write().await;
        if store.iter().any(|p| p.id == post.id) {
            return Err(RepoError::Constraint("posts.id".to_string()));
        }
        if store.iter().any(|p| p.slug == post.slug) {
            return Err(RepoError::Constraint("posts.slug".to_string()));
        }
        store.push(post.clone());
        Ok(post)
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let mut store = self.store.write().await;
        if store.iter().any(|p| p.id != post.id && p.slug == post.slug) {
            return Err(RepoError::Constraint("posts.slug".to_string()));
        }
        let slot = store
            .iter_mut()
            .find(|p| p.id == post.id)
            .ok_or(RepoError::NotFound)?;
        *slot = post.clone();
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut store = self.store.write().await;
        let before = store.len();
        store.retain(|p| p.id != id);
        if store.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        let store = self.store.read().await;
        Ok(store.iter().find(|p| p.slug == slug).cloned())
    }

    async fn slug_exists(&self, slug: &str, excluding: Option<Uuid>) -> Result<bool, RepoError> {
        let store = self.store.read().await;
        Ok(store
            .iter()
            .any(|p| p.slug == slug && Some(p.id) != excluding))
    }

    async fn list(
        &self,
        filter: &PostFilter,
        sort: PostSort,
        page: PageRequest,
    ) -> Result<Page<Post>, RepoError> {
        let store = self.store.read().await;
        let mut hits: Vec<&Post> = store.iter().filter(|p| filter.matches(p)).collect();
        hits.sort_by(|a, b| Self::compare(sort, a, b));

        Ok(paginate(&hits, page))
    }

    async fn increment_views(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let mut store = self.store.write().await;
        Ok(store.iter_mut().find(|p| p.id == id).map(|post| {
            post.views += 1;
            post.clone()
        }))
    }

    async fn delete_by_author(&self, author_id: Uuid) -> Result<u64, RepoError> {
        let mut store = self.store.write().await;
        let before = store.len();
        store.retain(|p| p.author_id != author_id);
        Ok((before - store.len()) as u64)
    }

    async fn count(&self, filter: &PostFilter) -> Result<u64, RepoError> {
        let store = self.store.read().await;
        Ok(store.iter().filter(|p| filter.matches(p)).count() as u64)
    }

    async fn count_comments(&self) -> Result<u64, RepoError> {
        let store = self.store.read().await;
        Ok(store.iter().map(|p| p.comment_count() as u64).sum())
    }

    async fn recent_published(&self, limit: u64) -> Result<Vec<Post>, RepoError> {
        let store = self.store.read().await;
        let mut posts: Vec<&Post> = store
            .iter()
            .filter(|p| p.status == PostStatus::Published)
            .collect();
        posts.sort_by(|a, b| Self::compare(PostSort::PublishedAt, a, b));
        Ok(posts
            .into_iter()
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }
}
