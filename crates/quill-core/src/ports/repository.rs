use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Page, PageRequest, Post, PostFilter, PostSort, User};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Insert a new entity.
    async fn create(&self, entity: T) -> Result<T, RepoError>;

    /// Overwrite an existing entity. Fails with `RepoError::NotFound` if absent.
    async fn update(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    /// Fetch every user whose id is in `ids`. Missing ids are skipped.
    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<User>, RepoError>;

    /// Newest first; `search` matches username, email, first or last name
    /// case-insensitively.
    async fn list(&self, search: Option<&str>, page: PageRequest)
    -> Result<Page<User>, RepoError>;

    async fn count(&self) -> Result<u64, RepoError>;

    /// The `limit` most recently created users.
    async fn recent(&self, limit: u64) -> Result<Vec<User>, RepoError>;
}

/// Post repository.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError>;

    /// Whether `slug` is held by any post other than `excluding`.
    async fn slug_exists(&self, slug: &str, excluding: Option<Uuid>) -> Result<bool, RepoError>;

    async fn list(
        &self,
        filter: &PostFilter,
        sort: PostSort,
        page: PageRequest,
    ) -> Result<Page<Post>, RepoError>;

    /// Bump the view counter in place and return the updated post.
    async fn increment_views(&self, id: Uuid) -> Result<Option<Post>, RepoError>;

    /// Delete every post written by `author_id`, returning how many went.
    async fn delete_by_author(&self, author_id: Uuid) -> Result<u64, RepoError>;

    async fn count(&self, filter: &PostFilter) -> Result<u64, RepoError>;

    /// Sum of comment counts across all posts.
    async fn count_comments(&self) -> Result<u64, RepoError>;

    /// The `limit` most recently published posts.
    async fn recent_published(&self, limit: u64) -> Result<Vec<Post>, RepoError>;
}

