use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use super::view::{PostView, with_author, with_authors};
use crate::domain::{
    Caller, Comment, NewComment, NewPost, Page, PageRequest, Paginated, Post, PostChanges,
    PostFilter, PostKey, PostSort,
};
use crate::error::{DomainError, RepoError};
use crate::ports::{PostRepository, UserRepository};

/// Result of a like toggle.
#[derive(Debug, Clone)]
pub struct LikeOutcome {
    pub liked: bool,
    pub like_count: usize,
    pub post: PostView,
}

/// Result of appending a comment.
#[derive(Debug, Clone)]
pub struct CommentOutcome {
    pub comment: Comment,
    pub comment_count: usize,
    pub post: PostView,
}

/// Post use cases: listing, lookup, authoring, likes and comments.
#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
}

impl PostService {
    pub fn new(posts: Arc<dyn PostRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { posts, users }
    }

    pub async fn list(
        &self,
        filter: PostFilter,
        sort: PostSort,
        page: PageRequest,
    ) -> Result<Paginated<PostView>, DomainError> {
        let found = self.posts.list(&filter, sort, page).await?;
        let total = found.total;
        let items = with_authors(self.users.as_ref(), found.items).await?;

        Ok(Paginated::new(Page::new(items, total), page))
    }

    /// Fetch a post by id or slug and count the view.
    pub async fn get(&self, key: &str) -> Result<PostView, DomainError> {
        let key = PostKey::parse(key);
        let found = match &key {
            PostKey::Id(id) => self.posts.find_by_id(*id).await?,
            PostKey::Slug(slug) => self.posts.find_by_slug(slug).await?,
        };
        let post = found.ok_or_else(|| DomainError::not_found("Post", &key))?;

        let viewed = self
            .posts
            .increment_views(post.id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", post.id))?;

        with_author(self.users.as_ref(), viewed).await
    }

    #[instrument(skip(self, input), fields(author_id = %caller.id))]
    pub async fn create(&self, caller: &Caller, input: NewPost) -> Result<PostView, DomainError> {
        input.check()?;

        let post = Post::new(caller.id, input);
        if self.posts.slug_exists(&post.slug, None).await? {
            return Err(slug_conflict(&post.slug));
        }

        let slug = post.slug.clone();
        let saved = self
            .posts
            .create(post)
            .await
            .map_err(|err| slug_race(err, &slug))?;
        tracing::info!(post_id = %saved.id, slug = %saved.slug, "Post created");

        with_author(self.users.as_ref(), saved).await
    }

    #[instrument(skip(self, changes), fields(caller_id = %caller.id))]
    pub async fn update(
        &self,
        caller: &Caller,
        id: Uuid,
        changes: PostChanges,
    ) -> Result<PostView, DomainError> {
        changes.check()?;

        let mut post = self.load(id).await?;
        if !post.can_be_modified_by(caller) {
            return Err(DomainError::Forbidden);
        }

        let previous_slug = post.slug.clone();
        post.apply(changes);
        if post.slug != previous_slug && self.posts.slug_exists(&post.slug, Some(post.id)).await?
        {
            return Err(slug_conflict(&post.slug));
        }

        let slug = post.slug.clone();
        let saved = self
            .posts
            .update(post)
            .await
            .map_err(|err| slug_race(err, &slug))?;
        tracing::info!(post_id = %saved.id, "Post updated");

        with_author(self.users.as_ref(), saved).await
    }

    #[instrument(skip(self), fields(caller_id = %caller.id))]
    pub async fn delete(&self, caller: &Caller, id: Uuid) -> Result<(), DomainError> {
        let post = self.load(id).await?;
        if !post.can_be_modified_by(caller) {
            return Err(DomainError::Forbidden);
        }

        self.posts.delete(id).await?;
        tracing::info!(post_id = %id, "Post deleted");
        Ok(())
    }

    #[instrument(skip(self), fields(caller_id = %caller.id))]
    pub async fn toggle_like(&self, caller: &Caller, id: Uuid) -> Result<LikeOutcome, DomainError> {
        let mut post = self.load(id).await?;
        let liked = post.toggle_like(caller.id);

        let saved = self.posts.update(post).await?;
        tracing::debug!(post_id = %id, liked, "Like toggled");

        Ok(LikeOutcome {
            liked,
            like_count: saved.like_count(),
            post: with_author(self.users.as_ref(), saved).await?,
        })
    }

    #[instrument(skip(self, input), fields(caller_id = %caller.id))]
    pub async fn add_comment(
        &self,
        caller: &Caller,
        id: Uuid,
        input: NewComment,
    ) -> Result<CommentOutcome, DomainError> {
        input.check()?;

        let mut post = self.load(id).await?;
        let comment = Comment::new(caller.id, input.content);
        post.add_comment(comment.clone());

        let saved = self.posts.update(post).await?;
        tracing::info!(post_id = %id, comment_id = %comment.id, "Comment added");

        Ok(CommentOutcome {
            comment,
            comment_count: saved.comment_count(),
            post: with_author(self.users.as_ref(), saved).await?,
        })
    }

    async fn load(&self, id: Uuid) -> Result<Post, DomainError> {
        self.posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", id))
    }
}

fn slug_conflict(slug: &str) -> DomainError {
    DomainError::SlugConflict {
        slug: slug.to_string(),
    }
}

/// The only unique column on posts is the slug, so a constraint hit on write
/// means a concurrent writer took it after the existence check.
fn slug_race(err: RepoError, slug: &str) -> DomainError {
    match err {
        RepoError::Constraint(_) => slug_conflict(slug),
        other => other.into(),
    }
}
