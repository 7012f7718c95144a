use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::slug::slugify;
use super::validation::validate_featured_image;
use crate::error::{DomainError, FieldError};

pub const WORDS_PER_MINUTE: usize = 200;

/// Estimated reading time in minutes, rounded up.
pub fn read_time(content: &str) -> u32 {
    let words = content.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE) as u32
}

/// Lowercase and trim every tag, keeping the original order.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|tag| tag.trim().to_lowercase())
        .collect()
}

/// Publication state of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    #[default]
    Published,
    Archived,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
            PostStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            "archived" => Ok(PostStatus::Archived),
            other => Err(format!("unknown post status '{}'", other)),
        }
    }
}

/// A comment attached to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub is_approved: bool,
}

impl Comment {
    pub fn new(author_id: Uuid, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            author_id,
            content,
            created_at: Utc::now(),
            is_approved: true,
        }
    }
}

/// Post entity - represents a blog post or article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub slug: String,
    pub featured_image: Option<String>,
    pub tags: Vec<String>,
    pub read_time: u32,
    pub views: u64,
    pub likes: Vec<Uuid>,
    pub comments: Vec<Comment>,
    pub status: PostStatus,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a new post from validated input.
    pub fn new(author_id: Uuid, input: NewPost) -> Self {
        let now = Utc::now();
        let status = input.status.unwrap_or_default();
        Self {
            id: Uuid::new_v4(),
            author_id,
            slug: slugify(&input.title),
            read_time: read_time(&input.content),
            title: input.title,
            content: input.content,
            featured_image: input.featured_image,
            tags: normalize_tags(input.tags.unwrap_or_default()),
            views: 0,
            likes: Vec::new(),
            comments: Vec::new(),
            status,
            published_at: (status == PostStatus::Published).then_some(now),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn like_count(&self) -> usize {
        self.likes.len()
    }

    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }

    pub fn is_liked_by(&self, user_id: Uuid) -> bool {
        self.likes.contains(&user_id)
    }

    pub fn can_be_modified_by(&self, caller: &super::Caller) -> bool {
        caller.is_admin() || caller.id == self.author_id
    }

    /// Flip the like of `user_id`. Returns `true` when the post is now liked.
    pub fn toggle_like(&mut self, user_id: Uuid) -> bool {
        if let Some(pos) = self.likes.iter().position(|id| *id == user_id) {
            self.likes.remove(pos);
            false
        } else {
            self.likes.push(user_id);
            true
        }
    }

    pub fn add_comment(&mut self, comment: Comment) {
        self.comments.push(comment);
    }

    /// Apply a partial update. Title and content changes refresh the derived
    /// slug and read time respectively.
    pub fn apply(&mut self, changes: PostChanges) {
        if let Some(title) = changes.title {
            if title != self.title {
                self.slug = slugify(&title);
            }
            self.title = title;
        }
        if let Some(content) = changes.content {
            if content != self.content {
                self.read_time = read_time(&content);
            }
            self.content = content;
        }
        if let Some(featured_image) = changes.featured_image {
            self.featured_image = Some(featured_image);
        }
        if let Some(tags) = changes.tags {
            self.tags = normalize_tags(tags);
        }
        if let Some(status) = changes.status {
            self.set_status(status);
        }
        self.updated_at = Utc::now();
    }

    fn set_status(&mut self, status: PostStatus) {
        if status == PostStatus::Published && self.published_at.is_none() {
            self.published_at = Some(Utc::now());
        }
        self.status = status;
    }
}

/// Input for creating a post.
#[derive(Debug, Clone, Default, Validate)]
pub struct NewPost {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,
    #[validate(length(
        min = 1,
        max = 50000,
        message = "Content must be between 1 and 50000 characters"
    ))]
    pub content: String,
    #[validate(custom(function = "validate_featured_image"))]
    pub featured_image: Option<String>,
    pub tags: Option<Vec<String>>,
    pub status: Option<PostStatus>,
}

impl NewPost {
    /// Run field validation plus the derived-slug check.
    pub fn check(&self) -> Result<(), DomainError> {
        self.validate()?;
        ensure_sluggable(&self.title)
    }
}

/// Partial update of a post. Every field is optional.
#[derive(Debug, Clone, Default, Validate)]
pub struct PostChanges {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: Option<String>,
    #[validate(length(
        min = 1,
        max = 50000,
        message = "Content must be between 1 and 50000 characters"
    ))]
    pub content: Option<String>,
    #[validate(custom(function = "validate_featured_image"))]
    pub featured_image: Option<String>,
    pub tags: Option<Vec<String>>,
    pub status: Option<PostStatus>,
}

impl PostChanges {
    pub fn check(&self) -> Result<(), DomainError> {
        self.validate()?;
        match &self.title {
            Some(title) => ensure_sluggable(title),
            None => Ok(()),
        }
    }
}

/// Input for appending a comment.
#[derive(Debug, Clone, Validate)]
pub struct NewComment {
    #[validate(length(
        min = 1,
        max = 1000,
        message = "Comment must be between 1 and 1000 characters"
    ))]
    pub content: String,
}

impl NewComment {
    pub fn check(&self) -> Result<(), DomainError> {
        self.validate()?;
        Ok(())
    }
}

fn ensure_sluggable(title: &str) -> Result<(), DomainError> {
    if slugify(title).is_empty() {
        return Err(DomainError::Validation(vec![FieldError::new(
            "title",
            "Title must contain at least one letter or digit",
        )]));
    }
    Ok(())
}

/// Sort order for post listings. All explicit keys sort descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostSort {
    #[default]
    CreatedAt,
    Views,
    Likes,
    /// Publication time, unpublished posts last, then creation time.
    PublishedAt,
    /// Unrecognised key: insertion order (oldest first).
    Insertion,
}

impl PostSort {
    /// Parse a client-supplied sort key. Unknown keys fall back to insertion order.
    pub fn parse(key: Option<&str>) -> Self {
        match key {
            None | Some("createdAt") => PostSort::CreatedAt,
            Some("views") => PostSort::Views,
            Some("likes") => PostSort::Likes,
            Some(_) => PostSort::Insertion,
        }
    }
}

/// Filters applied to a post listing. All present filters must match.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub author_id: Option<Uuid>,
    /// Case-insensitive substring of any tag.
    pub tag: Option<String>,
    /// Case-insensitive substring of title, content or any tag.
    pub search: Option<String>,
    pub status: Option<PostStatus>,
}

impl PostFilter {
    pub fn by_status(status: PostStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn by_author(author_id: Uuid, status: Option<PostStatus>) -> Self {
        Self {
            author_id: Some(author_id),
            status,
            ..Default::default()
        }
    }

    /// In-process evaluation of the filter.
    pub fn matches(&self, post: &Post) -> bool {
        if let Some(author_id) = self.author_id {
            if post.author_id != author_id {
                return false;
            }
        }
        if let Some(status) = self.status {
            if post.status != status {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            let needle = tag.to_lowercase();
            if !post.tags.iter().any(|t| t.to_lowercase().contains(&needle)) {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let hit = post.title.to_lowercase().contains(&needle)
                || post.content.to_lowercase().contains(&needle)
                || post.tags.iter().any(|t| t.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        true
    }
}

/// How a post is addressed in a lookup: by id or by slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostKey {
    Id(Uuid),
    Slug(String),
}

impl PostKey {
    /// Only the hyphenated UUID form is an id; a bare 32-digit hex string is a slug.
    pub fn parse(raw: &str) -> Self {
        const HYPHENATED_LEN: usize = 36;
        if raw.len() == HYPHENATED_LEN {
            if let Ok(id) = Uuid::try_parse(raw) {
                return PostKey::Id(id);
            }
        }
        PostKey::Slug(raw.to_string())
    }
}

impl fmt::Display for PostKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostKey::Id(id) => write!(f, "{}", id),
            PostKey::Slug(slug) => f.write_str(slug),
        }
    }
}
