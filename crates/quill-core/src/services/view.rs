//! Read models combining posts with the users they reference.

use std::collections::HashMap;

use uuid::Uuid;

use crate::domain::{AuthorSummary, Post};
use crate::error::DomainError;
use crate::ports::UserRepository;

/// A post together with the projections of its author and commenters.
#[derive(Debug, Clone)]
pub struct PostView {
    pub post: Post,
    pub author: Option<AuthorSummary>,
    pub comment_authors: HashMap<Uuid, AuthorSummary>,
}

impl PostView {
    pub fn comment_author(&self, author_id: Uuid) -> Option<&AuthorSummary> {
        self.comment_authors.get(&author_id)
    }
}

/// Resolve the authors of `posts` (and of their comments) in one lookup.
pub(crate) async fn with_authors(
    users: &dyn UserRepository,
    posts: Vec<Post>,
) -> Result<Vec<PostView>, DomainError> {
    let mut ids: Vec<Uuid> = posts
        .iter()
        .flat_map(|p| std::iter::once(p.author_id).chain(p.comments.iter().map(|c| c.author_id)))
        .collect();
    ids.sort_unstable();
    ids.dedup();

    let directory: HashMap<Uuid, AuthorSummary> = if ids.is_empty() {
        HashMap::new()
    } else {
        users
            .find_many(&ids)
            .await?
            .iter()
            .map(|u| (u.id, AuthorSummary::from(u)))
            .collect()
    };

    Ok(posts
        .into_iter()
        .map(|post| {
            let comment_authors = post
                .comments
                .iter()
                .filter_map(|c| directory.get(&c.author_id).map(|a| (c.author_id, a.clone())))
                .collect();
            PostView {
                author: directory.get(&post.author_id).cloned(),
                comment_authors,
                post,
            }
        })
        .collect())
}

pub(crate) async fn with_author(
    users: &dyn UserRepository,
    post: Post,
) -> Result<PostView, DomainError> {
    let id = post.id;
    with_authors(users, vec![post])
        .await?
        .pop()
        .ok_or_else(|| DomainError::Internal(format!("post {} lost during enrichment", id)))
}
