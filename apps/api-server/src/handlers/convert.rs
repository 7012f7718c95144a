//! Mapping between wire types and domain types.

use serde_json::Value;
use uuid::Uuid;

use quill_core::domain::{
    AuthorSummary, Comment, NewPost, PageMeta, PlatformStats, PostChanges, PostStatus, Role,
    User, UserChanges, UserProfile,
};
use quill_core::services::PostView;
use quill_shared::dto::{
    AuthorResponse, CommentResponse, CreatePostRequest, OverviewResponse, PostPagination,
    PostResponse, RecentActivity, RecentPostResponse, RecentUserResponse, StatsResponse,
    UpdatePostRequest, UpdateUserRequest, UserPagination, UserProfileResponse, UserResponse,
};

use crate::middleware::error::{AppError, AppResult};

// --- requests -------------------------------------------------------------

/// Tags must be an array of strings when present. `null` counts as absent.
fn parse_tags(tags: Option<Value>) -> AppResult<Option<Vec<String>>> {
    match tags {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(tag) => Ok(tag),
                _ => Err(AppError::invalid("tags", "Tags must be an array of strings")),
            })
            .collect::<AppResult<Vec<_>>>()
            .map(Some),
        Some(_) => Err(AppError::invalid("tags", "Tags must be an array of strings")),
    }
}

pub fn parse_status(status: Option<&str>) -> AppResult<Option<PostStatus>> {
    status
        .map(|s| {
            s.parse().map_err(|_| {
                AppError::invalid("status", "Status must be one of draft, published, archived")
            })
        })
        .transpose()
}

fn parse_role(role: Option<&str>) -> AppResult<Option<Role>> {
    role.map(|r| {
        r.parse()
            .map_err(|_| AppError::invalid("role", "Role must be one of user, admin"))
    })
    .transpose()
}

/// Treat blank query values as absent.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn parse_author(author: Option<String>) -> AppResult<Option<Uuid>> {
    non_blank(author)
        .map(|a| {
            Uuid::parse_str(&a)
                .map_err(|_| AppError::invalid("author", "Author must be a valid user id"))
        })
        .transpose()
}

pub fn new_post(req: CreatePostRequest) -> AppResult<NewPost> {
    Ok(NewPost {
        tags: parse_tags(req.tags)?,
        status: parse_status(req.status.as_deref())?,
        title: req.title,
        content: req.content,
        featured_image: req.featured_image,
    })
}

pub fn post_changes(req: UpdatePostRequest) -> AppResult<PostChanges> {
    Ok(PostChanges {
        tags: parse_tags(req.tags)?,
        status: parse_status(req.status.as_deref())?,
        title: req.title,
        content: req.content,
        featured_image: req.featured_image,
    })
}

pub fn user_changes(req: UpdateUserRequest) -> AppResult<UserChanges> {
    Ok(UserChanges {
        role: parse_role(req.role.as_deref())?,
        first_name: req.first_name,
        last_name: req.last_name,
        bio: req.bio,
        avatar: req.avatar,
        is_active: req.is_active,
    })
}

// --- responses ------------------------------------------------------------

fn author_response(author: &AuthorSummary) -> AuthorResponse {
    AuthorResponse {
        id: author.id,
        username: author.username.clone(),
        first_name: author.first_name.clone(),
        last_name: author.last_name.clone(),
        avatar: author.avatar.clone(),
    }
}

pub fn comment_response(comment: &Comment, view: &PostView) -> CommentResponse {
    CommentResponse {
        id: comment.id,
        author_id: comment.author_id,
        author: view.comment_author(comment.author_id).map(author_response),
        content: comment.content.clone(),
        created_at: comment.created_at,
        is_approved: comment.is_approved,
    }
}

pub fn post_response(view: &PostView) -> PostResponse {
    let post = &view.post;
    PostResponse {
        id: post.id,
        title: post.title.clone(),
        content: post.content.clone(),
        slug: post.slug.clone(),
        featured_image: post.featured_image.clone(),
        tags: post.tags.clone(),
        read_time: post.read_time,
        views: post.views,
        likes: post.likes.clone(),
        like_count: post.like_count(),
        comments: post
            .comments
            .iter()
            .map(|c| comment_response(c, view))
            .collect(),
        comment_count: post.comment_count(),
        status: post.status.to_string(),
        published_at: post.published_at,
        author_id: post.author_id,
        author: view.author.as_ref().map(author_response),
        created_at: post.created_at,
        updated_at: post.updated_at,
    }
}

pub fn post_pagination(meta: &PageMeta) -> PostPagination {
    PostPagination {
        current_page: meta.current_page,
        total_pages: meta.total_pages,
        total_posts: meta.total,
        has_next: meta.has_next,
        has_prev: meta.has_prev,
    }
}

pub fn user_pagination(meta: &PageMeta) -> UserPagination {
    UserPagination {
        current_page: meta.current_page,
        total_pages: meta.total_pages,
        total_users: meta.total,
        has_next: meta.has_next,
        has_prev: meta.has_prev,
    }
}

pub fn user_response(user: &User) -> UserResponse {
    UserResponse {
        id: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        bio: user.bio.clone(),
        avatar: user.avatar.clone(),
        role: user.role.to_string(),
        is_active: user.is_active,
        created_at: user.created_at,
        updated_at: user.updated_at,
    }
}

pub fn profile_response(profile: &UserProfile) -> UserProfileResponse {
    UserProfileResponse {
        user: user_response(&profile.user),
        posts_count: profile.posts_count,
    }
}

pub fn stats_response(stats: PlatformStats) -> StatsResponse {
    let overview = stats.overview;
    StatsResponse {
        overview: OverviewResponse {
            total_users: overview.total_users,
            total_posts: overview.total_posts,
            published_posts: overview.published_posts,
            draft_posts: overview.draft_posts,
            total_comments: overview.total_comments,
        },
        recent: RecentActivity {
            users: stats
                .recent_users
                .into_iter()
                .map(|u| RecentUserResponse {
                    id: u.id,
                    username: u.username,
                    email: u.email,
                    first_name: u.first_name,
                    last_name: u.last_name,
                    created_at: u.created_at,
                })
                .collect(),
            posts: stats
                .recent_posts
                .into_iter()
                .map(|p| RecentPostResponse {
                    id: p.id,
                    title: p.title,
                    slug: p.slug,
                    author: p.author_username,
                    views: p.views,
                    published_at: p.published_at,
                })
                .collect(),
        },
    }
}
