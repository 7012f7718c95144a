//! Data Transfer Objects - request/response types for the API.
//!
//! Every type serializes with camelCase keys.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

/// Request to register a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Request to login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response containing an access token and the authenticated user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: UserResponse,
}

// ---------------------------------------------------------------------------
// Posts
// ---------------------------------------------------------------------------

/// Body of `POST /posts`.
///
/// `tags` stays untyped so a non-array value can be reported as a field
/// error instead of a body parse failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub featured_image: Option<String>,
    pub tags: Option<Value>,
    pub status: Option<String>,
}

/// Body of `PUT /posts/{id}`. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub featured_image: Option<String>,
    pub tags: Option<Value>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCommentRequest {
    #[serde(default)]
    pub content: String,
}

/// Query string of `GET /posts`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListPostsQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub tag: Option<String>,
    pub author: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
}

/// Reduced user projection embedded in posts and comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorResponse {
    pub id: Uuid,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: Uuid,
    pub author_id: Uuid,
    /// `None` once the commenter's account is gone.
    pub author: Option<AuthorResponse>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub is_approved: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub slug: String,
    pub featured_image: Option<String>,
    pub tags: Vec<String>,
    pub read_time: u32,
    pub views: u64,
    pub likes: Vec<Uuid>,
    pub like_count: usize,
    pub comments: Vec<CommentResponse>,
    pub comment_count: usize,
    pub status: String,
    pub published_at: Option<DateTime<Utc>>,
    pub author_id: Uuid,
    pub author: Option<AuthorResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `{ post }` or `{ message, post }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostEnvelope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub post: PostResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPagination {
    pub current_page: u64,
    pub total_pages: u64,
    pub total_posts: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostListResponse {
    pub posts: Vec<PostResponse>,
    pub pagination: PostPagination,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub message: String,
    pub is_liked: bool,
    pub like_count: usize,
    pub post: PostResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentCreatedResponse {
    pub message: String,
    pub comment: CommentResponse,
    pub comment_count: usize,
    pub post: PostResponse,
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Body of `PUT /users/{id}`. `role` and `isActive` only apply for admins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

/// Query string of `GET /users`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListUsersQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub search: Option<String>,
}

/// Query string of `GET /users/{id}/posts`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPostsQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<String>,
}

/// A user's public information. The password hash never appears here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub posts_count: u64,
}

/// `{ user }` or `{ message, user }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEnvelope<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub user: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPagination {
    pub current_page: u64,
    pub total_pages: u64,
    pub total_users: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserListResponse {
    pub users: Vec<UserResponse>,
    pub pagination: UserPagination,
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewResponse {
    pub total_users: u64,
    pub total_posts: u64,
    pub published_posts: u64,
    pub draft_posts: u64,
    pub total_comments: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentUserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentPostResponse {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    /// Author username.
    pub author: Option<String>,
    pub views: u64,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentActivity {
    pub users: Vec<RecentUserResponse>,
    pub posts: Vec<RecentPostResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub overview: OverviewResponse,
    pub recent: RecentActivity,
}

// ---------------------------------------------------------------------------
// Misc
// ---------------------------------------------------------------------------

/// Bare `{ message }` acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_post_keys_are_camel_case() {
        let body: CreatePostRequest = serde_json::from_str(
            r#"{"title":"T","content":"C","featuredImage":"https://x.io/a.png","tags":"oops"}"#,
        )
        .unwrap();
        assert_eq!(body.featured_image.as_deref(), Some("https://x.io/a.png"));
        assert_eq!(body.tags, Some(Value::String("oops".into())));
    }

    #[test]
    fn test_missing_title_defaults_to_empty() {
        let body: CreatePostRequest = serde_json::from_str(r#"{"content":"C"}"#).unwrap();
        assert!(body.title.is_empty());
    }

    #[test]
    fn test_profile_flattens_user() {
        let now = Utc::now();
        let profile = UserProfileResponse {
            user: UserResponse {
                id: Uuid::nil(),
                username: "alice".into(),
                email: "alice@example.com".into(),
                first_name: None,
                last_name: None,
                bio: None,
                avatar: None,
                role: "user".into(),
                is_active: true,
                created_at: now,
                updated_at: now,
            },
            posts_count: 3,
        };
        let json = serde_json::to_value(UserEnvelope {
            message: None,
            user: profile,
        })
        .unwrap();

        assert_eq!(json["user"]["username"], "alice");
        assert_eq!(json["user"]["postsCount"], 3);
        assert_eq!(json["user"]["isActive"], true);
        assert!(json.get("message").is_none());
        assert!(json["user"].get("passwordHash").is_none());
    }
}
