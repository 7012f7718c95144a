//! Post handlers.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use quill_core::domain::{NewComment, PageRequest, PostFilter, PostSort};
use quill_shared::dto::{
    CommentCreatedResponse, CreateCommentRequest, CreatePostRequest, LikeResponse,
    ListPostsQuery, MessageResponse, PostEnvelope, PostListResponse, UpdatePostRequest,
};

use super::convert;
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/posts
pub async fn list_posts(
    state: web::Data<AppState>,
    query: web::Query<ListPostsQuery>,
) -> AppResult<HttpResponse> {
    let q = query.into_inner();
    let page = PageRequest::new(q.page, q.limit)?;
    let filter = PostFilter {
        author_id: convert::parse_author(q.author)?,
        tag: convert::non_blank(q.tag),
        search: convert::non_blank(q.search),
        status: None,
    };
    let sort = PostSort::parse(q.sort.as_deref());

    let result = state.posts.list(filter, sort, page).await?;

    Ok(HttpResponse::Ok().json(PostListResponse {
        posts: result.items.iter().map(convert::post_response).collect(),
        pagination: convert::post_pagination(&result.meta),
    }))
}

/// GET /api/posts/{id} - `id` may also be a slug. Counts a view.
pub async fn get_post(
    state: web::Data<AppState>,
    key: web::Path<String>,
) -> AppResult<HttpResponse> {
    let view = state.posts.get(&key).await?;

    Ok(HttpResponse::Ok().json(PostEnvelope {
        message: None,
        post: convert::post_response(&view),
    }))
}

/// POST /api/posts
pub async fn create_post(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let input = convert::new_post(body.into_inner())?;
    let view = state.posts.create(&identity.caller(), input).await?;

    Ok(HttpResponse::Created().json(PostEnvelope {
        message: Some("Post created successfully".to_string()),
        post: convert::post_response(&view),
    }))
}

/// PUT /api/posts/{id}
pub async fn update_post(
    state: web::Data<AppState>,
    identity: Identity,
    id: web::Path<Uuid>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let changes = convert::post_changes(body.into_inner())?;
    let view = state
        .posts
        .update(&identity.caller(), id.into_inner(), changes)
        .await?;

    Ok(HttpResponse::Ok().json(PostEnvelope {
        message: Some("Post updated successfully".to_string()),
        post: convert::post_response(&view),
    }))
}

/// DELETE /api/posts/{id}
pub async fn delete_post(
    state: web::Data<AppState>,
    identity: Identity,
    id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state
        .posts
        .delete(&identity.caller(), id.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(MessageResponse::new("Post deleted successfully")))
}

/// POST /api/posts/{id}/like
pub async fn toggle_like(
    state: web::Data<AppState>,
    identity: Identity,
    id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let outcome = state
        .posts
        .toggle_like(&identity.caller(), id.into_inner())
        .await?;

    let message = if outcome.liked {
        "Post liked"
    } else {
        "Post unliked"
    };
    Ok(HttpResponse::Ok().json(LikeResponse {
        message: message.to_string(),
        is_liked: outcome.liked,
        like_count: outcome.like_count,
        post: convert::post_response(&outcome.post),
    }))
}

/// POST /api/posts/{id}/comments
pub async fn add_comment(
    state: web::Data<AppState>,
    identity: Identity,
    id: web::Path<Uuid>,
    body: web::Json<CreateCommentRequest>,
) -> AppResult<HttpResponse> {
    let input = NewComment {
        content: body.into_inner().content,
    };
    let outcome = state
        .posts
        .add_comment(&identity.caller(), id.into_inner(), input)
        .await?;

    Ok(HttpResponse::Created().json(CommentCreatedResponse {
        message: "Comment added successfully".to_string(),
        comment: convert::comment_response(&outcome.comment, &outcome.post),
        comment_count: outcome.comment_count,
        post: convert::post_response(&outcome.post),
    }))
}
