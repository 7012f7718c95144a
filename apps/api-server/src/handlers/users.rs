//! User handlers, including the admin stats overview.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use quill_core::domain::PageRequest;
use quill_shared::dto::{
    ListUsersQuery, MessageResponse, PostListResponse, UpdateUserRequest, UserEnvelope,
    UserListResponse, UserPostsQuery,
};

use super::convert;
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/users - admin only.
pub async fn list_users(
    state: web::Data<AppState>,
    identity: Identity,
    query: web::Query<ListUsersQuery>,
) -> AppResult<HttpResponse> {
    let q = query.into_inner();
    let page = PageRequest::new(q.page, q.limit)?;
    let search = convert::non_blank(q.search);

    let result = state
        .users
        .list(&identity.caller(), search.as_deref(), page)
        .await?;

    Ok(HttpResponse::Ok().json(UserListResponse {
        users: result.items.iter().map(convert::user_response).collect(),
        pagination: convert::user_pagination(&result.meta),
    }))
}

/// GET /api/users/{id}
pub async fn get_user(state: web::Data<AppState>, id: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let profile = state.users.profile(id.into_inner()).await?;

    Ok(HttpResponse::Ok().json(UserEnvelope {
        message: None,
        user: convert::profile_response(&profile),
    }))
}

/// GET /api/users/{id}/posts
pub async fn user_posts(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    id: web::Path<Uuid>,
    query: web::Query<UserPostsQuery>,
) -> AppResult<HttpResponse> {
    let q = query.into_inner();
    let page = PageRequest::new(q.page, q.limit)?;
    let status = convert::parse_status(q.status.as_deref())?;
    let caller = identity.caller();

    let result = state
        .users
        .posts(caller.as_ref(), id.into_inner(), status, page)
        .await?;

    Ok(HttpResponse::Ok().json(PostListResponse {
        posts: result.items.iter().map(convert::post_response).collect(),
        pagination: convert::post_pagination(&result.meta),
    }))
}

/// PUT /api/users/{id} - self or admin.
pub async fn update_user(
    state: web::Data<AppState>,
    identity: Identity,
    id: web::Path<Uuid>,
    body: web::Json<UpdateUserRequest>,
) -> AppResult<HttpResponse> {
    let changes = convert::user_changes(body.into_inner())?;
    let user = state
        .users
        .update(&identity.caller(), id.into_inner(), changes)
        .await?;

    Ok(HttpResponse::Ok().json(UserEnvelope {
        message: Some("User updated successfully".to_string()),
        user: convert::user_response(&user),
    }))
}

/// DELETE /api/users/{id} - admin only; removes the user's posts too.
pub async fn delete_user(
    state: web::Data<AppState>,
    identity: Identity,
    id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state
        .users
        .delete(&identity.caller(), id.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(MessageResponse::new("User deleted successfully")))
}

/// GET /api/users/stats/overview - admin only.
pub async fn stats_overview(
    state: web::Data<AppState>,
    identity: Identity,
) -> AppResult<HttpResponse> {
    let stats = state.stats.overview(&identity.caller()).await?;
    Ok(HttpResponse::Ok().json(convert::stats_response(stats)))
}
