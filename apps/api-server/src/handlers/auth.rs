//! Authentication handlers.

use actix_web::{HttpResponse, web};

use quill_core::domain::{NewUser, User};
use quill_shared::dto::{AuthResponse, LoginRequest, RegisterUserRequest, UserEnvelope};

use super::convert;
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

fn auth_response(state: &AppState, user: &User) -> AppResult<AuthResponse> {
    let token = state.tokens.issue_for(user)?;
    Ok(AuthResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: u64::try_from(state.tokens.expiration_seconds()).unwrap_or(0),
        user: convert::user_response(user),
    })
}

/// POST /api/auth/register
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterUserRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let input = NewUser {
        username: req.username.trim().to_string(),
        email: req.email,
        password: req.password,
        first_name: req.first_name,
        last_name: req.last_name,
    };

    let user = state
        .users
        .register(input, state.passwords.as_ref())
        .await?;

    Ok(HttpResponse::Created().json(auth_response(&state, &user)?))
}

/// POST /api/auth/login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let user = state
        .users
        .authenticate(&req.email, &req.password, state.passwords.as_ref())
        .await?;

    tracing::info!(user_id = %user.id, "User logged in");
    Ok(HttpResponse::Ok().json(auth_response(&state, &user)?))
}

/// GET /api/auth/me - Protected route
pub async fn me(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let user = state.users.find(identity.user_id).await?;

    Ok(HttpResponse::Ok().json(UserEnvelope {
        message: None,
        user: convert::user_response(&user),
    }))
}
