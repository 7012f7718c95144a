//! Authentication extractors.

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use std::future::Future;
use std::pin::Pin;

use quill_core::DomainError;
use quill_core::domain::{Caller, Role, User};
use quill_core::ports::AuthError;
use quill_shared::ErrorResponse;

use crate::state::AppState;

/// Authenticated user identity extractor.
///
/// Use this in handlers to require authentication:
/// ```ignore
/// async fn protected_route(identity: Identity) -> impl Responder {
///     format!("Hello, user {}!", identity.user_id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: uuid::Uuid,
    pub email: String,
    pub role: Role,
}

impl Identity {
    pub fn caller(&self) -> Caller {
        Caller::new(self.user_id, self.role)
    }
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Error type for authentication failures.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct AuthenticationError(pub AuthError);

impl actix_web::ResponseError for AuthenticationError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        match &self.0 {
            AuthError::LookupFailed(_) | AuthError::HashingError(_) => {
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => actix_web::http::StatusCode::UNAUTHORIZED,
        }
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        let error = match &self.0 {
            AuthError::TokenExpired => ErrorResponse::new(401, "Token Expired")
                .with_detail("Your authentication token has expired. Please login again."),
            AuthError::InvalidToken(msg) => {
                ErrorResponse::new(401, "Invalid Token").with_detail(msg.clone())
            }
            AuthError::MissingAuth => ErrorResponse::new(401, "Authentication Required")
                .with_detail("Please provide a valid Bearer token in the Authorization header."),
            AuthError::InvalidCredentials => ErrorResponse::unauthorized(),
            AuthError::AccountUnavailable => ErrorResponse::new(401, "Account Unavailable")
                .with_detail("The account for this token no longer exists or is disabled."),
            AuthError::LookupFailed(detail) => {
                tracing::error!("Identity lookup failed: {}", detail);
                ErrorResponse::internal_error()
            }
            AuthError::HashingError(_) => ErrorResponse::internal_error(),
        };

        actix_web::HttpResponse::build(self.status_code()).json(error)
    }
}

fn bearer_token(req: &HttpRequest) -> Result<&str, AuthError> {
    let value = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuth)?;
    let value = value
        .to_str()
        .map_err(|_| AuthError::InvalidToken("Invalid authorization header".to_string()))?;
    value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidToken("Expected Bearer token".to_string()))
}

type IdentityFuture = Pin<Box<dyn Future<Output = Result<Identity, AuthError>>>>;

/// Validate the bearer token, then resolve its subject against the store so
/// deleted, deactivated or re-roled users take effect immediately.
fn authenticate(req: &HttpRequest) -> IdentityFuture {
    let Some(state) = req.app_data::<web::Data<AppState>>().cloned() else {
        tracing::error!("AppState not found in app data");
        return Box::pin(async {
            Err(AuthError::LookupFailed("application state missing".to_string()))
        });
    };
    let claims = bearer_token(req).and_then(|token| state.tokens.validate_token(token));

    Box::pin(async move {
        let claims = claims?;
        let user = match state.users.find(claims.user_id).await {
            Ok(user) => user,
            Err(DomainError::NotFound { .. }) => return Err(AuthError::AccountUnavailable),
            Err(other) => return Err(AuthError::LookupFailed(other.to_string())),
        };
        if !user.is_active {
            tracing::warn!(user_id = %user.id, "Rejected token for inactive user");
            return Err(AuthError::AccountUnavailable);
        }
        Ok(Identity::from(&user))
    })
}

impl FromRequest for Identity {
    type Error = AuthenticationError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let identity = authenticate(req);
        Box::pin(async move { identity.await.map_err(AuthenticationError) })
    }
}

/// Optional identity extractor - anonymous when no valid token is present.
pub struct OptionalIdentity(pub Option<Identity>);

impl OptionalIdentity {
    pub fn caller(&self) -> Option<Caller> {
        self.0.as_ref().map(Identity::caller)
    }
}

impl FromRequest for OptionalIdentity {
    type Error = actix_web::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let identity = authenticate(req);
        Box::pin(async move { Ok(OptionalIdentity(identity.await.ok())) })
    }
}
