//! Error handling middleware - RFC 7807 compliant responses.

use actix_web::{HttpRequest, HttpResponse, ResponseError, http::StatusCode};
use quill_core::error::{DomainError, FieldError, RepoError};
use quill_core::ports::AuthError;
use quill_shared::{ErrorResponse, FieldErrorResponse};

/// Application-level error type that converts to RFC 7807 responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden")]
    Forbidden,
    #[error("Conflict: {0}")]
    Conflict(String),
    /// A slug clash is reported as a client error on the submitted title.
    #[error("Slug conflict: {0}")]
    SlugConflict(String),
    #[error("Internal error: {0}")]
    Internal(String),
    #[error("Validation failed: {0:?}")]
    Validation(Vec<FieldError>),
}

impl AppError {
    pub fn invalid(field: &str, message: &str) -> Self {
        AppError::Validation(vec![FieldError::new(field, message)])
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Validation(_) | AppError::SlugConflict(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            AppError::NotFound(detail) => ErrorResponse::not_found(detail),
            AppError::BadRequest(detail) => ErrorResponse::bad_request(detail),
            AppError::Unauthorized => {
                ErrorResponse::unauthorized().with_detail("Invalid email or password")
            }
            AppError::Forbidden => ErrorResponse::forbidden()
                .with_detail("You do not have permission to perform this action"),
            AppError::Conflict(detail) => ErrorResponse::conflict(detail),
            AppError::SlugConflict(slug) => ErrorResponse::new(400, "Conflict").with_detail(
                format!("A post with the slug '{slug}' already exists"),
            ),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                ErrorResponse::internal_error()
            }
            AppError::Validation(errors) => ErrorResponse::validation(
                errors
                    .iter()
                    .map(|e| FieldErrorResponse {
                        field: e.field.clone(),
                        message: e.message.clone(),
                    })
                    .collect(),
            ),
        };

        HttpResponse::build(self.status_code()).json(error)
    }
}

// Conversion from domain errors
impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { entity_type, id } => {
                AppError::NotFound(format!("{} '{}' not found", entity_type, id))
            }
            DomainError::Validation(errors) => AppError::Validation(errors),
            DomainError::Duplicate(msg) => AppError::Conflict(msg),
            DomainError::SlugConflict { slug } => AppError::SlugConflict(slug),
            DomainError::Unauthorized => AppError::Unauthorized,
            DomainError::Forbidden => AppError::Forbidden,
            DomainError::InvalidOperation(msg) => AppError::BadRequest(msg),
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        DomainError::from(err).into()
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => AppError::Unauthorized,
            other => AppError::Internal(other.to_string()),
        }
    }
}

/// Body parse failures (malformed JSON, wrong types, bad content type).
pub fn json_error_handler(
    err: actix_web::error::JsonPayloadError,
    _: &HttpRequest,
) -> actix_web::Error {
    AppError::BadRequest(err.to_string()).into()
}

/// Query string parse failures (e.g. `page=abc`).
pub fn query_error_handler(
    err: actix_web::error::QueryPayloadError,
    _: &HttpRequest,
) -> actix_web::Error {
    AppError::BadRequest(err.to_string()).into()
}

/// Path segments that do not parse (e.g. a non-UUID id) address nothing.
pub fn path_error_handler(_: actix_web::error::PathError, req: &HttpRequest) -> actix_web::Error {
    AppError::NotFound(format!("No resource at {}", req.path())).into()
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use actix_web::body::to_bytes;

    use super::*;

    #[actix_web::test]
    async fn test_validation_renders_field_list() {
        let err = AppError::from(DomainError::invalid("title", "Title is required"));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["errors"][0]["field"], "title");
        assert_eq!(json["errors"][0]["message"], "Title is required");
    }

    #[test]
    fn test_domain_error_status_codes() {
        let cases = [
            (DomainError::not_found("Post", "x"), StatusCode::NOT_FOUND),
            (DomainError::Duplicate("email".into()), StatusCode::CONFLICT),
            (
                DomainError::SlugConflict {
                    slug: "taken".into(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (DomainError::Forbidden, StatusCode::FORBIDDEN),
            (
                DomainError::InvalidOperation("self".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                DomainError::Internal("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status_code(), status);
        }
    }

    #[actix_web::test]
    async fn test_slug_conflict_body_keeps_conflict_title() {
        let err = AppError::from(DomainError::SlugConflict {
            slug: "hello-world".into(),
        });
        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], 400);
        assert_eq!(json["title"], "Conflict");
        assert!(json["detail"].as_str().unwrap().contains("hello-world"));
    }

    #[actix_web::test]
    async fn test_internal_detail_is_not_leaked() {
        let err = AppError::Internal("connection refused to 10.0.0.5".into());
        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(!text.contains("10.0.0.5"));
    }
}
