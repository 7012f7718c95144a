//! Domain-level error types.

use std::fmt;

use thiserror::Error;
use validator::ValidationErrors;

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Domain errors - business logic failures.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: &'static str, id: String },

    #[error("Validation failed: {}", join_fields(.0))]
    Validation(Vec<FieldError>),

    #[error("Duplicate entity: {0}")]
    Duplicate(String),

    /// Another post already holds the slug derived from the title.
    #[error("Slug conflict: {slug}")]
    SlugConflict { slug: String },

    #[error("Unauthorized access")]
    Unauthorized,

    #[error("Operation not permitted")]
    Forbidden,

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    /// Shorthand for a validation failure on one field.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }
}

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<ValidationErrors> for DomainError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |err| {
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field));
                    FieldError::new(field.to_string(), message)
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        DomainError::Validation(fields)
    }
}

/// Repository-level errors.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// A foreign key points at a row that does not exist.
    #[error("Missing referenced row: {0}")]
    MissingReference(String),

    #[error("Stored data is malformed: {0}")]
    Corrupt(String),
}

impl From<RepoError> for DomainError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Constraint(msg) => DomainError::Duplicate(msg),
            RepoError::NotFound => DomainError::not_found("Entity", "unknown"),
            RepoError::MissingReference(detail) => {
                tracing::warn!(%detail, "Write referenced a missing row");
                DomainError::not_found("Referenced entity", "unknown")
            }
            other => {
                tracing::error!(error = %other, "Repository failure");
                DomainError::Internal(other.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::ValidationError;

    #[test]
    fn test_validation_errors_are_flattened_and_sorted() {
        let mut errors = ValidationErrors::new();
        errors.add(
            "title",
            ValidationError::new("length").with_message("Title is too long".into()),
        );
        errors.add("content", ValidationError::new("length"));

        let DomainError::Validation(fields) = DomainError::from(errors) else {
            panic!("expected a validation error");
        };

        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].field, "content");
        assert_eq!(fields[0].message, "content is invalid");
        assert_eq!(fields[1], FieldError::new("title", "Title is too long"));
    }

    #[test]
    fn test_missing_reference_is_not_a_duplicate() {
        let err = DomainError::from(RepoError::MissingReference(
            "posts_author_id_fkey".to_string(),
        ));
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[test]
    fn test_constraint_maps_to_duplicate() {
        let err = DomainError::from(RepoError::Constraint("slug taken".to_string()));
        assert!(matches!(err, DomainError::Duplicate(msg) if msg == "slug taken"));
    }
}
