use crate::validator::ValidationErrors;

/// Domain-level error surfaced to the HTTP boundary.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity}")]
    NotFound { entity: &'static str },

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Update conflict: {0}")]
    UpdateConflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ValidationErrors> for CoreError {
    fn from(errors: ValidationErrors) -> Self {
        CoreError::Validation(errors)
    }
}
