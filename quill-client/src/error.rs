use crate::models::FieldErrors;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    // Транспортные ошибки
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    // Бизнес-логика ошибки
    #[error("Resource not found")]
    NotFound,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("HTTP {status}: {message}")]
    Unexpected { status: u16, message: String },
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound)
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized(_))
    }

    /// The field-error map of a validation failure, when the backend sent one.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            ClientError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}
