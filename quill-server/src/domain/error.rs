use std::collections::HashMap;
use thiserror::Error;

/// Field → messages, serialized as the `errors` object of a 422 response.
pub type FieldErrors = HashMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("User not found")]
    UserNotFound,

    #[error("Category not found")]
    CategoryNotFound,

    #[error("Post not found")]
    PostNotFound,

    #[error("User already exists")]
    UserAlreadyExists,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("The given data was invalid")]
    Validation(FieldErrors),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn to_status_code(&self) -> u16 {
        match self {
            Self::UserNotFound | Self::CategoryNotFound | Self::PostNotFound => 404,
            Self::UserAlreadyExists => 409,
            Self::InvalidCredentials | Self::Unauthorized(_) => 401,
            Self::Validation(_) => 422,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Accumulates field errors so a response reports every problem at once
/// instead of only the first.
#[derive(Debug, Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn add(&mut self, field: &str, message: &str) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
    }

    pub fn finish(self) -> Result<(), DomainError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(self.errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validator_collects_every_field() {
        let mut v = Validator::default();
        v.add("title", "The title field is required.");
        v.add("category_id", "The category id field is required.");

        match v.finish() {
            Err(DomainError::Validation(errors)) => {
                assert_eq!(errors.len(), 2);
                assert!(errors.contains_key("title"));
                assert!(errors.contains_key("category_id"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn empty_validator_passes() {
        assert!(Validator::default().finish().is_ok());
    }
}
