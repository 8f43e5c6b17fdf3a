use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Session store error: {0}")]
    Session(#[from] std::io::Error),

    #[error("Could not determine a session directory")]
    NoSessionDir,
}
