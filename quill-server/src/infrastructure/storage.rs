use crate::domain::DomainError;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Writes uploaded images under the configured upload root and hands back
/// the server-relative path stored on the post row.
pub struct ImageStorage {
    root: PathBuf,
}

impl ImageStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<String, DomainError> {
        let filename = format!("{}.{}", Uuid::new_v4(), safe_extension(original_name));
        let dir = self.root.join("images");

        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| DomainError::Internal(format!("Failed to prepare upload dir: {}", e)))?;
        tokio::fs::write(dir.join(&filename), bytes)
            .await
            .map_err(|e| DomainError::Internal(format!("Failed to store image: {}", e)))?;

        tracing::debug!("Stored uploaded image as {}", filename);
        Ok(format!("images/{}", filename))
    }
}

/// Extension taken from the client's filename, constrained to something
/// that can never escape the upload directory.
fn safe_extension(original_name: &str) -> String {
    let ext = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");
    if !ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        ext.to_ascii_lowercase()
    } else {
        "bin".to_string()
    }
}
