use crate::api::BlogApi;
use quill_client::models::Category;
use quill_client::ClientError;
use std::sync::Arc;

/// Read-only lookup of post categories. The list keeps the backend's order;
/// nothing here re-sorts it.
pub struct CategoryDirectory {
    api: Arc<dyn BlogApi>,
}

impl CategoryDirectory {
    pub fn new(api: Arc<dyn BlogApi>) -> Self {
        Self { api }
    }

    pub async fn fetch_all(&self) -> Result<Vec<Category>, ClientError> {
        self.api.list_categories(None).await
    }

    /// Single category detail, used for the editor's auxiliary display value.
    pub async fn fetch_one(&self, id: i64) -> Result<Category, ClientError> {
        self.api.get_category(id).await
    }
}
