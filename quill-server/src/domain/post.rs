use super::category::Category;
use super::user::UserResponse;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A post with its author and category embedded, as the API serves it.
/// The author serializes under the `user` key.
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub image: Option<String>,
    pub category: Option<Category>,
    #[serde(rename = "user")]
    pub author: UserResponse,
    pub created_at: DateTime<Utc>,
}

/// An image file received in a multipart request.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Decoded `POST /api/create-post` payload. Absent or unparsable numeric
/// fields arrive as `None` and fail validation, not parsing.
#[derive(Debug, Default)]
pub struct CreatePostData {
    pub author_id: Option<i64>,
    pub title: String,
    pub content: String,
    pub category_id: Option<i64>,
    pub image: Option<UploadedImage>,
}

/// Decoded `PUT /api/posts/{id}` payload. `image` is only set for a new
/// upload; resending the prior path keeps the stored file untouched.
#[derive(Debug, Default)]
pub struct UpdatePostData {
    pub title: String,
    pub content: String,
    pub category_id: Option<i64>,
    pub image: Option<UploadedImage>,
}
