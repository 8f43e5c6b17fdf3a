use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ==================== Модели пользователей ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// ==================== Категории и посты ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// A published post as the backend returns it. The author serializes as
/// `user` on the wire; `image` is a server-relative path when present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub image: Option<String>,
    pub category: Option<Category>,
    #[serde(rename = "user")]
    pub author: User,
    pub created_at: DateTime<Utc>,
}

// ==================== Запросы мутаций ====================

/// An image chosen for upload: raw bytes plus the original filename the
/// server uses to pick an extension.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreatePost {
    pub user_id: i64,
    pub title: String,
    pub content: String,
    pub category_id: i64,
    pub image: Option<ImageUpload>,
}

/// The `image` part of an update submission. The editor never removes an
/// image: either a replacement file is uploaded, or the prior path is resent
/// unchanged, or the post never had one.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageField {
    Upload(ImageUpload),
    Path(String),
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdatePost {
    pub title: String,
    pub content: String,
    /// `None` is sent as an empty `category_id`; the backend validates it.
    pub category_id: Option<i64>,
    pub image: ImageField,
}

// ==================== Ошибки бэкенда ====================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Field → messages map from a 422 validation response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(pub HashMap<String, Vec<String>>);

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// All messages joined with `", "`, field order made deterministic.
    pub fn joined(&self) -> String {
        let mut fields: Vec<&String> = self.0.keys().collect();
        fields.sort();
        let mut messages = Vec::new();
        for field in fields {
            for message in &self.0[field] {
                messages.push(message.as_str());
            }
        }
        messages.join(", ")
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.joined())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidationResponse {
    pub errors: FieldErrors,
}
