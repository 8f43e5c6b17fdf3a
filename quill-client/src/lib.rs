pub mod error;
pub mod http_client;
pub mod models;

pub use error::ClientError;
pub use http_client::ApiClient;
pub use models::{
    AuthResponse, Category, CreatePost, FieldErrors, ImageField, ImageUpload, LoginRequest, Post,
    RegisterRequest, UpdatePost, User,
};
