use async_trait::async_trait;
use quill_client::models::{
    AuthResponse, Category, CreatePost, LoginRequest, Post, RegisterRequest, UpdatePost, User,
};
use quill_client::{ApiClient, ClientError};

/// Backend seam for the workflow. The real implementation is the reqwest
/// [`ApiClient`]; tests substitute an in-memory fake.
#[async_trait]
pub trait BlogApi: Send + Sync {
    async fn register(&self, req: &RegisterRequest) -> Result<User, ClientError>;
    async fn login(&self, req: &LoginRequest) -> Result<AuthResponse, ClientError>;
    async fn list_categories(&self, name: Option<&str>) -> Result<Vec<Category>, ClientError>;
    async fn get_category(&self, id: i64) -> Result<Category, ClientError>;
    async fn list_posts(&self) -> Result<Vec<Post>, ClientError>;
    async fn create_post(&self, req: CreatePost) -> Result<Post, ClientError>;
    async fn update_post(&self, id: i64, req: UpdatePost) -> Result<Post, ClientError>;
    async fn delete_post(&self, id: i64) -> Result<(), ClientError>;
}

#[async_trait]
impl BlogApi for ApiClient {
    async fn register(&self, req: &RegisterRequest) -> Result<User, ClientError> {
        ApiClient::register(self, req).await
    }

    async fn login(&self, req: &LoginRequest) -> Result<AuthResponse, ClientError> {
        ApiClient::login(self, req).await
    }

    async fn list_categories(&self, name: Option<&str>) -> Result<Vec<Category>, ClientError> {
        ApiClient::list_categories(self, name).await
    }

    async fn get_category(&self, id: i64) -> Result<Category, ClientError> {
        ApiClient::get_category(self, id).await
    }

    async fn list_posts(&self) -> Result<Vec<Post>, ClientError> {
        ApiClient::list_posts(self).await
    }

    async fn create_post(&self, req: CreatePost) -> Result<Post, ClientError> {
        ApiClient::create_post(self, req).await
    }

    async fn update_post(&self, id: i64, req: UpdatePost) -> Result<Post, ClientError> {
        ApiClient::update_post(self, id, req).await
    }

    async fn delete_post(&self, id: i64) -> Result<(), ClientError> {
        ApiClient::delete_post(self, id).await
    }
}
