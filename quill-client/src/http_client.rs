use crate::error::ClientError;
use crate::models::{
    AuthResponse, Category, CreatePost, ErrorResponse, ImageField, LoginRequest, Post,
    RegisterRequest, UpdatePost, User, ValidationResponse,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Typed client for the `/api` surface.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into(),
            token: None,
        }
    }

    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub fn clear_token(&mut self) {
        self.token = None;
    }

    fn add_auth_header(&self, mut request: RequestBuilder) -> RequestBuilder {
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        request
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    // ==================== Аутентификация ====================

    pub async fn register(&self, req: &RegisterRequest) -> Result<User, ClientError> {
        let url = self.url("/api/register");
        tracing::debug!("POST {}", url);
        let response = self.client.post(&url).json(req).send().await?;
        handle_response(response, &[StatusCode::CREATED, StatusCode::OK]).await
    }

    pub async fn login(&self, req: &LoginRequest) -> Result<AuthResponse, ClientError> {
        let url = self.url("/api/login");
        tracing::debug!("POST {}", url);
        let response = self.client.post(&url).json(req).send().await?;
        handle_response(response, &[StatusCode::OK]).await
    }

    /// Fetch the user the stored bearer token belongs to.
    pub async fn current_user(&self) -> Result<User, ClientError> {
        let url = self.url("/api/user");
        let response = self.add_auth_header(self.client.get(&url)).send().await?;
        handle_response(response, &[StatusCode::OK]).await
    }

    // ==================== Категории ====================

    pub async fn list_categories(&self, name: Option<&str>) -> Result<Vec<Category>, ClientError> {
        let mut request = self.client.get(self.url("/api/categories"));
        if let Some(name) = name {
            request = request.query(&[("name", name)]);
        }
        let response = request.send().await?;
        handle_response(response, &[StatusCode::OK]).await
    }

    pub async fn get_category(&self, id: i64) -> Result<Category, ClientError> {
        let url = self.url(&format!("/api/categories/{}", id));
        let response = self.client.get(&url).send().await?;
        handle_response(response, &[StatusCode::OK]).await
    }

    // ==================== Посты ====================

    pub async fn list_posts(&self) -> Result<Vec<Post>, ClientError> {
        let url = self.url("/api/posts");
        let response = self.client.get(&url).send().await?;
        handle_response(response, &[StatusCode::OK]).await
    }

    pub async fn create_post(&self, req: CreatePost) -> Result<Post, ClientError> {
        let url = self.url("/api/create-post");
        tracing::debug!("POST {} (multipart)", url);

        let mut form = Form::new()
            .text("user_id", req.user_id.to_string())
            .text("title", req.title)
            .text("content", req.content)
            .text("category_id", req.category_id.to_string());
        if let Some(image) = req.image {
            form = form.part("image", Part::bytes(image.bytes).file_name(image.filename));
        }

        let response = self.client.post(&url).multipart(form).send().await?;
        handle_response(response, &[StatusCode::CREATED, StatusCode::OK]).await
    }

    pub async fn update_post(&self, id: i64, req: UpdatePost) -> Result<Post, ClientError> {
        let url = self.url(&format!("/api/posts/{}", id));
        tracing::debug!("PUT {} (multipart)", url);

        let mut form = Form::new()
            .text("title", req.title)
            .text("content", req.content)
            .text(
                "category_id",
                req.category_id.map(|id| id.to_string()).unwrap_or_default(),
            );
        form = match req.image {
            ImageField::Upload(image) => {
                form.part("image", Part::bytes(image.bytes).file_name(image.filename))
            }
            ImageField::Path(path) => form.text("image", path),
            ImageField::Empty => form,
        };

        let response = self.client.put(&url).multipart(form).send().await?;
        handle_response(response, &[StatusCode::OK]).await
    }

    pub async fn delete_post(&self, id: i64) -> Result<(), ClientError> {
        let url = self.url(&format!("/api/posts/{}", id));
        let response = self.client.delete(&url).send().await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(error_from(status, response.text().await?))
        }
    }
}

async fn handle_response<T: DeserializeOwned>(
    response: Response,
    expected: &[StatusCode],
) -> Result<T, ClientError> {
    let status = response.status();
    if expected.contains(&status) {
        Ok(response.json::<T>().await?)
    } else {
        Err(error_from(status, response.text().await?))
    }
}

fn error_from(status: StatusCode, body: String) -> ClientError {
    match status {
        StatusCode::NOT_FOUND => ClientError::NotFound,
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized(error_message(body)),
        StatusCode::UNPROCESSABLE_ENTITY => {
            match serde_json::from_str::<ValidationResponse>(&body) {
                Ok(validation) => ClientError::Validation(validation.errors),
                Err(_) => ClientError::Unexpected {
                    status: status.as_u16(),
                    message: body,
                },
            }
        }
        _ => ClientError::Unexpected {
            status: status.as_u16(),
            message: error_message(body),
        },
    }
}

fn error_message(body: String) -> String {
    match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(err) => err.error,
        Err(_) => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_without_duplicate_slashes() {
        let client = ApiClient::new("http://127.0.0.1:8000/");
        assert_eq!(
            client.url("/api/posts"),
            "http://127.0.0.1:8000/api/posts"
        );
        assert_eq!(client.url("api/posts"), "http://127.0.0.1:8000/api/posts");
    }

    #[test]
    fn validation_body_maps_to_field_errors() {
        let body = r#"{"errors":{"title":["The title field is required."]}}"#;
        let err = error_from(StatusCode::UNPROCESSABLE_ENTITY, body.to_string());
        match err {
            ClientError::Validation(errors) => {
                assert_eq!(errors.joined(), "The title field is required.");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn error_body_message_is_extracted() {
        let err = error_from(
            StatusCode::UNAUTHORIZED,
            r#"{"error":"Invalid credentials"}"#.to_string(),
        );
        match err {
            ClientError::Unauthorized(message) => assert_eq!(message, "Invalid credentials"),
            other => panic!("expected unauthorized, got {other:?}"),
        }
    }
}
