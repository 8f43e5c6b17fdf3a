//! In-memory fakes shared by the workflow tests.

use crate::api::BlogApi;
use crate::dashboard::Generation;
use crate::notify::{Notice, Notifier};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quill_client::models::{
    AuthResponse, Category, CreatePost, FieldErrors, LoginRequest, Post, RegisterRequest,
    UpdatePost, User,
};
use quill_client::ClientError;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Mutex;

pub fn sample_user(id: i64) -> User {
    User {
        id,
        name: format!("user-{id}"),
        email: format!("user-{id}@example.com"),
    }
}

pub fn sample_category(id: i64, name: &str) -> Category {
    Category {
        id,
        name: name.to_string(),
    }
}

pub fn post_at(id: i64, title: &str, created_at: &str) -> Post {
    Post {
        id,
        title: title.to_string(),
        content: String::new(),
        image: None,
        category: None,
        author: sample_user(1),
        created_at: created_at
            .parse::<DateTime<Utc>>()
            .expect("valid timestamp"),
    }
}

#[derive(Default)]
pub struct FakeApi {
    pub categories: Mutex<Vec<Category>>,
    pub posts: Mutex<Vec<Post>>,
    pub created: Mutex<Vec<CreatePost>>,
    pub updated: Mutex<Vec<(i64, UpdatePost)>>,
    pub deleted: Mutex<Vec<i64>>,
    pub fail_categories: AtomicBool,
    pub fail_posts: AtomicBool,
    pub fail_category_detail: AtomicBool,
    pub create_rejection: Mutex<Option<FieldErrors>>,
    /// When set, `list_posts` bumps this generation before answering,
    /// simulating a logout that lands while the request is in flight.
    pub bump_on_list_posts: Mutex<Option<Generation>>,
    calls: Mutex<Vec<String>>,
    next_id: AtomicI64,
}

impl FakeApi {
    pub fn with_data(categories: Vec<Category>, posts: Vec<Post>) -> Self {
        let api = Self::default();
        *api.categories.lock().expect("lock") = categories;
        *api.posts.lock().expect("lock") = posts;
        api
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("lock").clone()
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == name).count()
    }

    fn record(&self, name: &str) {
        self.calls.lock().expect("lock").push(name.to_string());
    }

    fn failure() -> ClientError {
        ClientError::Unexpected {
            status: 500,
            message: "boom".to_string(),
        }
    }
}

#[async_trait]
impl BlogApi for FakeApi {
    async fn register(&self, req: &RegisterRequest) -> Result<User, ClientError> {
        self.record("register");
        Ok(User {
            id: 2,
            name: req.name.clone(),
            email: req.email.clone(),
        })
    }

    async fn login(&self, req: &LoginRequest) -> Result<AuthResponse, ClientError> {
        self.record("login");
        Ok(AuthResponse {
            token: "tok-test".to_string(),
            user: User {
                id: 1,
                name: "Alice".to_string(),
                email: req.email.clone(),
            },
        })
    }

    async fn list_categories(&self, name: Option<&str>) -> Result<Vec<Category>, ClientError> {
        self.record("list_categories");
        if self.fail_categories.load(Ordering::SeqCst) {
            return Err(Self::failure());
        }
        let categories = self.categories.lock().expect("lock").clone();
        Ok(match name {
            Some(name) => categories
                .into_iter()
                .filter(|c| c.name.contains(name))
                .collect(),
            None => categories,
        })
    }

    async fn get_category(&self, id: i64) -> Result<Category, ClientError> {
        self.record("get_category");
        if self.fail_category_detail.load(Ordering::SeqCst) {
            return Err(Self::failure());
        }
        self.categories
            .lock()
            .expect("lock")
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(ClientError::NotFound)
    }

    async fn list_posts(&self) -> Result<Vec<Post>, ClientError> {
        self.record("list_posts");
        if let Some(generation) = self.bump_on_list_posts.lock().expect("lock").as_ref() {
            generation.bump();
        }
        if self.fail_posts.load(Ordering::SeqCst) {
            return Err(Self::failure());
        }
        Ok(self.posts.lock().expect("lock").clone())
    }

    async fn create_post(&self, req: CreatePost) -> Result<Post, ClientError> {
        self.record("create_post");
        if let Some(errors) = self.create_rejection.lock().expect("lock").clone() {
            return Err(ClientError::Validation(errors));
        }

        let id = 100 + self.next_id.fetch_add(1, Ordering::SeqCst);
        let category = self
            .categories
            .lock()
            .expect("lock")
            .iter()
            .find(|c| c.id == req.category_id)
            .cloned();
        let post = Post {
            id,
            title: req.title.clone(),
            content: req.content.clone(),
            image: req.image.as_ref().map(|i| format!("images/{}", i.filename)),
            category,
            author: sample_user(req.user_id),
            created_at: Utc::now(),
        };
        self.posts.lock().expect("lock").push(post.clone());
        self.created.lock().expect("lock").push(req);
        Ok(post)
    }

    async fn update_post(&self, id: i64, req: UpdatePost) -> Result<Post, ClientError> {
        self.record("update_post");
        let mut posts = self.posts.lock().expect("lock");
        let post = posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(ClientError::NotFound)?;
        post.title = req.title.clone();
        post.content = req.content.clone();
        let updated = post.clone();
        drop(posts);
        self.updated.lock().expect("lock").push((id, req));
        Ok(updated)
    }

    async fn delete_post(&self, id: i64) -> Result<(), ClientError> {
        self.record("delete_post");
        self.posts.lock().expect("lock").retain(|p| p.id != id);
        self.deleted.lock().expect("lock").push(id);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<(Notice, String)>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<(Notice, String)> {
        self.messages.lock().expect("lock").clone()
    }

    pub fn saw(&self, needle: &str) -> bool {
        self.messages()
            .iter()
            .any(|(_, message)| message.contains(needle))
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: Notice, message: &str) {
        self.messages
            .lock()
            .expect("lock")
            .push((level, message.to_string()));
    }
}
