use crate::data::category_repository::CategoryRepository;
use crate::data::post_repository::PostRepository;
use crate::data::user_repository::UserRepository;
use crate::domain::error::Validator;
use crate::domain::post::{CreatePostData, Post, UpdatePostData};
use crate::domain::DomainError;
use crate::infrastructure::storage::ImageStorage;
use std::sync::Arc;

pub struct BlogService {
    post_repo: Arc<dyn PostRepository + Send + Sync>,
    category_repo: Arc<dyn CategoryRepository + Send + Sync>,
    user_repo: Arc<dyn UserRepository + Send + Sync>,
    storage: Arc<ImageStorage>,
}

impl BlogService {
    pub fn new(
        post_repo: Arc<dyn PostRepository + Send + Sync>,
        category_repo: Arc<dyn CategoryRepository + Send + Sync>,
        user_repo: Arc<dyn UserRepository + Send + Sync>,
        storage: Arc<ImageStorage>,
    ) -> Self {
        Self {
            post_repo,
            category_repo,
            user_repo,
            storage,
        }
    }

    /// Validate the whole form at once, store the image only if everything
    /// else passed, then insert.
    pub async fn create_post(&self, data: CreatePostData) -> Result<Post, DomainError> {
        let mut v = Validator::default();
        if data.title.trim().is_empty() {
            v.add("title", "The title field is required.");
        }
        if data.content.trim().is_empty() {
            v.add("content", "The content field is required.");
        }

        let author_id = match data.author_id {
            None => {
                v.add("user_id", "The user id field is required.");
                None
            }
            Some(id) => match self.user_repo.find_by_id(id).await {
                Ok(user) => Some(user.id),
                Err(DomainError::UserNotFound) => {
                    v.add("user_id", "The selected user id is invalid.");
                    None
                }
                Err(e) => return Err(e),
            },
        };

        let category_id = self.validated_category(&mut v, data.category_id).await?;
        v.finish()?;

        let (Some(author_id), Some(category_id)) = (author_id, category_id) else {
            return Err(DomainError::Internal(
                "Validated ids missing after validation".to_string(),
            ));
        };

        let image_path = match &data.image {
            Some(image) => Some(self.storage.save(&image.filename, &image.bytes).await?),
            None => None,
        };

        let post = self
            .post_repo
            .create(
                author_id,
                data.title.trim(),
                &data.content,
                category_id,
                image_path.as_deref(),
            )
            .await?;

        tracing::info!("Post created: id={}, author_id={}", post.id, author_id);
        Ok(post)
    }

    /// Update title, content and category; replace the stored image only
    /// when the request carried a new file.
    pub async fn update_post(&self, id: i64, data: UpdatePostData) -> Result<Post, DomainError> {
        // 404 before 422 for a missing post
        self.post_repo.find_by_id(id).await?;

        let mut v = Validator::default();
        if data.title.trim().is_empty() {
            v.add("title", "The title field is required.");
        }
        if data.content.trim().is_empty() {
            v.add("content", "The content field is required.");
        }
        let category_id = self.validated_category(&mut v, data.category_id).await?;
        v.finish()?;

        let Some(category_id) = category_id else {
            return Err(DomainError::Internal(
                "Validated category missing after validation".to_string(),
            ));
        };

        let image_path = match &data.image {
            Some(image) => Some(self.storage.save(&image.filename, &image.bytes).await?),
            None => None,
        };

        let post = self
            .post_repo
            .update(
                id,
                data.title.trim(),
                &data.content,
                category_id,
                image_path.as_deref(),
            )
            .await?;

        tracing::info!("Post updated: id={}", id);
        Ok(post)
    }

    pub async fn delete_post(&self, id: i64) -> Result<(), DomainError> {
        self.post_repo.delete(id).await?;
        tracing::info!("Post deleted: id={}", id);
        Ok(())
    }

    pub async fn list_posts(&self) -> Result<Vec<Post>, DomainError> {
        self.post_repo.list().await
    }

    async fn validated_category(
        &self,
        v: &mut Validator,
        category_id: Option<i64>,
    ) -> Result<Option<i64>, DomainError> {
        match category_id {
            None => {
                v.add("category_id", "The category id field is required.");
                Ok(None)
            }
            Some(id) => {
                if self.category_repo.exists(id).await? {
                    Ok(Some(id))
                } else {
                    v.add("category_id", "The selected category id is invalid.");
                    Ok(None)
                }
            }
        }
    }
}
