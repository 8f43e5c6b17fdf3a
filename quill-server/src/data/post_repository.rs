use crate::domain::user::UserResponse;
use crate::domain::{Category, DomainError, Post};
use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(
        &self,
        author_id: i64,
        title: &str,
        content: &str,
        category_id: i64,
        image: Option<&str>,
    ) -> Result<Post, DomainError>;
    async fn find_by_id(&self, id: i64) -> Result<Post, DomainError>;
    /// `image = None` keeps whatever path the row already has.
    async fn update(
        &self,
        id: i64,
        title: &str,
        content: &str,
        category_id: i64,
        image: Option<&str>,
    ) -> Result<Post, DomainError>;
    async fn delete(&self, id: i64) -> Result<(), DomainError>;
    async fn list(&self) -> Result<Vec<Post>, DomainError>;
}

pub struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const POST_SELECT: &str = r#"
    SELECT p.id, p.title, p.content, p.image, p.created_at,
           u.id AS author_id, u.name AS author_name, u.email AS author_email,
           c.id AS category_id, c.name AS category_name
    FROM posts p
    JOIN users u ON u.id = p.author_id
    LEFT JOIN categories c ON c.id = p.category_id
"#;

fn post_from_row(row: &PgRow) -> Result<Post, DomainError> {
    let category = match row.try_get::<Option<i64>, _>("category_id")? {
        Some(id) => Some(Category {
            id,
            name: row.try_get("category_name")?,
        }),
        None => None,
    };

    Ok(Post {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        image: row.try_get("image")?,
        category,
        author: UserResponse {
            id: row.try_get("author_id")?,
            name: row.try_get("author_name")?,
            email: row.try_get("author_email")?,
        },
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create(
        &self,
        author_id: i64,
        title: &str,
        content: &str,
        category_id: i64,
        image: Option<&str>,
    ) -> Result<Post, DomainError> {
        let row = sqlx::query(
            r#"
            INSERT INTO posts (title, content, image, author_id, category_id, created_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            RETURNING id
            "#,
        )
        .bind(title)
        .bind(content)
        .bind(image)
        .bind(author_id)
        .bind(category_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create post: {}", e);
            DomainError::Database(e.to_string())
        })?;

        let id: i64 = row.try_get("id")?;
        self.find_by_id(id).await
    }

    async fn find_by_id(&self, id: i64) -> Result<Post, DomainError> {
        let row = sqlx::query(&format!("{POST_SELECT} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        match row {
            Some(row) => post_from_row(&row),
            None => Err(DomainError::PostNotFound),
        }
    }

    async fn update(
        &self,
        id: i64,
        title: &str,
        content: &str,
        category_id: i64,
        image: Option<&str>,
    ) -> Result<Post, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET title = $1,
                content = $2,
                category_id = $3,
                image = COALESCE($4, image)
            WHERE id = $5
            "#,
        )
        .bind(title)
        .bind(content)
        .bind(category_id)
        .bind(image)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::PostNotFound);
        }

        self.find_by_id(id).await
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            DELETE FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            Err(DomainError::PostNotFound)
        } else {
            Ok(())
        }
    }

    async fn list(&self) -> Result<Vec<Post>, DomainError> {
        let rows = sqlx::query(&format!("{POST_SELECT} ORDER BY p.created_at DESC"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        rows.iter().map(post_from_row).collect()
    }
}
