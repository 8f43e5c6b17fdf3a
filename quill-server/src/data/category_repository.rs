use crate::domain::{Category, DomainError};
use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn create(&self, name: &str) -> Result<Category, DomainError>;
    async fn find_by_id(&self, id: i64) -> Result<Category, DomainError>;
    /// Backend order is the list order; the client does not re-sort.
    async fn list(&self, name: Option<&str>) -> Result<Vec<Category>, DomainError>;
    async fn update(&self, id: i64, name: &str) -> Result<Category, DomainError>;
    async fn delete(&self, id: i64) -> Result<(), DomainError>;
    async fn exists(&self, id: i64) -> Result<bool, DomainError>;
}

pub struct PostgresCategoryRepository {
    pool: PgPool,
}

impl PostgresCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn category_from_row(row: &PgRow) -> Result<Category, DomainError> {
    Ok(Category {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
    })
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn create(&self, name: &str) -> Result<Category, DomainError> {
        let row = sqlx::query(
            r#"
            INSERT INTO categories (name)
            VALUES ($1)
            RETURNING id, name
            "#,
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

        category_from_row(&row)
    }

    async fn find_by_id(&self, id: i64) -> Result<Category, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, name
            FROM categories
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

        match row {
            Some(row) => category_from_row(&row),
            None => Err(DomainError::CategoryNotFound),
        }
    }

    async fn list(&self, name: Option<&str>) -> Result<Vec<Category>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name
            FROM categories
            WHERE $1::text IS NULL OR name ILIKE '%' || $1 || '%'
            ORDER BY id
            "#,
        )
        .bind(name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

        rows.iter().map(category_from_row).collect()
    }

    async fn update(&self, id: i64, name: &str) -> Result<Category, DomainError> {
        let row = sqlx::query(
            r#"
            UPDATE categories
            SET name = $1
            WHERE id = $2
            RETURNING id, name
            "#,
        )
        .bind(name)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

        match row {
            Some(row) => category_from_row(&row),
            None => Err(DomainError::CategoryNotFound),
        }
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            DELETE FROM categories
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            Err(DomainError::CategoryNotFound)
        } else {
            Ok(())
        }
    }

    async fn exists(&self, id: i64) -> Result<bool, DomainError> {
        let row = sqlx::query("SELECT 1 AS one FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(row.is_some())
    }
}
