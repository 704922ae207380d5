use chrono::Utc;

use super::DbPool;
use crate::error::{AppError, AppResult};
use crate::model::category::{Category, CategoryInput};

pub async fn list(pool: &DbPool) -> AppResult<Vec<Category>> {
    let categories = sqlx::query_as::<_, Category>(
        "SELECT id, name, slug, description, created_at FROM categories ORDER BY name",
    )
    .fetch_all(pool)
    .await?;
    Ok(categories)
}

pub async fn get(pool: &DbPool, id: i64) -> AppResult<Category> {
    sqlx::query_as::<_, Category>(
        "SELECT id, name, slug, description, created_at FROM categories WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("category"))
}

pub async fn create(pool: &DbPool, input: &CategoryInput) -> AppResult<Category> {
    let result = sqlx::query(
        "INSERT INTO categories (name, slug, description, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&input.name)
    .bind(input.slug())
    .bind(&input.description)
    .bind(Utc::now())
    .execute(pool)
    .await
    .map_err(|e| AppError::from_write(e, "category"))?;
    get(pool, result.last_insert_rowid()).await
}

pub async fn update(pool: &DbPool, id: i64, input: &CategoryInput) -> AppResult<Category> {
    let result = sqlx::query("UPDATE categories SET name = ?, slug = ?, description = ? WHERE id = ?")
        .bind(&input.name)
        .bind(input.slug())
        .bind(&input.description)
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| AppError::from_write(e, "category"))?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("category"));
    }
    get(pool, id).await
}

/// 分类下仍有文章时拒绝删除
pub async fn delete(pool: &DbPool, id: i64) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM categories WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                AppError::Conflict("category still has articles".to_string())
            }
            _ => AppError::Database(e),
        })?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("category"));
    }
    Ok(())
}
