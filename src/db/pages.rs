use chrono::Utc;

use super::DbPool;
use crate::error::{AppError, AppResult};
use crate::model::page::{Page, PageInput};

const COLUMNS: &str = "id, title, slug, content, is_published, created_at, updated_at";

pub async fn list(pool: &DbPool, published_only: bool) -> AppResult<Vec<Page>> {
    let sql = if published_only {
        format!("SELECT {} FROM pages WHERE is_published = 1 ORDER BY title", COLUMNS)
    } else {
        format!("SELECT {} FROM pages ORDER BY title", COLUMNS)
    };
    Ok(sqlx::query_as::<_, Page>(&sql).fetch_all(pool).await?)
}

pub async fn get(pool: &DbPool, id: i64) -> AppResult<Page> {
    let sql = format!("SELECT {} FROM pages WHERE id = ?", COLUMNS);
    sqlx::query_as::<_, Page>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("page"))
}

pub async fn get_by_slug(pool: &DbPool, slug: &str) -> AppResult<Page> {
    let sql = format!("SELECT {} FROM pages WHERE slug = ?", COLUMNS);
    sqlx::query_as::<_, Page>(&sql)
        .bind(slug)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("page"))
}

pub async fn create(pool: &DbPool, input: &PageInput) -> AppResult<Page> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO pages (title, slug, content, is_published, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&input.title)
    .bind(input.slug())
    .bind(&input.content)
    .bind(input.is_published)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .map_err(|e| AppError::from_write(e, "page"))?;
    get(pool, result.last_insert_rowid()).await
}

pub async fn update(pool: &DbPool, id: i64, input: &PageInput) -> AppResult<Page> {
    let result = sqlx::query(
        "UPDATE pages SET title = ?, slug = ?, content = ?, is_published = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&input.title)
    .bind(input.slug())
    .bind(&input.content)
    .bind(input.is_published)
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| AppError::from_write(e, "page"))?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("page"));
    }
    get(pool, id).await
}

pub async fn delete(pool: &DbPool, id: i64) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM pages WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("page"));
    }
    Ok(())
}
