use chrono::Utc;

use super::DbPool;
use crate::error::{AppError, AppResult};
use crate::model::person::{PeopleQuery, Person, PersonInput};
use crate::model::slugify;

const SELECT: &str = "SELECT p.id, p.name, p.slug, p.category, p.description, p.image_url, p.created_at, \
    (SELECT COUNT(*) FROM news_people np WHERE np.person_id = p.id) AS mention_count FROM people p";

/// 人物目录，支持按姓名模糊搜索和按类别过滤
pub async fn list(pool: &DbPool, query: &PeopleQuery) -> AppResult<Vec<Person>> {
    let pattern = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(|q| format!("%{}%", q));
    let category = query
        .category
        .as_deref()
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty());

    let sql = format!(
        "{} WHERE (? IS NULL OR p.name LIKE ?) AND (? IS NULL OR p.category = ?) ORDER BY p.name",
        SELECT
    );
    let people = sqlx::query_as::<_, Person>(&sql)
        .bind(pattern.clone())
        .bind(pattern)
        .bind(category.clone())
        .bind(category)
        .fetch_all(pool)
        .await?;
    Ok(people)
}

/// 提及检测使用的完整候选集合
pub async fn all(pool: &DbPool) -> AppResult<Vec<Person>> {
    list(pool, &PeopleQuery::default()).await
}

pub async fn get(pool: &DbPool, id: i64) -> AppResult<Person> {
    let sql = format!("{} WHERE p.id = ?", SELECT);
    sqlx::query_as::<_, Person>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("person"))
}

pub async fn create(pool: &DbPool, input: &PersonInput) -> AppResult<Person> {
    let result = sqlx::query(
        "INSERT INTO people (name, slug, category, description, image_url, created_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&input.name)
    .bind(slugify(&input.name))
    .bind(input.category())
    .bind(&input.description)
    .bind(&input.image_url)
    .bind(Utc::now())
    .execute(pool)
    .await
    .map_err(|e| AppError::from_write(e, "person"))?;
    get(pool, result.last_insert_rowid()).await
}

pub async fn update(pool: &DbPool, id: i64, input: &PersonInput) -> AppResult<Person> {
    let result = sqlx::query(
        "UPDATE people SET name = ?, slug = ?, category = ?, description = ?, image_url = ? WHERE id = ?",
    )
    .bind(&input.name)
    .bind(slugify(&input.name))
    .bind(input.category())
    .bind(&input.description)
    .bind(&input.image_url)
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| AppError::from_write(e, "person"))?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("person"));
    }
    get(pool, id).await
}

/// 删除人物时关联的文章标签随之级联删除
pub async fn delete(pool: &DbPool, id: i64) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM people WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("person"));
    }
    Ok(())
}
