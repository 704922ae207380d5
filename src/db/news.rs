// src/db/news.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};

use super::{parse_column, DbPool};
use crate::error::{AppError, AppResult};
use crate::model::news::{News, NewsInput, NewsListQuery, NewsStatus};
use crate::model::person::Person;

const SELECT: &str = "SELECT n.id, n.title, n.slug, n.summary, n.content, n.image_url, n.category_id, \
    c.name AS category_name, n.author_id, u.display_name AS author_name, n.status, n.views, \
    n.published_at, n.created_at, n.updated_at \
    FROM news n JOIN categories c ON c.id = n.category_id JOIN users u ON u.id = n.author_id";

#[derive(FromRow)]
struct NewsRow {
    id: i64,
    title: String,
    slug: String,
    summary: Option<String>,
    content: String,
    image_url: Option<String>,
    category_id: i64,
    category_name: String,
    author_id: i64,
    author_name: String,
    status: String,
    views: i64,
    published_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct TaggedPerson {
    news_id: i64,
    #[sqlx(flatten)]
    person: Person,
}

impl TryFrom<NewsRow> for News {
    type Error = AppError;

    fn try_from(row: NewsRow) -> Result<Self, Self::Error> {
        Ok(News {
            id: row.id,
            title: row.title,
            slug: row.slug,
            summary: row.summary,
            content: row.content,
            image_url: row.image_url,
            category_id: row.category_id,
            category_name: row.category_name,
            author_id: row.author_id,
            author_name: row.author_name,
            status: parse_column(&row.status, "status")?,
            views: row.views,
            published_at: row.published_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
            people: Vec::new(),
        })
    }
}

/// 一次查询补齐多篇文章的人物标签
async fn attach_people(pool: &DbPool, rows: Vec<NewsRow>) -> AppResult<Vec<News>> {
    let mut articles = rows
        .into_iter()
        .map(News::try_from)
        .collect::<AppResult<Vec<_>>>()?;
    if articles.is_empty() {
        return Ok(articles);
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT np.news_id, p.id, p.name, p.slug, p.category, p.description, p.image_url, p.created_at, \
         (SELECT COUNT(*) FROM news_people x WHERE x.person_id = p.id) AS mention_count \
         FROM news_people np JOIN people p ON p.id = np.person_id WHERE np.news_id IN (",
    );
    let mut ids = builder.separated(", ");
    for article in &articles {
        ids.push_bind(article.id);
    }
    builder.push(") ORDER BY p.name");

    let tagged = builder
        .build_query_as::<TaggedPerson>()
        .fetch_all(pool)
        .await?;

    let mut by_article: HashMap<i64, Vec<Person>> = HashMap::new();
    for row in tagged {
        by_article.entry(row.news_id).or_default().push(row.person);
    }
    for article in &mut articles {
        article.people = by_article.remove(&article.id).unwrap_or_default();
    }
    Ok(articles)
}

async fn single(pool: &DbPool, row: Option<NewsRow>) -> AppResult<News> {
    let row = row.ok_or(AppError::NotFound("article"))?;
    attach_people(pool, vec![row])
        .await?
        .pop()
        .ok_or(AppError::NotFound("article"))
}

pub async fn get(pool: &DbPool, id: i64) -> AppResult<News> {
    let sql = format!("{} WHERE n.id = ?", SELECT);
    let row = sqlx::query_as::<_, NewsRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    single(pool, row).await
}

pub async fn get_by_slug(pool: &DbPool, slug: &str) -> AppResult<News> {
    let sql = format!("{} WHERE n.slug = ?", SELECT);
    let row = sqlx::query_as::<_, NewsRow>(&sql)
        .bind(slug)
        .fetch_optional(pool)
        .await?;
    single(pool, row).await
}

/// 公开列表：只含已发布文章，按发布时间倒序
pub async fn list_published(pool: &DbPool, query: &NewsListQuery) -> AppResult<Vec<News>> {
    let (limit, offset) = query.window();
    let category = query
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_lowercase);

    let sql = format!(
        "{} WHERE n.status = 'published' AND (? IS NULL OR c.slug = ?) \
         ORDER BY n.published_at DESC, n.id DESC LIMIT ? OFFSET ?",
        SELECT
    );
    let rows = sqlx::query_as::<_, NewsRow>(&sql)
        .bind(category.clone())
        .bind(category)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
    attach_people(pool, rows).await
}

/// 后台列表；author 为 None 时返回全部文章
pub async fn list_for_author(pool: &DbPool, author: Option<i64>) -> AppResult<Vec<News>> {
    let sql = format!(
        "{} WHERE (? IS NULL OR n.author_id = ?) ORDER BY n.updated_at DESC, n.id DESC",
        SELECT
    );
    let rows = sqlx::query_as::<_, NewsRow>(&sql)
        .bind(author)
        .bind(author)
        .fetch_all(pool)
        .await?;
    attach_people(pool, rows).await
}

async fn replace_people(conn: &mut SqliteConnection, news_id: i64, people_ids: &[i64]) -> AppResult<()> {
    sqlx::query("DELETE FROM news_people WHERE news_id = ?")
        .bind(news_id)
        .execute(&mut *conn)
        .await?;
    for person_id in people_ids {
        sqlx::query("INSERT INTO news_people (news_id, person_id) VALUES (?, ?)")
            .bind(news_id)
            .bind(person_id)
            .execute(&mut *conn)
            .await
            .map_err(|e| AppError::from_write(e, "person tag"))?;
    }
    Ok(())
}

/// 新建文章一律为草稿
pub async fn create(pool: &DbPool, author_id: i64, input: &NewsInput) -> AppResult<News> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;
    let result = sqlx::query(
        "INSERT INTO news (title, slug, summary, content, image_url, category_id, author_id, status, views, \
         published_at, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, NULL, ?, ?)",
    )
    .bind(&input.title)
    .bind(input.slug())
    .bind(&input.summary)
    .bind(&input.content)
    .bind(&input.image_url)
    .bind(input.category_id)
    .bind(author_id)
    .bind(NewsStatus::Draft.as_str())
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await
    .map_err(|e| AppError::from_write(e, "article"))?;
    let id = result.last_insert_rowid();
    replace_people(&mut *tx, id, &input.people_ids).await?;
    tx.commit().await?;
    get(pool, id).await
}

pub async fn update(pool: &DbPool, id: i64, input: &NewsInput) -> AppResult<News> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query(
        "UPDATE news SET title = ?, slug = ?, summary = ?, content = ?, image_url = ?, category_id = ?, \
         updated_at = ? WHERE id = ?",
    )
    .bind(&input.title)
    .bind(input.slug())
    .bind(&input.summary)
    .bind(&input.content)
    .bind(&input.image_url)
    .bind(input.category_id)
    .bind(Utc::now())
    .bind(id)
    .execute(&mut *tx)
    .await
    .map_err(|e| AppError::from_write(e, "article"))?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("article"));
    }
    replace_people(&mut *tx, id, &input.people_ids).await?;
    tx.commit().await?;
    get(pool, id).await
}

/// 发布时只在第一次写入 published_at
pub async fn set_status(pool: &DbPool, id: i64, status: NewsStatus) -> AppResult<News> {
    let now = Utc::now();
    let sql = match status {
        NewsStatus::Published => {
            "UPDATE news SET status = ?, published_at = COALESCE(published_at, ?), updated_at = ? WHERE id = ?"
        }
        NewsStatus::Draft => "UPDATE news SET status = ?, published_at = ?, updated_at = ? WHERE id = ?",
    };
    let published_at = match status {
        NewsStatus::Published => Some(now),
        NewsStatus::Draft => None,
    };
    let result = sqlx::query(sql)
        .bind(status.as_str())
        .bind(published_at)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("article"));
    }
    get(pool, id).await
}

pub async fn delete(pool: &DbPool, id: i64) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM news WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("article"));
    }
    Ok(())
}

/// 阅读量只对已发布文章累加
pub async fn increment_views(pool: &DbPool, id: i64) -> AppResult<i64> {
    let views: Option<i64> = sqlx::query_scalar(
        "UPDATE news SET views = views + 1 WHERE id = ? AND status = 'published' RETURNING views",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    views.ok_or(AppError::NotFound("article"))
}
