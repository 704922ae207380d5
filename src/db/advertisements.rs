// src/db/advertisements.rs

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;

use super::{parse_column, DbPool};
use crate::error::{AppError, AppResult};
use crate::model::advertisement::{AdPosition, Advertisement, AdvertisementInput, ReorderItem};

const COLUMNS: &str = "id, title, ad_type, content, image_url, video_url, link_url, position, size, \
    width, height, pages, exclude_pages, device_target, start_date, end_date, priority, sort_order, \
    is_active, impressions, clicks, display_mode, rotation_interval, article_position, created_at, updated_at";

#[derive(FromRow)]
struct AdvertisementRow {
    id: i64,
    title: String,
    ad_type: String,
    content: Option<String>,
    image_url: Option<String>,
    video_url: Option<String>,
    link_url: Option<String>,
    position: String,
    size: String,
    width: Option<i64>,
    height: Option<i64>,
    pages: Json<Vec<String>>,
    exclude_pages: Json<Vec<String>>,
    device_target: String,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    priority: i64,
    sort_order: i64,
    is_active: bool,
    impressions: i64,
    clicks: i64,
    display_mode: String,
    rotation_interval: i64,
    article_position: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AdvertisementRow> for Advertisement {
    type Error = AppError;

    fn try_from(row: AdvertisementRow) -> Result<Self, Self::Error> {
        Ok(Advertisement {
            id: row.id,
            title: row.title,
            ad_type: parse_column(&row.ad_type, "ad_type")?,
            content: row.content,
            image_url: row.image_url,
            video_url: row.video_url,
            link_url: row.link_url,
            position: parse_column(&row.position, "position")?,
            size: row.size,
            width: row.width,
            height: row.height,
            pages: row.pages.0,
            exclude_pages: row.exclude_pages.0,
            device_target: parse_column(&row.device_target, "device_target")?,
            start_date: row.start_date,
            end_date: row.end_date,
            priority: row.priority,
            sort_order: row.sort_order,
            is_active: row.is_active,
            impressions: row.impressions,
            clicks: row.clicks,
            display_mode: parse_column(&row.display_mode, "display_mode")?,
            rotation_interval: row.rotation_interval,
            article_position: row.article_position,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn convert(rows: Vec<AdvertisementRow>) -> AppResult<Vec<Advertisement>> {
    rows.into_iter().map(Advertisement::try_from).collect()
}

/// 后台列表：按广告位、手动排序
pub async fn list_all(pool: &DbPool) -> AppResult<Vec<Advertisement>> {
    let sql = format!(
        "SELECT {} FROM advertisements ORDER BY position, sort_order, id",
        COLUMNS
    );
    let rows = sqlx::query_as::<_, AdvertisementRow>(&sql).fetch_all(pool).await?;
    convert(rows)
}

/// 某个广告位下所有启用的广告；时间窗、设备、页面过滤交给 serving::engine
pub async fn list_active_for_position(pool: &DbPool, position: AdPosition) -> AppResult<Vec<Advertisement>> {
    let sql = format!(
        "SELECT {} FROM advertisements WHERE position = ? AND is_active = 1",
        COLUMNS
    );
    let rows = sqlx::query_as::<_, AdvertisementRow>(&sql)
        .bind(position.as_str())
        .fetch_all(pool)
        .await?;
    convert(rows)
}

pub async fn get(pool: &DbPool, id: i64) -> AppResult<Advertisement> {
    let sql = format!("SELECT {} FROM advertisements WHERE id = ?", COLUMNS);
    let row = sqlx::query_as::<_, AdvertisementRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("advertisement"))?;
    Advertisement::try_from(row)
}

pub async fn create(pool: &DbPool, input: &AdvertisementInput) -> AppResult<Advertisement> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO advertisements (title, ad_type, content, image_url, video_url, link_url, position, size, \
         width, height, pages, exclude_pages, device_target, start_date, end_date, priority, sort_order, \
         is_active, impressions, clicks, display_mode, rotation_interval, article_position, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, 0, ?, ?, ?, ?, ?)",
    )
    .bind(&input.title)
    .bind(input.ad_type.as_str())
    .bind(&input.content)
    .bind(&input.image_url)
    .bind(&input.video_url)
    .bind(&input.link_url)
    .bind(input.position.as_str())
    .bind(&input.size)
    .bind(input.width)
    .bind(input.height)
    .bind(Json(&input.pages))
    .bind(Json(&input.exclude_pages))
    .bind(input.device_target.as_str())
    .bind(input.start_date)
    .bind(input.end_date)
    .bind(input.priority)
    .bind(input.sort_order)
    .bind(input.is_active)
    .bind(input.display_mode.as_str())
    .bind(input.rotation_interval)
    .bind(input.article_position)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    get(pool, result.last_insert_rowid()).await
}

/// 整体替换可编辑字段，计数器保持不变
pub async fn update(pool: &DbPool, id: i64, input: &AdvertisementInput) -> AppResult<Advertisement> {
    let result = sqlx::query(
        "UPDATE advertisements SET title = ?, ad_type = ?, content = ?, image_url = ?, video_url = ?, \
         link_url = ?, position = ?, size = ?, width = ?, height = ?, pages = ?, exclude_pages = ?, \
         device_target = ?, start_date = ?, end_date = ?, priority = ?, sort_order = ?, is_active = ?, \
         display_mode = ?, rotation_interval = ?, article_position = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&input.title)
    .bind(input.ad_type.as_str())
    .bind(&input.content)
    .bind(&input.image_url)
    .bind(&input.video_url)
    .bind(&input.link_url)
    .bind(input.position.as_str())
    .bind(&input.size)
    .bind(input.width)
    .bind(input.height)
    .bind(Json(&input.pages))
    .bind(Json(&input.exclude_pages))
    .bind(input.device_target.as_str())
    .bind(input.start_date)
    .bind(input.end_date)
    .bind(input.priority)
    .bind(input.sort_order)
    .bind(input.is_active)
    .bind(input.display_mode.as_str())
    .bind(input.rotation_interval)
    .bind(input.article_position)
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("advertisement"));
    }
    get(pool, id).await
}

pub async fn delete(pool: &DbPool, id: i64) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM advertisements WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("advertisement"));
    }
    Ok(())
}

/// 启用 / 停用切换
pub async fn toggle(pool: &DbPool, id: i64) -> AppResult<Advertisement> {
    let result = sqlx::query(
        "UPDATE advertisements SET is_active = NOT is_active, updated_at = ? WHERE id = ?",
    )
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("advertisement"));
    }
    get(pool, id).await
}

/// 批量更新排序，在一个事务里完成；任一 id 不存在则整体回滚
pub async fn reorder(pool: &DbPool, items: &[ReorderItem]) -> AppResult<()> {
    let mut tx = pool.begin().await?;
    let now = Utc::now();
    for item in items {
        let result = sqlx::query("UPDATE advertisements SET sort_order = ?, updated_at = ? WHERE id = ?")
            .bind(item.sort_order)
            .bind(now)
            .bind(item.id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("advertisement"));
        }
    }
    tx.commit().await?;
    Ok(())
}

/// 展示计数，依赖数据库的原子自增
pub async fn increment_impressions(pool: &DbPool, id: i64) -> AppResult<()> {
    let result = sqlx::query("UPDATE advertisements SET impressions = impressions + 1 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("advertisement"));
    }
    Ok(())
}

pub async fn increment_clicks(pool: &DbPool, id: i64) -> AppResult<()> {
    let result = sqlx::query("UPDATE advertisements SET clicks = clicks + 1 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("advertisement"));
    }
    Ok(())
}
