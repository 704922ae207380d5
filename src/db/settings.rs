use std::collections::BTreeMap;

use super::DbPool;
use crate::error::AppResult;
use crate::model::setting::{Setting, SettingsUpdate, DEFAULT_SETTINGS};

/// 只补齐缺失的默认项，不覆盖管理员已修改的值
pub async fn seed_defaults(pool: &DbPool) -> Result<(), sqlx::Error> {
    for (key, value) in DEFAULT_SETTINGS {
        sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
            .bind(*key)
            .bind(*value)
            .execute(pool)
            .await?;
    }
    Ok(())
}

pub async fn all(pool: &DbPool) -> AppResult<BTreeMap<String, String>> {
    let rows = sqlx::query_as::<_, Setting>("SELECT key, value FROM settings")
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(|s| (s.key, s.value)).collect())
}

pub async fn upsert_many(pool: &DbPool, update: &SettingsUpdate) -> AppResult<BTreeMap<String, String>> {
    let mut tx = pool.begin().await?;
    for (key, value) in &update.0 {
        sqlx::query(
            "INSERT INTO settings (key, value) VALUES (?, ?) ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    all(pool).await
}
