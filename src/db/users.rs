use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::{parse_column, DbPool};
use crate::error::{AppError, AppResult};
use crate::model::user::{RegisterInput, Role, User, UserCredentials, UserUpdate};

#[derive(FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    display_name: String,
    role: String,
    password_hash: String,
    password_salt: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for UserCredentials {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(UserCredentials {
            user: User {
                id: row.id,
                username: row.username,
                email: row.email,
                display_name: row.display_name,
                role: parse_column(&row.role, "role")?,
                created_at: row.created_at,
            },
            password_hash: row.password_hash,
            password_salt: row.password_salt,
        })
    }
}

const COLUMNS: &str = "id, username, email, display_name, role, password_hash, password_salt, created_at";

pub async fn create(
    pool: &DbPool,
    input: &RegisterInput,
    role: Role,
    password_hash: &str,
    password_salt: &str,
) -> AppResult<User> {
    let display_name = input.display_name.clone().unwrap_or_else(|| input.username.clone());
    let result = sqlx::query(
        "INSERT INTO users (username, email, display_name, role, password_hash, password_salt, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&input.username)
    .bind(&input.email)
    .bind(display_name)
    .bind(role.as_str())
    .bind(password_hash)
    .bind(password_salt)
    .bind(Utc::now())
    .execute(pool)
    .await
    .map_err(|e| AppError::from_write(e, "username or email"))?;
    get(pool, result.last_insert_rowid()).await
}

pub async fn find_credentials(pool: &DbPool, username: &str) -> AppResult<Option<UserCredentials>> {
    let sql = format!("SELECT {} FROM users WHERE username = ?", COLUMNS);
    let row = sqlx::query_as::<_, UserRow>(&sql)
        .bind(username)
        .fetch_optional(pool)
        .await?;
    row.map(UserCredentials::try_from).transpose()
}

pub async fn get(pool: &DbPool, id: i64) -> AppResult<User> {
    let sql = format!("SELECT {} FROM users WHERE id = ?", COLUMNS);
    let row = sqlx::query_as::<_, UserRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    Ok(UserCredentials::try_from(row)?.user)
}

pub async fn list(pool: &DbPool) -> AppResult<Vec<User>> {
    let sql = format!("SELECT {} FROM users ORDER BY id", COLUMNS);
    let rows = sqlx::query_as::<_, UserRow>(&sql).fetch_all(pool).await?;
    rows.into_iter()
        .map(|row| UserCredentials::try_from(row).map(|c| c.user))
        .collect()
}

pub async fn update(pool: &DbPool, id: i64, update: &UserUpdate) -> AppResult<User> {
    let current = get(pool, id).await?;
    let display_name = update.display_name.clone().unwrap_or(current.display_name);
    let role = update.role.unwrap_or(current.role);
    sqlx::query("UPDATE users SET display_name = ?, role = ? WHERE id = ?")
        .bind(display_name)
        .bind(role.as_str())
        .bind(id)
        .execute(pool)
        .await?;
    get(pool, id).await
}

/// 仍有署名文章的用户不能删除
pub async fn delete(pool: &DbPool, id: i64) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                AppError::Conflict("user still authors articles".to_string())
            }
            _ => AppError::Database(e),
        })?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("user"));
    }
    Ok(())
}

pub async fn count_by_role(pool: &DbPool, role: Role) -> AppResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = ?")
        .bind(role.as_str())
        .fetch_one(pool)
        .await?;
    Ok(count)
}
