// src/api/users.rs

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::info;

use super::extract::ValidJson;
use crate::auth::policy::Capability;
use crate::auth::AuthUser;
use crate::db::users;
use crate::error::{AppError, AppResult};
use crate::logging::events::AuditEvent;
use crate::model::user::{User, UserUpdate};
use crate::AppState;

pub async fn list(State(state): State<Arc<AppState>>, user: AuthUser) -> AppResult<Json<Vec<User>>> {
    user.require(Capability::ManageUsers)?;
    Ok(Json(users::list(&state.db).await?))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<User>> {
    user.require(Capability::ManageUsers)?;
    Ok(Json(users::get(&state.db, id).await?))
}

/// 修改角色或显示名；管理员不能降级自己
pub async fn update(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
    ValidJson(update): ValidJson<UserUpdate>,
) -> AppResult<Json<User>> {
    user.require(Capability::ManageUsers)?;
    let update = update.validated()?;
    if id == user.id() && update.role.is_some_and(|role| role != user.role()) {
        return Err(AppError::Conflict("you cannot change your own role".into()));
    }
    let updated = users::update(&state.db, id, &update).await?;
    if let Some(role) = update.role {
        info!(user_id = id, role = %role, "user role changed");
    }
    state
        .event_log
        .audit(&AuditEvent::new(user.id(), "user.update", Some(id)).with_detail(updated.role.as_str()))
        .await;
    Ok(Json(updated))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    user.require(Capability::ManageUsers)?;
    if id == user.id() {
        return Err(AppError::Conflict("you cannot delete your own account".into()));
    }
    users::delete(&state.db, id).await?;
    state
        .event_log
        .audit(&AuditEvent::new(user.id(), "user.delete", Some(id)))
        .await;
    Ok(StatusCode::NO_CONTENT)
}
