// src/api/categories.rs

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use super::extract::ValidJson;
use crate::auth::policy::Capability;
use crate::auth::AuthUser;
use crate::db::categories;
use crate::error::AppResult;
use crate::logging::events::AuditEvent;
use crate::model::category::{Category, CategoryInput};
use crate::AppState;

pub async fn list(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<Category>>> {
    Ok(Json(categories::list(&state.db).await?))
}

pub async fn get(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> AppResult<Json<Category>> {
    Ok(Json(categories::get(&state.db, id).await?))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidJson(input): ValidJson<CategoryInput>,
) -> AppResult<(StatusCode, Json<Category>)> {
    user.require(Capability::ManageCategories)?;
    let category = categories::create(&state.db, &input.validated()?).await?;
    state
        .event_log
        .audit(&AuditEvent::new(user.id(), "category.create", Some(category.id)).with_detail(category.slug.clone()))
        .await;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
    ValidJson(input): ValidJson<CategoryInput>,
) -> AppResult<Json<Category>> {
    user.require(Capability::ManageCategories)?;
    let category = categories::update(&state.db, id, &input.validated()?).await?;
    state
        .event_log
        .audit(&AuditEvent::new(user.id(), "category.update", Some(id)))
        .await;
    Ok(Json(category))
}

/// 仍有文章引用的分类不能删除（409）
pub async fn delete(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    user.require(Capability::ManageCategories)?;
    categories::delete(&state.db, id).await?;
    state
        .event_log
        .audit(&AuditEvent::new(user.id(), "category.delete", Some(id)))
        .await;
    Ok(StatusCode::NO_CONTENT)
}
