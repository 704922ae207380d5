// src/api/pages.rs

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use super::extract::ValidJson;
use crate::auth::policy::Capability;
use crate::auth::{AuthUser, MaybeAuthUser};
use crate::db::pages;
use crate::error::{AppError, AppResult};
use crate::logging::events::AuditEvent;
use crate::model::page::{Page, PageInput};
use crate::AppState;

fn is_editor(viewer: &Option<AuthUser>) -> bool {
    viewer.as_ref().is_some_and(|user| user.can(Capability::ManagePages))
}

/// 访客只看到已发布页面，管理员看到全部
pub async fn list(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(viewer): MaybeAuthUser,
) -> AppResult<Json<Vec<Page>>> {
    let published_only = !is_editor(&viewer);
    Ok(Json(pages::list(&state.db, published_only).await?))
}

pub async fn by_slug(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(slug): Path<String>,
) -> AppResult<Json<Page>> {
    let page = pages::get_by_slug(&state.db, &slug).await?;
    if !page.is_published && !is_editor(&viewer) {
        return Err(AppError::NotFound("page"));
    }
    Ok(Json(page))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidJson(input): ValidJson<PageInput>,
) -> AppResult<(StatusCode, Json<Page>)> {
    user.require(Capability::ManagePages)?;
    let page = pages::create(&state.db, &input.validated()?).await?;
    state
        .event_log
        .audit(&AuditEvent::new(user.id(), "page.create", Some(page.id)))
        .await;
    Ok((StatusCode::CREATED, Json(page)))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
    ValidJson(input): ValidJson<PageInput>,
) -> AppResult<Json<Page>> {
    user.require(Capability::ManagePages)?;
    let page = pages::update(&state.db, id, &input.validated()?).await?;
    state
        .event_log
        .audit(&AuditEvent::new(user.id(), "page.update", Some(id)))
        .await;
    Ok(Json(page))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    user.require(Capability::ManagePages)?;
    pages::delete(&state.db, id).await?;
    state
        .event_log
        .audit(&AuditEvent::new(user.id(), "page.delete", Some(id)))
        .await;
    Ok(StatusCode::NO_CONTENT)
}
