// src/api/news.rs

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use tracing::info;

use super::extract::{ValidJson, ValidQuery};
use crate::auth::policy::Capability;
use crate::auth::{AuthUser, MaybeAuthUser};
use crate::db::{news, people};
use crate::error::{AppError, AppResult};
use crate::logging::events::AuditEvent;
use crate::mentions::{self, Suggestion};
use crate::model::news::{News, NewsInput, NewsListQuery, NewsStatus, SuggestPeopleInput};
use crate::AppState;

/// 记者只能改自己的文章，管理员可以改全部
fn ensure_editable(user: &AuthUser, article: &News) -> AppResult<()> {
    user.require(Capability::WriteNews)?;
    if article.author_id == user.id() || user.can(Capability::ManageAllNews) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// **公开列表**：已发布文章，支持分类和分页
pub async fn list(
    State(state): State<Arc<AppState>>,
    ValidQuery(query): ValidQuery<NewsListQuery>,
) -> AppResult<Json<Vec<News>>> {
    Ok(Json(news::list_published(&state.db, &query).await?))
}

/// 草稿只对作者和管理员可见，其余人看到 404
pub async fn by_slug(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(slug): Path<String>,
) -> AppResult<Json<News>> {
    let article = news::get_by_slug(&state.db, &slug).await?;
    let privileged = viewer
        .as_ref()
        .is_some_and(|user| user.id() == article.author_id || user.can(Capability::ManageAllNews));
    if !article.is_published() && !privileged {
        return Err(AppError::NotFound("article"));
    }
    Ok(Json(article))
}

pub async fn view(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> AppResult<Json<Value>> {
    let views = news::increment_views(&state.db, id).await?;
    Ok(Json(json!({ "views": views })))
}

/// 记者看到自己的文章，管理员看到全部
pub async fn mine(State(state): State<Arc<AppState>>, user: AuthUser) -> AppResult<Json<Vec<News>>> {
    user.require(Capability::WriteNews)?;
    let author = (!user.can(Capability::ManageAllNews)).then(|| user.id());
    Ok(Json(news::list_for_author(&state.db, author).await?))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidJson(input): ValidJson<NewsInput>,
) -> AppResult<(StatusCode, Json<News>)> {
    user.require(Capability::WriteNews)?;
    let article = news::create(&state.db, user.id(), &input.validated()?).await?;
    info!(news_id = article.id, author_id = user.id(), "article drafted");
    Ok((StatusCode::CREATED, Json(article)))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
    ValidJson(input): ValidJson<NewsInput>,
) -> AppResult<Json<News>> {
    let existing = news::get(&state.db, id).await?;
    ensure_editable(&user, &existing)?;
    Ok(Json(news::update(&state.db, id, &input.validated()?).await?))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    let existing = news::get(&state.db, id).await?;
    ensure_editable(&user, &existing)?;
    news::delete(&state.db, id).await?;
    state
        .event_log
        .audit(&AuditEvent::new(user.id(), "news.delete", Some(id)).with_detail(existing.slug))
        .await;
    Ok(StatusCode::NO_CONTENT)
}

async fn transition(state: &AppState, user: &AuthUser, id: i64, status: NewsStatus) -> AppResult<Json<News>> {
    user.require(Capability::PublishNews)?;
    let article = news::set_status(&state.db, id, status).await?;
    info!(news_id = id, status = %status, "article status changed");
    state
        .event_log
        .audit(&AuditEvent::new(user.id(), "news.status", Some(id)).with_detail(status.as_str()))
        .await;
    Ok(Json(article))
}

pub async fn publish(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<News>> {
    transition(&state, &user, id, NewsStatus::Published).await
}

pub async fn unpublish(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<News>> {
    transition(&state, &user, id, NewsStatus::Draft).await
}

/// **根据正文建议相关人物**
pub async fn suggest_people(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidJson(input): ValidJson<SuggestPeopleInput>,
) -> AppResult<Json<Vec<Suggestion>>> {
    user.require(Capability::SuggestPeople)?;
    let known = people::all(&state.db).await?;
    Ok(Json(mentions::suggest(&input.content, &known, &input.tagged_ids)))
}
