// src/api/people.rs

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use super::extract::{ValidJson, ValidQuery};
use crate::auth::policy::Capability;
use crate::auth::AuthUser;
use crate::db::people;
use crate::error::AppResult;
use crate::logging::events::AuditEvent;
use crate::model::person::{PeopleQuery, Person, PersonInput};
use crate::AppState;

/// 人物目录，支持按名字模糊搜索和按类别过滤
pub async fn list(
    State(state): State<Arc<AppState>>,
    ValidQuery(query): ValidQuery<PeopleQuery>,
) -> AppResult<Json<Vec<Person>>> {
    Ok(Json(people::list(&state.db, &query).await?))
}

pub async fn get(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> AppResult<Json<Person>> {
    Ok(Json(people::get(&state.db, id).await?))
}

/// 记者也可以新建人物，编辑和删除只允许管理员
pub async fn create(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidJson(input): ValidJson<PersonInput>,
) -> AppResult<(StatusCode, Json<Person>)> {
    user.require(Capability::CreatePeople)?;
    let person = people::create(&state.db, &input.validated()?).await?;
    state
        .event_log
        .audit(&AuditEvent::new(user.id(), "person.create", Some(person.id)))
        .await;
    Ok((StatusCode::CREATED, Json(person)))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
    ValidJson(input): ValidJson<PersonInput>,
) -> AppResult<Json<Person>> {
    user.require(Capability::ManagePeople)?;
    let person = people::update(&state.db, id, &input.validated()?).await?;
    state
        .event_log
        .audit(&AuditEvent::new(user.id(), "person.update", Some(id)))
        .await;
    Ok(Json(person))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    user.require(Capability::ManagePeople)?;
    people::delete(&state.db, id).await?;
    state
        .event_log
        .audit(&AuditEvent::new(user.id(), "person.delete", Some(id)))
        .await;
    Ok(StatusCode::NO_CONTENT)
}
