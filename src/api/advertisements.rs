// src/api/advertisements.rs

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::extract::{ValidJson, ValidQuery};
use crate::auth::policy::Capability;
use crate::auth::AuthUser;
use crate::db::advertisements as ads;
use crate::error::AppResult;
use crate::logging::events::{AdEvent, AuditEvent};
use crate::model::advertisement::{
    AdPosition, AdStats, Advertisement, AdvertisementInput, DeviceTarget, ReorderRequest,
};
use crate::serving::engine::{self, AdRequest, Placement};
use crate::AppState;

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct ActiveQuery {
    pub position: AdPosition,
    pub page: Option<String>,
    pub device: Option<DeviceTarget>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PlacementQuery {
    pub position: AdPosition,
    pub page: Option<String>,
    pub device: Option<DeviceTarget>,
    /// between-articles 时表示第几篇文章之后（从 1 开始）
    pub article_index: Option<usize>,
}

async fn eligible(state: &AppState, request: &AdRequest) -> AppResult<Vec<Advertisement>> {
    let candidates = ads::list_active_for_position(&state.db, request.position).await?;
    Ok(engine::eligible_set(candidates, request, Utc::now()))
}

/// **公开接口：某个广告位当前合格的广告**
pub async fn active(
    State(state): State<Arc<AppState>>,
    ValidQuery(query): ValidQuery<ActiveQuery>,
) -> AppResult<Json<Vec<Advertisement>>> {
    let request = AdRequest::new(query.position, query.page.as_deref(), query.device);
    Ok(Json(eligible(&state, &request).await?))
}

/// **公开接口：按展示方式缩减后的广告位**
pub async fn placement(
    State(state): State<Arc<AppState>>,
    ValidQuery(query): ValidQuery<PlacementQuery>,
) -> AppResult<Json<Placement>> {
    let request = AdRequest::new(query.position, query.page.as_deref(), query.device);
    let mut candidates = eligible(&state, &request).await?;

    if let (AdPosition::BetweenArticles, Some(index)) = (request.position, query.article_index) {
        let keep: Vec<i64> = engine::between_articles(&candidates, index).iter().map(|ad| ad.id).collect();
        candidates.retain(|ad| keep.contains(&ad.id));
    }

    Ok(Json(engine::reduce(candidates, request.position, &mut rand::thread_rng())))
}

async fn track(state: &AppState, event: AdEvent, result: AppResult<()>) -> AppResult<Json<Value>> {
    match result {
        Ok(()) => {
            state.event_log.ad_event(&event).await;
            Ok(Json(json!({ "success": true })))
        }
        Err(e) => {
            warn!(ad_id = event.ad_id, event = %event.event, error = %e, "ad tracking not recorded");
            state.event_log.ad_event(&event.failed(&e.to_string())).await;
            Err(e)
        }
    }
}

pub async fn impression(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> AppResult<Json<Value>> {
    let result = ads::increment_impressions(&state.db, id).await;
    track(&state, AdEvent::impression(id), result).await
}

pub async fn click(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> AppResult<Json<Value>> {
    let result = ads::increment_clicks(&state.db, id).await;
    track(&state, AdEvent::click(id), result).await
}

pub async fn list(State(state): State<Arc<AppState>>, user: AuthUser) -> AppResult<Json<Vec<Advertisement>>> {
    user.require(Capability::ManageAdvertisements)?;
    Ok(Json(ads::list_all(&state.db).await?))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Advertisement>> {
    user.require(Capability::ManageAdvertisements)?;
    Ok(Json(ads::get(&state.db, id).await?))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidJson(input): ValidJson<AdvertisementInput>,
) -> AppResult<(StatusCode, Json<Advertisement>)> {
    user.require(Capability::ManageAdvertisements)?;
    let ad = ads::create(&state.db, &input.validated()?).await?;
    info!(ad_id = ad.id, position = %ad.position, "advertisement created");
    state
        .event_log
        .audit(&AuditEvent::new(user.id(), "advertisement.create", Some(ad.id)).with_detail(ad.position.as_str()))
        .await;
    Ok((StatusCode::CREATED, Json(ad)))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
    ValidJson(input): ValidJson<AdvertisementInput>,
) -> AppResult<Json<Advertisement>> {
    user.require(Capability::ManageAdvertisements)?;
    let ad = ads::update(&state.db, id, &input.validated()?).await?;
    state
        .event_log
        .audit(&AuditEvent::new(user.id(), "advertisement.update", Some(id)))
        .await;
    Ok(Json(ad))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    user.require(Capability::ManageAdvertisements)?;
    ads::delete(&state.db, id).await?;
    info!(ad_id = id, "advertisement deleted");
    state
        .event_log
        .audit(&AuditEvent::new(user.id(), "advertisement.delete", Some(id)))
        .await;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn toggle(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Advertisement>> {
    user.require(Capability::ManageAdvertisements)?;
    let ad = ads::toggle(&state.db, id).await?;
    let detail = if ad.is_active { "activated" } else { "deactivated" };
    state
        .event_log
        .audit(&AuditEvent::new(user.id(), "advertisement.toggle", Some(id)).with_detail(detail))
        .await;
    Ok(Json(ad))
}

pub async fn reorder(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidJson(request): ValidJson<ReorderRequest>,
) -> AppResult<Json<Value>> {
    user.require(Capability::ManageAdvertisements)?;
    request.validate()?;
    ads::reorder(&state.db, &request.items).await?;
    state
        .event_log
        .audit(
            &AuditEvent::new(user.id(), "advertisement.reorder", None)
                .with_detail(format!("{} items", request.items.len())),
        )
        .await;
    Ok(Json(json!({ "success": true })))
}

/// 展示 / 点击 / 点击率统计
pub async fn stats(State(state): State<Arc<AppState>>, user: AuthUser) -> AppResult<Json<Vec<AdStats>>> {
    user.require(Capability::ManageAdvertisements)?;
    let all = ads::list_all(&state.db).await?;
    Ok(Json(all.iter().map(AdStats::from).collect()))
}
