// src/api/settings.rs

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use super::extract::ValidJson;
use crate::auth::policy::Capability;
use crate::auth::AuthUser;
use crate::db::settings;
use crate::error::AppResult;
use crate::logging::events::AuditEvent;
use crate::model::setting::SettingsUpdate;
use crate::AppState;

pub async fn all(State(state): State<Arc<AppState>>) -> AppResult<Json<BTreeMap<String, String>>> {
    Ok(Json(settings::all(&state.db).await?))
}

/// 批量写入，返回更新后的完整设置
pub async fn update(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidJson(update): ValidJson<SettingsUpdate>,
) -> AppResult<Json<BTreeMap<String, String>>> {
    user.require(Capability::ManageSettings)?;
    update.validate()?;
    let merged = settings::upsert_many(&state.db, &update).await?;
    let keys = update.0.keys().cloned().collect::<Vec<_>>().join(",");
    state
        .event_log
        .audit(&AuditEvent::new(user.id(), "settings.update", None).with_detail(keys))
        .await;
    Ok(Json(merged))
}
