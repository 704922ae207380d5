// src/auth/mod.rs

pub mod password;
pub mod policy;
pub mod token;

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use tracing::debug;

use crate::db::users;
use crate::error::{AppError, AppResult};
use crate::model::user::{Role, User};
use crate::AppState;
use policy::{allows, Capability};

/// **已认证用户**
///
/// 每次请求都回库读取用户，角色变更和删号立即生效。
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl AuthUser {
    pub fn id(&self) -> i64 {
        self.0.id
    }

    pub fn role(&self) -> Role {
        self.0.role
    }

    pub fn can(&self, capability: Capability) -> bool {
        allows(self.0.role, capability)
    }

    /// 能力不足时返回 403
    pub fn require(&self, capability: Capability) -> AppResult<()> {
        if self.can(capability) {
            Ok(())
        } else {
            debug!(user_id = self.0.id, role = %self.0.role, ?capability, "capability denied");
            Err(AppError::Forbidden)
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<Result<&str, AppError>> {
    let header = parts.headers.get(AUTHORIZATION)?;
    let token = header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AppError::Unauthorized);
    Some(token)
}

async fn resolve(state: &AppState, token: &str) -> AppResult<AuthUser> {
    let claims = state.tokens.verify(token).map_err(|e| {
        debug!(error = %e, "rejected bearer token");
        AppError::Unauthorized
    })?;
    match users::get(&state.db, claims.sub).await {
        Ok(user) => Ok(AuthUser(user)),
        Err(AppError::NotFound(_)) => Err(AppError::Unauthorized),
        Err(e) => Err(e),
    }
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AppError::Unauthorized)??;
        resolve(state, token).await
    }
}

/// 可选认证：没有 Authorization 头时为 None，头部非法时仍然返回 401
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl FromRequestParts<Arc<AppState>> for MaybeAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        match bearer_token(parts) {
            None => Ok(MaybeAuthUser(None)),
            Some(token) => Ok(MaybeAuthUser(Some(resolve(state, token?).await?))),
        }
    }
}
