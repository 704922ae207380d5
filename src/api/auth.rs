// src/api/auth.rs

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::{info, warn};

use super::extract::ValidJson;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::policy::Capability;
use crate::auth::AuthUser;
use crate::db::users;
use crate::error::{AppError, AppResult};
use crate::model::user::{AuthResponse, LoginInput, RegisterInput, Role, User};
use crate::AppState;

/// 自助注册，角色固定为 user
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidJson(input): ValidJson<RegisterInput>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let input = input.validated()?;
    let (hash, salt) = hash_password(&input.password);
    let user = users::create(&state.db, &input, Role::User, &hash, &salt).await?;
    info!(user_id = user.id, username = %user.username, "user registered");
    let token = state.tokens.issue(&user);
    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

/// 用户名不存在和密码错误返回同样的 401
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidJson(input): ValidJson<LoginInput>,
) -> AppResult<Json<AuthResponse>> {
    let username = input.username.trim();
    let credentials = users::find_credentials(&state.db, username).await?;
    let Some(credentials) = credentials else {
        warn!(username, "login for unknown user");
        return Err(AppError::Unauthorized);
    };
    if !verify_password(&input.password, &credentials.password_hash, &credentials.password_salt) {
        warn!(username, "login with wrong password");
        return Err(AppError::Unauthorized);
    }
    let user = credentials.user;
    let token = state.tokens.issue(&user);
    Ok(Json(AuthResponse { token, user }))
}

pub async fn me(user: AuthUser) -> AppResult<Json<User>> {
    user.require(Capability::ViewOwnProfile)?;
    Ok(Json(user.0))
}
