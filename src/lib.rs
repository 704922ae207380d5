// src/lib.rs

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod mentions;
pub mod model;
pub mod serving;

use std::sync::Arc;

use axum::Router;
use tracing::{info, warn};

use auth::password::hash_password;
use auth::token::TokenSigner;
use config::{AdminBootstrap, AppConfig};
use db::DbPool;
use error::AppResult;
use logging::event_log::EventLogger;
use model::user::{RegisterInput, Role};

/// 所有 handler 共享的状态
pub struct AppState {
    pub db: DbPool,
    pub config: Arc<AppConfig>,
    pub tokens: TokenSigner,
    pub event_log: Arc<EventLogger>,
}

impl AppState {
    pub fn new(db: DbPool, config: AppConfig, event_log: Arc<EventLogger>) -> Arc<Self> {
        let tokens = TokenSigner::new(&config.token_secret, config.token_ttl_hours);
        Arc::new(Self {
            db,
            config: Arc::new(config),
            tokens,
            event_log,
        })
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    api::router(state)
}

/// **初始化管理员**：库里还没有管理员时按配置创建一个
pub async fn bootstrap_admin(pool: &DbPool, admin: &AdminBootstrap) -> AppResult<bool> {
    if db::users::count_by_role(pool, Role::Admin).await? > 0 {
        return Ok(false);
    }
    let input = RegisterInput {
        username: admin.username.clone(),
        email: format!("{}@localhost", admin.username),
        password: admin.password.clone(),
        display_name: Some("Administrator".to_string()),
    };
    let input = match input.validated() {
        Ok(input) => input,
        Err(e) => {
            warn!(error = %e, "admin bootstrap credentials rejected");
            return Err(e);
        }
    };
    let (hash, salt) = hash_password(&input.password);
    let user = db::users::create(pool, &input, Role::Admin, &hash, &salt).await?;
    info!(user_id = user.id, username = %user.username, "bootstrap admin created");
    Ok(true)
}
