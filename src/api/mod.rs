// src/api/mod.rs

pub mod advertisements;
pub mod auth;
pub mod categories;
pub mod extract;
pub mod news;
pub mod pages;
pub mod people;
pub mod settings;
pub mod users;

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::AppState;

async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let db = match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => "ok",
        Err(e) => {
            warn!(error = %e, "health check database ping failed");
            "unavailable"
        }
    };
    Json(json!({ "status": "ok", "db": db }))
}

fn advertisement_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/advertisements",
            get(advertisements::list).post(advertisements::create),
        )
        .route("/api/advertisements/active", get(advertisements::active))
        .route("/api/advertisements/placement", get(advertisements::placement))
        .route("/api/advertisements/stats", get(advertisements::stats))
        .route("/api/advertisements/reorder", put(advertisements::reorder))
        .route(
            "/api/advertisements/{id}",
            get(advertisements::get)
                .put(advertisements::update)
                .delete(advertisements::delete),
        )
        .route("/api/advertisements/{id}/toggle", put(advertisements::toggle))
        .route("/api/advertisements/{id}/impression", post(advertisements::impression))
        .route("/api/advertisements/{id}/click", post(advertisements::click))
}

/// `/api/news/{id}` 在 GET 时按 slug 查找，其他方法按数字 id
fn news_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/news", get(news::list).post(news::create))
        .route("/api/news/mine", get(news::mine))
        .route("/api/news/suggest-people", post(news::suggest_people))
        .route(
            "/api/news/{id}",
            get(news::by_slug).put(news::update).delete(news::delete),
        )
        .route("/api/news/{id}/view", post(news::view))
        .route("/api/news/{id}/publish", put(news::publish))
        .route("/api/news/{id}/unpublish", put(news::unpublish))
}

fn directory_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/people", get(people::list).post(people::create))
        .route(
            "/api/people/{id}",
            get(people::get).put(people::update).delete(people::delete),
        )
        .route("/api/categories", get(categories::list).post(categories::create))
        .route(
            "/api/categories/{id}",
            get(categories::get).put(categories::update).delete(categories::delete),
        )
        .route("/api/pages", get(pages::list).post(pages::create))
        .route(
            "/api/pages/{id}",
            get(pages::by_slug).put(pages::update).delete(pages::delete),
        )
        .route("/api/settings", get(settings::all).put(settings::update))
}

fn account_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/me", get(auth::me))
        .route("/api/users", get(users::list))
        .route(
            "/api/users/{id}",
            get(users::get).put(users::update).delete(users::delete),
        )
}

/// **组装全部路由**
pub fn router(state: Arc<AppState>) -> Router {
    let uploads = ServeDir::new(&state.config.upload_dir);

    Router::new()
        .route("/health", get(health))
        .merge(account_routes())
        .merge(advertisement_routes())
        .merge(news_routes())
        .merge(directory_routes())
        .nest_service("/uploads", uploads)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
