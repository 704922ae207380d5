#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tower::ServiceExt;

use newsroom_cms::auth::password::hash_password;
use newsroom_cms::config::AppConfig;
use newsroom_cms::logging::event_log::EventLogger;
use newsroom_cms::model::user::{RegisterInput, Role};
use newsroom_cms::{build_router, db, AppState};

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    _logs: TempDir,
}

pub async fn spawn_app() -> TestApp {
    let logs = tempfile::tempdir().unwrap();
    let log_dir = logs.path().to_str().unwrap().to_string();
    let config = AppConfig::in_memory(&log_dir);

    let pool = db::create_pool(&config.database_url).await.unwrap();
    db::migrate(&pool).await.unwrap();
    let event_log = EventLogger::new(&log_dir, "events", 64, 10, 50, 72);

    let state = AppState::new(pool, config, event_log);
    TestApp {
        router: build_router(state.clone()),
        state,
        _logs: logs,
    }
}

impl TestApp {
    pub async fn request(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// 直接写库创建指定角色的用户，返回其 token
    pub async fn user_with_role(&self, username: &str, role: Role) -> String {
        let input = RegisterInput {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password: "correct-horse".to_string(),
            display_name: None,
        }
        .validated()
        .unwrap();
        let (hash, salt) = hash_password(&input.password);
        let user = db::users::create(&self.state.db, &input, role, &hash, &salt).await.unwrap();
        self.state.tokens.issue(&user)
    }

    pub async fn admin(&self) -> String {
        self.user_with_role("admin", Role::Admin).await
    }

    pub async fn create_ad(&self, token: &str, body: Value) -> Value {
        let (status, ad) = self.post("/api/advertisements", Some(token), body).await;
        assert_eq!(status, StatusCode::CREATED, "{}", ad);
        ad
    }

    /// 在随机端口上启动真实 HTTP 服务
    pub async fn serve(&self) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = self.router.clone();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }
}

pub fn text_ad(title: &str, position: &str) -> Value {
    json!({
        "title": title,
        "type": "text",
        "content": format!("{} copy", title),
        "linkUrl": format!("https://example.com/{}", title),
        "position": position,
    })
}

/// 在基础请求体上覆盖字段
pub fn with(mut base: Value, extra: Value) -> Value {
    if let (Some(base), Some(extra)) = (base.as_object_mut(), extra.as_object()) {
        for (key, value) in extra {
            base.insert(key.clone(), value.clone());
        }
    }
    base
}
