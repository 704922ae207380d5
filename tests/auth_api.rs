mod support;

use axum::http::StatusCode;
use serde_json::json;

use newsroom_cms::bootstrap_admin;
use newsroom_cms::config::AdminBootstrap;
use newsroom_cms::model::user::Role;
use support::spawn_app;

#[tokio::test]
async fn register_login_and_me() {
    let app = spawn_app().await;

    let (status, registered) = app
        .post(
            "/api/auth/register",
            None,
            json!({ "username": "reader1", "email": "Reader1@Example.com", "password": "long-enough" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(registered["user"]["role"], "user");
    assert_eq!(registered["user"]["email"], "reader1@example.com");
    assert_eq!(registered["user"]["displayName"], "reader1");
    assert!(registered["user"].get("passwordHash").is_none());

    let (status, _) = app
        .post("/api/auth/login", None, json!({ "username": "reader1", "password": "wrong-password" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app
        .post("/api/auth/login", None, json!({ "username": "ghost", "password": "long-enough" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, login) = app
        .post("/api/auth/login", None, json!({ "username": "reader1", "password": "long-enough" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = login["token"].as_str().unwrap().to_string();

    let (status, me) = app.get("/api/auth/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "reader1");
    let (status, _) = app.get("/api/auth/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn registration_is_validated() {
    let app = spawn_app().await;
    let body = json!({ "username": "dupe", "email": "dupe@example.com", "password": "long-enough" });
    let (status, _) = app.post("/api/auth/register", None, body.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app.post("/api/auth/register", None, body).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .post("/api/auth/register", None, json!({ "username": "x", "email": "x@example.com", "password": "short" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // 不能通过注册接口给自己指定角色
    let (status, _) = app
        .post(
            "/api/auth/register",
            None,
            json!({ "username": "sneaky", "email": "s@example.com", "password": "long-enough", "role": "admin" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn admin_manages_users_and_role_changes_apply_immediately() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    let reader = app.user_with_role("reader", Role::User).await;

    let (status, _) = app.get("/api/users", Some(&reader)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, users) = app.get("/api/users", Some(&admin)).await;
    let reader_id = users
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["username"] == "reader")
        .unwrap()["id"]
        .as_i64()
        .unwrap();

    let (status, promoted) = app
        .put(&format!("/api/users/{}", reader_id), Some(&admin), json!({ "role": "reporter" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(promoted["role"], "reporter");

    // 旧 token 仍然有效，但权限按最新角色计算
    let (status, _) = app.get("/api/news/mine", Some(&reader)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, me) = app.get("/api/auth/me", Some(&admin)).await;
    let admin_id = me["id"].as_i64().unwrap();
    let (status, _) = app.delete(&format!("/api/users/{}", admin_id), Some(&admin)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app.delete(&format!("/api/users/{}", reader_id), Some(&admin)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get("/api/auth/me", Some(&reader)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn bootstrap_admin_runs_once() {
    let app = spawn_app().await;
    let admin = AdminBootstrap {
        username: "root".into(),
        password: "bootstrap-password".into(),
    };
    assert!(bootstrap_admin(&app.state.db, &admin).await.unwrap());
    assert!(!bootstrap_admin(&app.state.db, &admin).await.unwrap());

    let (status, login) = app
        .post("/api/auth/login", None, json!({ "username": "root", "password": "bootstrap-password" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["user"]["role"], "admin");
}

#[tokio::test]
async fn health_is_public() {
    let app = spawn_app().await;
    let (status, body) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["db"], "ok");
}
