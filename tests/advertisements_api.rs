mod support;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;

use newsroom_cms::model::user::Role;
use support::{spawn_app, text_ad, with};

fn ids(value: &serde_json::Value) -> Vec<i64> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|ad| ad["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn active_ads_follow_schedule_and_priority() {
    let app = spawn_app().await;
    let admin = app.admin().await;

    let low = app.create_ad(&admin, with(text_ad("low", "sidebar-right"), json!({ "priority": 1 }))).await;
    let high = app.create_ad(&admin, with(text_ad("high", "sidebar-right"), json!({ "priority": 5 }))).await;
    app.create_ad(
        &admin,
        with(
            text_ad("expired", "sidebar-right"),
            json!({
                "priority": 9,
                "startDate": (Utc::now() - Duration::days(10)).to_rfc3339(),
                "endDate": (Utc::now() - Duration::days(1)).to_rfc3339(),
            }),
        ),
    )
    .await;
    app.create_ad(&admin, text_ad("elsewhere", "footer-top")).await;

    let (status, body) = app.get("/api/advertisements/active?position=sidebar-right", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![high["id"].as_i64().unwrap(), low["id"].as_i64().unwrap()]);
}

#[tokio::test]
async fn device_and_page_targeting() {
    let app = spawn_app().await;
    let admin = app.admin().await;

    app.create_ad(&admin, with(text_ad("mobile", "sidebar-right"), json!({ "deviceTarget": "mobile" }))).await;
    let (_, body) = app
        .get("/api/advertisements/active?position=sidebar-right&page=home&device=desktop", None)
        .await;
    assert!(body.as_array().unwrap().is_empty());
    let (_, body) = app
        .get("/api/advertisements/active?position=sidebar-right&page=home&device=mobile", None)
        .await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    app.create_ad(
        &admin,
        with(text_ad("sports", "header-top"), json!({ "pages": ["sports"], "excludePages": [] })),
    )
    .await;
    app.create_ad(
        &admin,
        with(text_ad("everywhere", "header-top"), json!({ "pages": ["all"], "excludePages": ["contact"] })),
    )
    .await;

    let (_, sports) = app.get("/api/advertisements/active?position=header-top&page=sports", None).await;
    assert_eq!(sports.as_array().unwrap().len(), 2);
    let (_, home) = app.get("/api/advertisements/active?position=header-top", None).await;
    assert_eq!(home.as_array().unwrap().len(), 1);
    let (_, contact) = app.get("/api/advertisements/active?position=header-top&page=contact", None).await;
    assert!(contact.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_queries_and_bodies_are_rejected() {
    let app = spawn_app().await;
    let admin = app.admin().await;

    let (status, body) = app.get("/api/advertisements/active?position=nowhere", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = app.get("/api/advertisements/active", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(
            "/api/advertisements",
            Some(&admin),
            with(text_ad("bad", "header-top"), json!({ "pages": "home,sports" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .post(
            "/api/advertisements",
            Some(&admin),
            json!({ "title": "no image", "type": "image", "position": "header-top" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "imageUrl is required for image advertisements");
}

#[tokio::test]
async fn admin_routes_require_admin() {
    let app = spawn_app().await;
    let reporter = app.user_with_role("reporter", Role::Reporter).await;

    let (status, _) = app.get("/api/advertisements", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.get("/api/advertisements", Some(&reporter)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.get("/api/advertisements", Some("not-a-token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app
        .post("/api/advertisements", Some(&reporter), text_ad("x", "header-top"))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn toggle_reorder_and_counters() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    let first = app.create_ad(&admin, text_ad("first", "content-top")).await;
    let second = app.create_ad(&admin, text_ad("second", "content-top")).await;
    let (first_id, second_id) = (first["id"].as_i64().unwrap(), second["id"].as_i64().unwrap());

    let (status, _) = app
        .put(
            "/api/advertisements/reorder",
            Some(&admin),
            json!({ "items": [{ "id": first_id, "sortOrder": 2 }, { "id": second_id, "sortOrder": 1 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app.get("/api/advertisements/active?position=content-top", None).await;
    assert_eq!(ids(&body), vec![second_id, first_id]);

    let (status, toggled) = app
        .put(&format!("/api/advertisements/{}/toggle", second_id), Some(&admin), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["isActive"], false);
    let (_, body) = app.get("/api/advertisements/active?position=content-top", None).await;
    assert_eq!(ids(&body), vec![first_id]);

    for _ in 0..4 {
        let (status, body) = app
            .post(&format!("/api/advertisements/{}/impression", first_id), None, json!({}))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }
    app.post(&format!("/api/advertisements/{}/click", first_id), None, json!({})).await;

    let (_, stats) = app.get("/api/advertisements/stats", Some(&admin)).await;
    let row = stats
        .as_array()
        .unwrap()
        .iter()
        .find(|row| row["id"].as_i64() == Some(first_id))
        .unwrap()
        .clone();
    assert_eq!(row["impressions"], 4);
    assert_eq!(row["clicks"], 1);
    assert_eq!(row["ctr"], 25.0);

    let (status, _) = app.post("/api/advertisements/9999/click", None, json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn placement_reduces_by_display_mode() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    for (title, priority) in [("a", 3), ("b", 3), ("c", 1)] {
        app.create_ad(
            &admin,
            with(
                text_ad(title, "content-middle"),
                json!({ "priority": priority, "displayMode": "priority", "rotationInterval": 5 }),
            ),
        )
        .await;
    }

    let (status, placement) = app.get("/api/advertisements/placement?position=content-middle", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(placement["displayMode"], "priority");
    assert_eq!(placement["rotationInterval"], 5);
    assert_eq!(placement["overlay"], false);
    let ads = placement["ads"].as_array().unwrap();
    assert_eq!(ads.len(), 2);
    assert!(ads.iter().all(|ad| ad["priority"] == 3));
}

#[tokio::test]
async fn between_articles_respects_spacing() {
    let app = spawn_app().await;
    let admin = app.admin().await;
    app.create_ad(
        &admin,
        with(
            text_ad("every-third", "between-articles"),
            json!({ "articlePosition": 3, "displayMode": "all" }),
        ),
    )
    .await;

    let (_, second) = app
        .get("/api/advertisements/placement?position=between-articles&articleIndex=2", None)
        .await;
    assert!(second["ads"].as_array().unwrap().is_empty());
    let (_, third) = app
        .get("/api/advertisements/placement?position=between-articles&articleIndex=3", None)
        .await;
    assert_eq!(third["ads"].as_array().unwrap().len(), 1);
}
