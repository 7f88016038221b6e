//! Admin API over the rule store.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use http_rewrite::admin::{setup_admin_router, AdminState};
use http_rewrite::RawRule;

mod common;

const KEY: &str = "test-key";

fn authed(method: &str, uri: &str, body: Option<serde_json::Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {KEY}"));
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

#[tokio::test]
async fn test_requests_without_key_are_rejected() {
    let app = setup_admin_router(AdminState::new(common::store(Vec::new()), KEY));

    let missing = app
        .clone()
        .oneshot(common::request("GET", "/admin/status"))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let wrong = Request::builder()
        .uri("/admin/rules")
        .header(header::AUTHORIZATION, "Bearer nope")
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.oneshot(wrong).await.unwrap().status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_empty_key_never_authenticates() {
    let app = setup_admin_router(AdminState::new(common::store(Vec::new()), ""));

    let request = Request::builder()
        .uri("/admin/status")
        .header(header::AUTHORIZATION, "Bearer ")
        .body(Body::empty())
        .unwrap();

    assert_eq!(app.oneshot(request).await.unwrap().status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_status_reports_rule_count() {
    let store = common::store(vec![RawRule::new("^/a$", "/b"), RawRule::new("^/c$", "/d")]);
    let app = setup_admin_router(AdminState::new(store, KEY));

    let response = app.oneshot(authed("GET", "/admin/status", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["rules"], 2);
    assert_eq!(body["status"], "operational");
}

#[tokio::test]
async fn test_add_list_and_reset_rules() {
    let store = common::store(Vec::new());
    let app = setup_admin_router(AdminState::new(store.clone(), KEY));

    let added = app
        .clone()
        .oneshot(authed(
            "POST",
            "/admin/rules",
            Some(json!({ "from": "^/old$", "to": "/new", "redirect": 301 })),
        ))
        .await
        .unwrap();
    assert_eq!(added.status(), StatusCode::CREATED);
    assert_eq!(common::body_json(added).await["registered"], true);

    let listed = app
        .clone()
        .oneshot(authed("GET", "/admin/rules", None))
        .await
        .unwrap();
    assert_eq!(
        common::body_json(listed).await,
        json!([{ "from": "^/old$", "to": "/new", "redirect": 301 }])
    );

    let reset = app
        .clone()
        .oneshot(authed("DELETE", "/admin/rules", None))
        .await
        .unwrap();
    assert_eq!(reset.status(), StatusCode::NO_CONTENT);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_invalid_rule_is_unprocessable() {
    let store = common::store(Vec::new());
    let app = setup_admin_router(AdminState::new(store.clone(), KEY));

    let response = app
        .oneshot(authed("POST", "/admin/rules", Some(json!({ "to": "/x" }))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = common::body_json(response).await;
    assert_eq!(body["registered"], false);
    assert!(body["error"].is_string());
    assert!(store.is_empty());
}
