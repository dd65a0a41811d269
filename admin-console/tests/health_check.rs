mod common;

use axum::http::StatusCode;
use common::{body_text, location, user, TestApp};
use console_core::models::Credentials;
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn health_check_works() {
    let app = TestApp::spawn().await;

    let response = app.get("/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(body_text(response).await, "OK");
}

#[tokio::test]
async fn protected_page_redirects_anonymous_visitor_to_login() {
    let app = TestApp::spawn().await;

    let response = app.get("/dashboard").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?from=%2Fdashboard");
}

#[tokio::test]
async fn admin_page_is_forbidden_without_admin_role() {
    let app = TestApp::spawn_with(Some(user(&["user"]))).await;

    let response = app.get("/users").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/forbidden");

    // Any signed-in user may see their own pages.
    let response = app.get("/user-home").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Jane Doe"));
}

#[tokio::test]
async fn protected_page_shows_placeholder_while_login_is_in_flight() {
    let app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path("/users/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "token": "access-1",
                    "refreshToken": "refresh-1",
                    "user": {"id": "u1", "roles": ["admin"]}
                }))
                .set_delay(Duration::from_millis(800)),
        )
        .mount(&app.server)
        .await;

    let auth = app.state.auth.clone();
    let login = tokio::spawn(async move { auth.login(&Credentials::new("admin", "secret")).await });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let response = app.get("/dashboard").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Checking your session"));

    let signed_in = login.await.unwrap().unwrap();
    assert!(signed_in.is_admin());
    assert!(!app.state.auth.snapshot().loading);
}

#[tokio::test]
async fn login_redirects_to_requested_page() {
    let app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path("/users/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "access-1",
            "refreshToken": "refresh-1",
            "user": {"id": "u1", "username": "admin", "roles": ["admin"]}
        })))
        .expect(1)
        .mount(&app.server)
        .await;

    let response = app
        .post_form("/login", "username=admin&password=secret&from=%2Froles")
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/roles");
    assert_eq!(app.store.access_token().as_deref(), Some("access-1"));
}

#[tokio::test]
async fn login_ignores_offsite_return_target() {
    let app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path("/users/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "access-1",
            "refreshToken": "refresh-1",
            "user": {"id": "u2", "roles": ["user"]}
        })))
        .mount(&app.server)
        .await;

    let response = app
        .post_form(
            "/login",
            "username=jane&password=secret&from=%2F%2Fevil.example.com",
        )
        .await;

    assert_eq!(location(&response), "/user-home");
}

#[tokio::test]
async fn login_ignores_return_target_hidden_behind_a_tab() {
    let app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path("/users/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "access-1",
            "refreshToken": "refresh-1",
            "user": {"id": "u2", "roles": ["user"]}
        })))
        .mount(&app.server)
        .await;

    let response = app
        .post_form(
            "/login",
            "username=jane&password=secret&from=%2F%09%2Fevil.example",
        )
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/user-home");
}

#[tokio::test]
async fn signed_in_visit_to_login_with_newline_target_goes_to_landing() {
    let app = TestApp::admin().await;

    let response = app.get("/login?from=%2Fusers%0Ax").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard");

    let response = app.get("/login?from=%2Froles").await;
    assert_eq!(location(&response), "/roles");
}

#[tokio::test]
async fn failed_login_rerenders_form_with_message() {
    let app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path("/users/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Bad login"})))
        .mount(&app.server)
        .await;

    let response = app
        .post_form("/login", "username=admin&password=wrong")
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(body_text(response).await.contains("value=\"admin\""));
    assert!(app.store.load().is_empty());
}

#[tokio::test]
async fn expired_session_during_page_load_redirects_to_login() {
    let app = TestApp::spawn_with(Some(user(&["admin"]))).await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&app.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/refresh-token"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&app.server)
        .await;

    let response = app.get("/users").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?from=%2Fusers");
    assert!(app.store.load().is_empty());
}

#[tokio::test]
async fn logout_clears_session_and_returns_to_login() {
    let app = TestApp::spawn_with(Some(user(&["admin"]))).await;
    Mock::given(method("POST"))
        .and(path("/users/logout"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.server)
        .await;

    let response = app.post_form("/logout", "").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
    assert!(app.store.load().is_empty());
    assert!(app.state.auth.snapshot().user.is_none());
}

#[tokio::test]
async fn session_endpoint_reports_auth_state() {
    let app = TestApp::spawn_with(Some(user(&["admin"]))).await;

    let response = app.get("/api/session").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["loading"], false);
    assert_eq!(body["user"]["id"], "u1");
    assert_eq!(body["error"], Value::Null);
}

#[tokio::test]
async fn metrics_endpoint_exposes_request_counters() {
    let app = TestApp::spawn().await;
    app.get("/health").await;
    app.get("/dashboard").await;

    let response = app.get("/metrics").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("http_requests_total"));
    assert!(body.contains("route_guard_decisions_total{decision=\"redirect_login\"} 1"));
}

#[tokio::test]
async fn unknown_path_renders_not_found() {
    let app = TestApp::spawn().await;

    let response = app.get("/no-such-page").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_text(response).await.contains("/no-such-page"));
}
