mod common;

use axum::http::StatusCode;
use common::{body_text, location, TestApp};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

fn log(id: &str, action: &str) -> Value {
    json!({"_id": id, "action": action, "timestamp": "2024-03-01T10:00:00Z"})
}

async fn mount_get(app: &TestApp, route: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&app.server)
        .await;
}

/// Everything the user detail page loads for user `u2`.
async fn mount_user_detail(app: &TestApp) {
    mount_get(app, "/users/u2", json!({"id": "u2", "username": "sam"})).await;
    mount_get(
        app,
        "/user-services/services/u2",
        json!([{"_id": "s1", "name": "Billing", "active": true}]),
    )
    .await;
    mount_get(
        app,
        "/services",
        json!([
            {"_id": "s1", "name": "Billing", "active": true},
            {"_id": "s2", "name": "Reports", "active": true}
        ]),
    )
    .await;
    mount_get(app, "/audit-logs/user/u2", json!([log("l1", "user.login")])).await;
}

#[tokio::test]
async fn status_change_is_sent_then_list_rerendered_with_notice() {
    let app = TestApp::admin().await;
    Mock::given(method("PUT"))
        .and(path("/users/u2/status"))
        .and(body_json(json!({"status": "suspended"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
        .expect(1)
        .mount(&app.server)
        .await;
    mount_get(&app, "/users", json!([{"id": "u2", "username": "sam"}])).await;

    let response = app.post_form("/users/u2/status", "status=suspended").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("User status updated"));
    assert!(body.contains("sam"));
}

#[tokio::test]
async fn deleting_a_user_calls_delete() {
    let app = TestApp::admin().await;
    Mock::given(method("DELETE"))
        .and(path("/users/u2"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&app.server)
        .await;
    mount_get(&app, "/users", json!([])).await;

    let response = app.post_form("/users/u2/delete", "").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("User deleted"));
}

#[tokio::test]
async fn failed_action_shows_server_message_inline() {
    let app = TestApp::admin().await;
    Mock::given(method("DELETE"))
        .and(path("/users/u2"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({"message": "User owns services"})),
        )
        .expect(1)
        .mount(&app.server)
        .await;
    mount_get(&app, "/users", json!([])).await;

    let response = app.post_form("/users/u2/delete", "").await;

    let body = body_text(response).await;
    assert!(body.contains("User owns services"));
    assert!(!body.contains("User deleted"));
}

#[tokio::test]
async fn session_lost_during_action_returns_to_login() {
    let app = TestApp::admin().await;
    Mock::given(method("DELETE"))
        .and(path("/users/u2"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&app.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/refresh-token"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&app.server)
        .await;

    let response = app.post_form("/users/u2/delete", "").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?from=%2Fusers");
    assert!(app.store.load().is_empty());
}

#[tokio::test]
async fn user_detail_lists_access_and_recent_activity() {
    let app = TestApp::admin().await;
    mount_user_detail(&app).await;

    let response = app.get("/users/u2").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Billing"));
    assert!(body.contains("Reports"));
    assert!(body.contains("user.login"));
}

#[tokio::test]
async fn assigning_a_service_posts_the_pair_with_roles() {
    let app = TestApp::admin().await;
    Mock::given(method("POST"))
        .and(path("/user-services"))
        .and(body_json(json!({
            "userId": "u2",
            "serviceId": "s2",
            "roles": ["viewer", "editor"]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "userId": "u2", "serviceId": "s2", "roles": ["viewer", "editor"]
        })))
        .expect(1)
        .mount(&app.server)
        .await;
    mount_user_detail(&app).await;

    let response = app
        .post_form("/users/u2/services", "service_id=s2&roles=viewer%2C+editor")
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Service assigned"));
}

#[tokio::test]
async fn removing_service_access_deletes_the_pair() {
    let app = TestApp::admin().await;
    Mock::given(method("DELETE"))
        .and(path("/user-services/u2/s1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&app.server)
        .await;
    mount_user_detail(&app).await;

    let response = app.post_form("/users/u2/services/s1/delete", "").await;

    assert!(body_text(response).await.contains("Service access removed"));
}

#[tokio::test]
async fn assignment_page_shows_and_updates_roles() {
    let app = TestApp::admin().await;
    mount_get(
        &app,
        "/user-services/u2/s1",
        json!({"userId": "u2", "serviceId": "s1", "roles": ["viewer"], "status": "active"}),
    )
    .await;
    Mock::given(method("PUT"))
        .and(path("/user-services/u2/s1"))
        .and(body_json(json!({"roles": ["editor"], "status": "active"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "userId": "u2", "serviceId": "s1", "roles": ["editor"], "status": "active"
        })))
        .expect(1)
        .mount(&app.server)
        .await;

    let response = app.get("/users/u2/services/s1").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("viewer"));

    let response = app.post_form("/users/u2/services/s1", "roles=editor&status=active").await;
    assert!(body_text(response).await.contains("Service access updated"));
}

#[tokio::test]
async fn creating_a_role_splits_permissions() {
    let app = TestApp::admin().await;
    Mock::given(method("POST"))
        .and(path("/roles"))
        .and(body_json(json!({"name": "editor", "permissions": ["read", "write"]})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "_id": "r1", "name": "editor", "permissions": ["read", "write"]
        })))
        .expect(1)
        .mount(&app.server)
        .await;
    mount_get(&app, "/roles", json!([{"_id": "r1", "name": "editor"}])).await;

    let response = app
        .post_form("/roles", "name=editor&description=&permissions=read%2C+write")
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Role created"));
}

#[tokio::test]
async fn invalid_role_is_rejected_before_the_api() {
    let app = TestApp::admin().await;
    Mock::given(method("POST"))
        .and(path("/roles"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&app.server)
        .await;
    mount_get(&app, "/roles", json!([])).await;

    let response = app.post_form("/roles", "name=x").await;

    assert!(body_text(response)
        .await
        .contains("Role name must be between 2 and 50 characters"));
}

#[tokio::test]
async fn deleting_a_role_calls_delete() {
    let app = TestApp::admin().await;
    Mock::given(method("DELETE"))
        .and(path("/roles/r1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&app.server)
        .await;
    mount_get(&app, "/roles", json!([])).await;

    let response = app.post_form("/roles/r1/delete", "").await;

    assert!(body_text(response).await.contains("Role deleted"));
}

#[tokio::test]
async fn role_page_loads_and_saves_the_role() {
    let app = TestApp::admin().await;
    mount_get(
        &app,
        "/roles/r1",
        json!({"_id": "r1", "name": "editor", "permissions": ["read"]}),
    )
    .await;
    Mock::given(method("PUT"))
        .and(path("/roles/r1"))
        .and(body_json(json!({
            "name": "writer",
            "description": "Writes things",
            "permissions": ["read", "write"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_id": "r1", "name": "writer", "permissions": ["read", "write"]
        })))
        .expect(1)
        .mount(&app.server)
        .await;

    let response = app.get("/roles/r1").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("editor"));

    let response = app
        .post_form(
            "/roles/r1",
            "name=writer&description=Writes+things&permissions=read%2Cwrite",
        )
        .await;
    assert!(body_text(response).await.contains("Role updated"));
}

#[tokio::test]
async fn missing_role_falls_back_to_role_list_with_error() {
    let app = TestApp::admin().await;
    Mock::given(method("GET"))
        .and(path("/roles/gone"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "Role not found"})),
        )
        .mount(&app.server)
        .await;
    mount_get(&app, "/roles", json!([])).await;

    let response = app.get("/roles/gone").await;

    assert!(body_text(response).await.contains("Role not found"));
}

#[tokio::test]
async fn registering_a_service_marks_it_active() {
    let app = TestApp::admin().await;
    Mock::given(method("POST"))
        .and(path("/services"))
        .and(body_json(json!({
            "name": "Billing",
            "url": "https://billing.example.com",
            "active": true
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "_id": "s1", "name": "Billing", "active": true
        })))
        .expect(1)
        .mount(&app.server)
        .await;
    mount_get(&app, "/services", json!([])).await;

    let response = app
        .post_form(
            "/services",
            "name=Billing&description=&url=https%3A%2F%2Fbilling.example.com",
        )
        .await;

    assert!(body_text(response).await.contains("Service registered"));
}

#[tokio::test]
async fn new_credentials_are_shown_once() {
    let app = TestApp::admin().await;
    Mock::given(method("POST"))
        .and(path("/services/s1/regenerate-credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "clientId": "client-2",
            "clientSecret": "secret-2"
        })))
        .expect(1)
        .mount(&app.server)
        .await;
    mount_get(&app, "/services", json!([{"_id": "s1", "name": "Billing"}])).await;

    let response = app.post_form("/services/s1/credentials", "").await;
    let body = body_text(response).await;
    assert!(body.contains("secret-2"));

    let response = app.get("/services").await;
    assert!(!body_text(response).await.contains("secret-2"));
}

#[tokio::test]
async fn deleting_a_service_calls_delete() {
    let app = TestApp::admin().await;
    Mock::given(method("DELETE"))
        .and(path("/services/s1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&app.server)
        .await;
    mount_get(&app, "/services", json!([])).await;

    let response = app.post_form("/services/s1/delete", "").await;

    assert!(body_text(response).await.contains("Service deleted"));
}

#[tokio::test]
async fn service_page_shows_users_and_saves_settings() {
    let app = TestApp::admin().await;
    mount_get(
        &app,
        "/services/s1",
        json!({"_id": "s1", "name": "Billing", "active": true, "clientId": "client-1"}),
    )
    .await;
    mount_get(&app, "/user-services/users/s1", json!([{"id": "u2", "username": "sam"}])).await;
    mount_get(&app, "/audit-logs/service/s1", json!([log("l3", "service.update")])).await;
    // An unticked checkbox is simply absent from the form.
    Mock::given(method("PUT"))
        .and(path("/services/s1"))
        .and(body_json(json!({"name": "Billing", "active": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_id": "s1", "name": "Billing", "active": false
        })))
        .expect(1)
        .mount(&app.server)
        .await;

    let response = app.get("/services/s1").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("sam"));
    assert!(body.contains("service.update"));
    assert!(body.contains("client-1"));

    let response = app.post_form("/services/s1", "name=Billing&description=&url=").await;
    assert!(body_text(response).await.contains("Service updated"));
}

#[tokio::test]
async fn audit_filter_and_paging_are_forwarded() {
    let app = TestApp::admin().await;
    Mock::given(method("GET"))
        .and(path("/audit-logs"))
        .and(query_param("action", "user.login"))
        .and(query_param("page", "2"))
        .and(query_param("limit", "10"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([log("l1", "user.login")])),
        )
        .expect(1)
        .mount(&app.server)
        .await;

    let response = app.get("/audit-logs?action=user.login&page=2&limit=10").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Newer"));
    assert!(!body.contains("Older"));
}

#[tokio::test]
async fn audit_page_at_the_last_page_number_renders_without_next_link() {
    let app = TestApp::admin().await;
    let full_page: Vec<Value> = (0..25)
        .map(|i| log(&format!("l{}", i), "user.login"))
        .collect();
    Mock::given(method("GET"))
        .and(path("/audit-logs"))
        .and(query_param("page", "4294967295"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(full_page)))
        .expect(1)
        .mount(&app.server)
        .await;

    let response = app.get("/audit-logs?page=4294967295").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Page 4294967295"));
    assert!(body.contains("Newer"));
    assert!(!body.contains("Older"));
}

#[tokio::test]
async fn audit_page_size_is_kept_in_range() {
    let app = TestApp::admin().await;
    Mock::given(method("GET"))
        .and(path("/audit-logs"))
        .and(query_param("limit", "1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([log("l1", "user.login")])),
        )
        .expect(1)
        .mount(&app.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/audit-logs"))
        .and(query_param("limit", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&app.server)
        .await;

    let response = app.get("/audit-logs?limit=0").await;
    assert_eq!(response.status(), StatusCode::OK);
    // One entry fills a page of one, so there is an older page.
    assert!(body_text(response).await.contains("Older"));

    let response = app.get("/audit-logs?limit=100000").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn audit_entry_page_shows_details() {
    let app = TestApp::admin().await;
    mount_get(
        &app,
        "/audit-logs/l9",
        json!({
            "_id": "l9",
            "action": "service.delete",
            "details": "Removed Billing",
            "userId": {"_id": "u1", "username": "jane"},
            "timestamp": "2024-03-01T10:00:00Z"
        }),
    )
    .await;

    let response = app.get("/audit-logs/l9").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("service.delete"));
    assert!(body.contains("Removed Billing"));
    assert!(body.contains("jane"));
}
