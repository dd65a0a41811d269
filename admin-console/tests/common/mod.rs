#![allow(dead_code)]

use admin_console::services::Metrics;
use admin_console::startup::build_router;
use admin_console::AppState;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request},
    response::Response,
    Router,
};
use console_core::config::ApiSettings;
use console_core::models::{Session, TokenPair, UserRecord};
use console_core::{ApiClient, SessionStore};
use serde_json::json;
use std::sync::Arc;
use tower::util::ServiceExt;
use wiremock::MockServer;

pub const ACCESS_TOKEN: &str = "access-1";

pub struct TestApp {
    pub server: MockServer,
    pub store: SessionStore,
    pub state: AppState,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(None).await
    }

    /// Start against a mock API, optionally with a session left by an earlier login.
    pub async fn spawn_with(signed_in: Option<UserRecord>) -> Self {
        let server = MockServer::start().await;
        let store = SessionStore::in_memory();
        if let Some(user) = signed_in {
            store
                .save(&Session::new(
                    TokenPair {
                        token: ACCESS_TOKEN.to_string(),
                        refresh_token: "refresh-1".to_string(),
                    },
                    user,
                ))
                .expect("Failed to seed session");
        }

        let api = Arc::new(
            ApiClient::new(&ApiSettings::new(server.uri()), store.clone())
                .expect("Failed to build API client"),
        );
        let metrics = Arc::new(Metrics::new().expect("Failed to build metrics"));
        let state = AppState::new(api, metrics);
        state.auth.watch_session_events();

        Self {
            server,
            store,
            state,
        }
    }

    /// Signed in with the admin role, as most admin page tests need.
    pub async fn admin() -> Self {
        Self::spawn_with(Some(user(&["admin"]))).await
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    pub async fn post_form(&self, uri: &str, form: &str) -> Response {
        self.router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(form.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }
}

pub fn user(roles: &[&str]) -> UserRecord {
    serde_json::from_value(json!({
        "id": "u1",
        "username": "jane",
        "email": "jane@example.com",
        "displayName": "Jane Doe",
        "roles": roles,
    }))
    .unwrap()
}

pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

pub async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
