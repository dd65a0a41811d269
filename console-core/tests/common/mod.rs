#![allow(dead_code)]

use console_core::config::ApiSettings;
use console_core::models::{Session, TokenPair, UserRecord};
use console_core::{ApiClient, AuthContext, AuthService, SessionStore};
use serde_json::json;
use std::sync::Arc;
use wiremock::MockServer;

pub const ACCESS_TOKEN: &str = "access-1";
pub const REFRESH_TOKEN: &str = "refresh-1";

/// A console core wired to a mock user-management API.
pub struct TestConsole {
    pub server: MockServer,
    pub store: SessionStore,
    pub api: Arc<ApiClient>,
    pub auth: AuthService,
}

impl TestConsole {
    pub async fn spawn() -> Self {
        let server = MockServer::start().await;
        let store = SessionStore::in_memory();
        let api = Arc::new(
            ApiClient::new(&ApiSettings::new(server.uri()), store.clone())
                .expect("Failed to build API client"),
        );
        let auth = AuthService::new(api.clone());

        Self {
            server,
            store,
            api,
            auth,
        }
    }

    /// Put a signed-in session in the store, as a previous login would have.
    pub fn sign_in(&self, user: UserRecord) {
        self.store
            .save(&Session::new(
                TokenPair {
                    token: ACCESS_TOKEN.to_string(),
                    refresh_token: REFRESH_TOKEN.to_string(),
                },
                user,
            ))
            .expect("Failed to seed session");
    }

    pub fn context(&self) -> Arc<AuthContext> {
        let context = Arc::new(AuthContext::new(self.auth.clone()));
        context.initialize();
        context
    }
}

pub fn user(roles: &[&str]) -> UserRecord {
    serde_json::from_value(json!({
        "id": "u1",
        "username": "jane",
        "email": "jane@example.com",
        "displayName": "Jane Doe",
        "roles": roles,
        "status": "active",
        "isEmailVerified": true,
        "metadata": {"location": "Lisbon"}
    }))
    .expect("Invalid test user")
}
