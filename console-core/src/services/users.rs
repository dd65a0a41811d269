use super::segment;
use crate::error::ConsoleError;
use crate::http::{ApiClient, ApiRequest};
use crate::models::{UserRecord, UserStatus};
use serde_json::json;
use std::sync::Arc;

/// Account administration (admin only).
#[derive(Clone)]
pub struct UserAdminClient {
    api: Arc<ApiClient>,
}

impl UserAdminClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub async fn list(&self) -> Result<Vec<UserRecord>, ConsoleError> {
        self.api.get("/users").await
    }

    pub async fn get(&self, user_id: &str) -> Result<UserRecord, ConsoleError> {
        self.api.get(&format!("/users/{}", segment(user_id))).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_status(
        &self,
        user_id: &str,
        status: UserStatus,
    ) -> Result<(), ConsoleError> {
        let request = ApiRequest::put(format!("/users/{}/status", segment(user_id)))
            .with_body(json!({ "status": status }));
        self.api.send(request).await?;
        tracing::info!("User status updated");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, user_id: &str) -> Result<(), ConsoleError> {
        self.api
            .send(ApiRequest::delete(format!("/users/{}", segment(user_id))))
            .await?;
        tracing::info!("User deleted");
        Ok(())
    }
}
