use super::segment;
use crate::error::ConsoleError;
use crate::http::{ApiClient, ApiRequest};
use crate::models::{Role, RoleInput};
use std::sync::Arc;
use validator::Validate;

#[derive(Clone)]
pub struct RoleClient {
    api: Arc<ApiClient>,
}

impl RoleClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    #[tracing::instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: &RoleInput) -> Result<Role, ConsoleError> {
        input.validate()?;
        let role: Role = self.api.post("/roles", input).await?;
        tracing::info!(role_id = %role.id, "Role created");
        Ok(role)
    }

    pub async fn list(&self) -> Result<Vec<Role>, ConsoleError> {
        self.api.get("/roles").await
    }

    pub async fn get(&self, role_id: &str) -> Result<Role, ConsoleError> {
        self.api.get(&format!("/roles/{}", segment(role_id))).await
    }

    pub async fn update(&self, role_id: &str, input: &RoleInput) -> Result<Role, ConsoleError> {
        input.validate()?;
        self.api
            .put(&format!("/roles/{}", segment(role_id)), input)
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, role_id: &str) -> Result<(), ConsoleError> {
        self.api
            .send(ApiRequest::delete(format!("/roles/{}", segment(role_id))))
            .await?;
        tracing::info!("Role deleted");
        Ok(())
    }
}
