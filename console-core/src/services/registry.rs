use super::segment;
use crate::error::ConsoleError;
use crate::http::{ApiClient, ApiRequest};
use crate::models::{ServiceCredentials, ServiceInput, ServiceRecord};
use std::sync::Arc;
use validator::Validate;

/// Registered downstream services and their client credentials.
#[derive(Clone)]
pub struct ServiceRegistryClient {
    api: Arc<ApiClient>,
}

impl ServiceRegistryClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    #[tracing::instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: &ServiceInput) -> Result<ServiceRecord, ConsoleError> {
        input.validate()?;
        let service: ServiceRecord = self.api.post("/services", input).await?;
        tracing::info!(service_id = %service.id, "Service registered");
        Ok(service)
    }

    pub async fn list(&self) -> Result<Vec<ServiceRecord>, ConsoleError> {
        self.api.get("/services").await
    }

    pub async fn get(&self, service_id: &str) -> Result<ServiceRecord, ConsoleError> {
        self.api
            .get(&format!("/services/{}", segment(service_id)))
            .await
    }

    pub async fn update(
        &self,
        service_id: &str,
        input: &ServiceInput,
    ) -> Result<ServiceRecord, ConsoleError> {
        input.validate()?;
        self.api
            .put(&format!("/services/{}", segment(service_id)), input)
            .await
    }

    /// Issue a new client secret; the previous one stops working.
    #[tracing::instrument(skip(self))]
    pub async fn regenerate_credentials(
        &self,
        service_id: &str,
    ) -> Result<ServiceCredentials, ConsoleError> {
        let path = format!("/services/{}/regenerate-credentials", segment(service_id));
        let credentials: ServiceCredentials = self.api.fetch(ApiRequest::post(path)).await?;
        tracing::info!(client_id = %credentials.client_id, "Service credentials regenerated");
        Ok(credentials)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, service_id: &str) -> Result<(), ConsoleError> {
        self.api
            .send(ApiRequest::delete(format!("/services/{}", segment(service_id))))
            .await?;
        tracing::info!("Service deleted");
        Ok(())
    }
}
