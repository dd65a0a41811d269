use super::segment;
use crate::error::ConsoleError;
use crate::http::ApiClient;
use crate::models::{AuditLog, AuditLogQuery};
use std::sync::Arc;

#[derive(Clone)]
pub struct AuditLogClient {
    api: Arc<ApiClient>,
}

impl AuditLogClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub async fn list(&self, query: &AuditLogQuery) -> Result<Vec<AuditLog>, ConsoleError> {
        self.api.get_with_query("/audit-logs", query).await
    }

    pub async fn get(&self, log_id: &str) -> Result<AuditLog, ConsoleError> {
        self.api
            .get(&format!("/audit-logs/{}", segment(log_id)))
            .await
    }

    pub async fn by_user(
        &self,
        user_id: &str,
        query: &AuditLogQuery,
    ) -> Result<Vec<AuditLog>, ConsoleError> {
        self.api
            .get_with_query(&format!("/audit-logs/user/{}", segment(user_id)), query)
            .await
    }

    pub async fn by_service(
        &self,
        service_id: &str,
        query: &AuditLogQuery,
    ) -> Result<Vec<AuditLog>, ConsoleError> {
        self.api
            .get_with_query(&format!("/audit-logs/service/{}", segment(service_id)), query)
            .await
    }
}
