use super::segment;
use crate::error::ConsoleError;
use crate::http::{ApiClient, ApiRequest};
use crate::models::{
    AssignmentInput, AssignmentUpdate, ServiceRecord, UserRecord, UserServiceAssignment,
};
use std::sync::Arc;

/// Which users may use which registered services.
#[derive(Clone)]
pub struct AssignmentClient {
    api: Arc<ApiClient>,
}

impl AssignmentClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    fn pair_path(user_id: &str, service_id: &str) -> String {
        format!("/user-services/{}/{}", segment(user_id), segment(service_id))
    }

    #[tracing::instrument(
        skip(self, input),
        fields(user_id = %input.user_id, service_id = %input.service_id)
    )]
    pub async fn assign(
        &self,
        input: &AssignmentInput,
    ) -> Result<UserServiceAssignment, ConsoleError> {
        let assignment = self.api.post("/user-services", input).await?;
        tracing::info!("User assigned to service");
        Ok(assignment)
    }

    pub async fn update(
        &self,
        user_id: &str,
        service_id: &str,
        update: &AssignmentUpdate,
    ) -> Result<UserServiceAssignment, ConsoleError> {
        self.api
            .put(&Self::pair_path(user_id, service_id), update)
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn remove(&self, user_id: &str, service_id: &str) -> Result<(), ConsoleError> {
        self.api
            .send(ApiRequest::delete(Self::pair_path(user_id, service_id)))
            .await?;
        tracing::info!("User removed from service");
        Ok(())
    }

    pub async fn users_for_service(
        &self,
        service_id: &str,
    ) -> Result<Vec<UserRecord>, ConsoleError> {
        self.api
            .get(&format!("/user-services/users/{}", segment(service_id)))
            .await
    }

    pub async fn services_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<ServiceRecord>, ConsoleError> {
        self.api
            .get(&format!("/user-services/services/{}", segment(user_id)))
            .await
    }

    pub async fn details(
        &self,
        user_id: &str,
        service_id: &str,
    ) -> Result<UserServiceAssignment, ConsoleError> {
        self.api.get(&Self::pair_path(user_id, service_id)).await
    }
}
