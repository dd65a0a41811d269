pub mod config;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod startup;

use console_core::auth::{RouteGuard, RouteTable};
use console_core::services::{
    AssignmentClient, AuditLogClient, DashboardClient, RoleClient, ServiceRegistryClient,
    UserAdminClient,
};
use console_core::{ApiClient, AuthContext, AuthService};
use services::Metrics;
use std::sync::Arc;

/// Shared application state: the auth context and the typed API clients.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthContext>,
    pub guard: RouteGuard,
    pub routes: Arc<RouteTable>,
    pub users: UserAdminClient,
    pub roles: RoleClient,
    pub services: ServiceRegistryClient,
    pub assignments: AssignmentClient,
    pub audit_logs: AuditLogClient,
    pub dashboard: DashboardClient,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    /// Wire every client to `api` and rehydrate the auth context from its store.
    pub fn new(api: Arc<ApiClient>, metrics: Arc<Metrics>) -> Self {
        let auth = Arc::new(AuthContext::new(AuthService::new(api.clone())));
        auth.initialize();

        Self {
            auth,
            guard: RouteGuard::default(),
            routes: Arc::new(RouteTable::console()),
            users: UserAdminClient::new(api.clone()),
            roles: RoleClient::new(api.clone()),
            services: ServiceRegistryClient::new(api.clone()),
            assignments: AssignmentClient::new(api.clone()),
            audit_logs: AuditLogClient::new(api.clone()),
            dashboard: DashboardClient::new(api),
            metrics,
        }
    }
}
