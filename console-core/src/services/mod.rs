//! Typed clients for the admin endpoints of the user-management API.
//!
//! All of them go through [`ApiClient`](crate::http::ApiClient), so they carry the
//! bearer token and share the refresh protocol.

pub mod assignments;
pub mod audit_logs;
pub mod dashboard;
pub mod registry;
pub mod roles;
pub mod users;

pub use assignments::AssignmentClient;
pub use audit_logs::AuditLogClient;
pub use dashboard::DashboardClient;
pub use registry::ServiceRegistryClient;
pub use roles::RoleClient;
pub use users::UserAdminClient;

use std::borrow::Cow;

/// Percent-encode an id for use as one path segment.
pub(crate) fn segment(id: &str) -> Cow<'_, str> {
    urlencoding::encode(id)
}
