pub mod assignment;
pub mod audit_log;
pub mod auth;
pub mod dashboard;
pub mod role;
pub mod service;
pub mod session;
pub mod user;

pub use assignment::{AssignmentInput, AssignmentUpdate, UserServiceAssignment};
pub use audit_log::{AuditActor, AuditLog, AuditLogQuery};
pub use auth::{
    ChangePasswordRequest, Credentials, ForgotPasswordRequest, RegisterRequest, RegisteredUser,
};
pub use dashboard::{
    ActivityDataset, ActivitySeries, ActivityStatus, DashboardStats, RecentActivity,
};
pub use role::{Role, RoleInput};
pub use service::{ServiceCredentials, ServiceInput, ServiceRecord};
pub use session::{Session, TokenPair};
pub use user::{ProfileUpdate, UserRecord, UserStatus};
