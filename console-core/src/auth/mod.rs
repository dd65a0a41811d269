mod context;
mod guard;
mod service;

pub use context::{AuthContext, AuthState, SESSION_EXPIRED_MESSAGE};
pub use guard::{
    default_landing, sanitize_return_to, GuardDecision, ProtectedRoute, RouteGuard, RouteTable,
    ADMIN_ROLE,
};
pub use service::AuthService;
