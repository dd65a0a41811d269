//! console-core: session, authentication and authorization core for the admin console.
//!
//! Everything here is plain library code: the session store, the API client with its
//! refresh-and-retry protocol, the auth service and observable auth context, the route
//! guard, and typed clients for the user-management API. Rendering lives in
//! `admin-console`.
pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod observability;
pub mod services;
pub mod session;

pub use auth::{AuthContext, AuthService, AuthState, GuardDecision, RouteGuard};
pub use error::ConsoleError;
pub use http::{ApiClient, ApiRequest, SessionEvent};
pub use session::SessionStore;

pub use serde_json;
pub use tokio;
pub use tracing;
pub use validator;
