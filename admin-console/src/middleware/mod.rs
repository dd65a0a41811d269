pub mod auth;
pub mod metrics;
pub mod request_id;

pub use auth::route_guard_middleware;
pub use metrics::metrics_middleware;
pub use request_id::request_id_middleware;
