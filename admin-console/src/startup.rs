use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers::{
    admin::{
        assign_service, assignment_page, audit_log_detail_page, audit_logs_page, create_role,
        create_service, delete_role, delete_service, delete_user, regenerate_credentials,
        role_detail_page, roles_page, service_detail_page, services_page, unassign_service,
        update_assignment, update_role, update_service, update_user_status, user_detail_page,
        users_page,
    },
    api::{session_events, session_state},
    app::{health_check, index},
    auth::{
        forgot_password_handler, forgot_password_page, login_handler, login_page,
        logout_handler, register_handler, register_page, verify_email,
    },
    dashboard::{dashboard_handler, user_home_handler},
    metrics::metrics,
    pages::{forbidden, not_found},
    profile::{change_password_handler, profile_page, update_profile_handler},
};
use crate::middleware::{metrics_middleware, request_id_middleware, route_guard_middleware};
use crate::AppState;
use console_core::observability::REQUEST_ID_HEADER;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        // Public
        .route("/login", get(login_page).post(login_handler))
        .route("/register", get(register_page).post(register_handler))
        .route(
            "/forgot-password",
            get(forgot_password_page).post(forgot_password_handler),
        )
        .route("/verify-email/:token", get(verify_email))
        .route("/logout", post(logout_handler))
        .route("/forbidden", get(forbidden))
        .route("/api/session", get(session_state))
        .route("/api/session/events", get(session_events))
        // Signed-in users
        .route("/user-home", get(user_home_handler))
        .route("/profile", get(profile_page).post(update_profile_handler))
        .route("/profile/password", post(change_password_handler))
        // Admin
        .route("/dashboard", get(dashboard_handler))
        .route("/users", get(users_page))
        .route("/users/:user_id", get(user_detail_page))
        .route("/users/:user_id/status", post(update_user_status))
        .route("/users/:user_id/delete", post(delete_user))
        .route("/users/:user_id/services", post(assign_service))
        .route(
            "/users/:user_id/services/:service_id",
            get(assignment_page).post(update_assignment),
        )
        .route(
            "/users/:user_id/services/:service_id/delete",
            post(unassign_service),
        )
        .route("/roles", get(roles_page).post(create_role))
        .route("/roles/:role_id", get(role_detail_page).post(update_role))
        .route("/roles/:role_id/delete", post(delete_role))
        .route("/services", get(services_page).post(create_service))
        .route(
            "/services/:service_id",
            get(service_detail_page).post(update_service),
        )
        .route(
            "/services/:service_id/credentials",
            post(regenerate_credentials),
        )
        .route("/services/:service_id/delete", post(delete_service))
        .route("/audit-logs", get(audit_logs_page))
        .route("/audit-logs/:log_id", get(audit_log_detail_page))
        .fallback(not_found)
        .layer(from_fn_with_state(state.clone(), route_guard_middleware))
        .layer(from_fn_with_state(state.clone(), metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}
