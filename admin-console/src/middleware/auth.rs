use crate::handlers::pages::{see_other, LoadingTemplate};
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use console_core::GuardDecision;

/// Gate every protected page through the route guard.
///
/// Paths the route table does not list pass through untouched. The decision is
/// taken fresh for each request from the current auth state.
pub async fn route_guard_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();
    let Some(route) = state.routes.lookup(path) else {
        return next.run(request).await;
    };

    let requested = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or(path)
        .to_string();
    let decision = state
        .guard
        .evaluate(&state.auth.snapshot(), &route.required_roles, &requested);
    state.metrics.record_guard_decision(decision.label());

    match &decision {
        GuardDecision::Render => next.run(request).await,
        GuardDecision::Pending => LoadingTemplate { requested }.into_response(),
        GuardDecision::RedirectToLogin { .. } | GuardDecision::Forbidden => {
            tracing::debug!(path = %requested, decision = decision.label(), "Route guard redirect");
            match state.guard.redirect_location(&decision) {
                Some(location) => see_other(&location),
                None => next.run(request).await,
            }
        }
    }
}
