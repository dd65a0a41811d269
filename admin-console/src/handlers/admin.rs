//! Admin pages: users, roles, registered services and the audit trail.
//!
//! Actions re-render their list with a notice or an inline error; a lost
//! session sends the operator back through login.

use super::pages::{session_lost_redirect, PageContext};
use crate::AppState;
use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Form,
};
use console_core::models::{
    AssignmentInput, AssignmentUpdate, AuditLog, AuditLogQuery, Role, RoleInput,
    ServiceCredentials, ServiceInput, ServiceRecord, UserRecord, UserServiceAssignment,
    UserStatus,
};
use console_core::ConsoleError;
use serde::Deserialize;

const AUDIT_PAGE_SIZE: u32 = 25;
const AUDIT_PAGE_MAX: u32 = 100;
/// Entries shown in the activity panel of a user or service page.
const RECENT_ACTIVITY: u32 = 10;

#[derive(Template)]
#[template(path = "users.html")]
pub struct UsersTemplate {
    pub page: PageContext,
    pub users: Vec<UserRecord>,
    pub statuses: Vec<UserStatus>,
}

#[derive(Template)]
#[template(path = "user_detail.html")]
pub struct UserDetailTemplate {
    pub page: PageContext,
    pub profile: UserRecord,
    pub assigned: Vec<ServiceRecord>,
    pub available: Vec<ServiceRecord>,
    pub activity: Vec<AuditLog>,
}

#[derive(Template)]
#[template(path = "assignment.html")]
pub struct AssignmentTemplate {
    pub page: PageContext,
    pub assignment: UserServiceAssignment,
}

#[derive(Template)]
#[template(path = "roles.html")]
pub struct RolesTemplate {
    pub page: PageContext,
    pub roles: Vec<Role>,
}

#[derive(Template)]
#[template(path = "role_detail.html")]
pub struct RoleDetailTemplate {
    pub page: PageContext,
    pub role: Role,
}

#[derive(Template)]
#[template(path = "services.html")]
pub struct ServicesTemplate {
    pub page: PageContext,
    pub services: Vec<ServiceRecord>,
    pub credentials: Option<ServiceCredentials>,
}

#[derive(Template)]
#[template(path = "service_detail.html")]
pub struct ServiceDetailTemplate {
    pub page: PageContext,
    pub service: ServiceRecord,
    pub users: Vec<UserRecord>,
    pub activity: Vec<AuditLog>,
}

#[derive(Template)]
#[template(path = "audit_logs.html")]
pub struct AuditLogsTemplate {
    pub page: PageContext,
    pub logs: Vec<AuditLog>,
    pub action: String,
    pub limit: u32,
    pub current_page: u32,
    pub prev_page: Option<u32>,
    pub next_page: Option<u32>,
}

#[derive(Template)]
#[template(path = "audit_log_detail.html")]
pub struct AuditLogDetailTemplate {
    pub page: PageContext,
    pub log: AuditLog,
}

#[derive(Deserialize)]
pub struct StatusForm {
    pub status: UserStatus,
}

#[derive(Deserialize)]
pub struct RoleForm {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Comma-separated.
    #[serde(default)]
    pub permissions: String,
}

#[derive(Deserialize)]
pub struct ServiceForm {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
    /// Checkbox; absent when unticked. The create form has no such field.
    #[serde(default)]
    pub active: Option<String>,
}

#[derive(Deserialize)]
pub struct AssignForm {
    pub service_id: String,
    /// Comma-separated.
    #[serde(default)]
    pub roles: String,
}

#[derive(Deserialize)]
pub struct AssignmentForm {
    /// Comma-separated.
    #[serde(default)]
    pub roles: String,
    #[serde(default)]
    pub status: String,
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn optional(raw: String) -> Option<String> {
    let raw = raw.trim().to_string();
    (!raw.is_empty()).then_some(raw)
}

/// Outcome of an admin action, turned into the alert on the re-rendered list.
fn action_page<T>(
    state: &AppState,
    result: &Result<T, ConsoleError>,
    notice: &str,
) -> PageContext {
    match result {
        Ok(_) => PageContext::new(state).with_notice(notice),
        Err(e) => {
            tracing::warn!(error = %e, "Admin action failed");
            PageContext::new(state).with_error(e.user_message())
        }
    }
}

fn lost<T>(state: &AppState, result: &Result<T, ConsoleError>, from: &str) -> Option<Response> {
    result
        .as_ref()
        .err()
        .and_then(|e| session_lost_redirect(state, e, from))
}

/// A side panel that may come back empty without failing the page.
fn panel<T>(result: Result<Vec<T>, ConsoleError>, what: &str) -> Vec<T> {
    result.unwrap_or_else(|e| {
        tracing::warn!(error = %e, panel = what, "Failed to load page panel");
        Vec::new()
    })
}

/// Page numbers either side of `current`; there is a next page only after a full one.
fn neighbours(current: u32, full: bool) -> (Option<u32>, Option<u32>) {
    let prev = current.checked_sub(1).filter(|page| *page >= 1);
    let next = if full { current.checked_add(1) } else { None };
    (prev, next)
}

// Users

async fn render_users(state: &AppState, page: PageContext) -> Response {
    match state.users.list().await {
        Ok(users) => UsersTemplate {
            page,
            users,
            statuses: vec![UserStatus::Active, UserStatus::Pending, UserStatus::Suspended],
        }
        .into_response(),
        Err(e) => session_lost_redirect(state, &e, "/users").unwrap_or_else(|| {
            (
                e.http_status(),
                UsersTemplate {
                    page: page.with_error(e.user_message()),
                    users: Vec::new(),
                    statuses: Vec::new(),
                },
            )
                .into_response()
        }),
    }
}

pub async fn users_page(State(state): State<AppState>) -> Response {
    render_users(&state, PageContext::new(&state)).await
}

pub async fn update_user_status(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Form(form): Form<StatusForm>,
) -> Response {
    let result = state.users.update_status(&user_id, form.status).await;
    if let Some(redirect) = lost(&state, &result, "/users") {
        return redirect;
    }
    let page = action_page(&state, &result, "User status updated");
    render_users(&state, page).await
}

pub async fn delete_user(State(state): State<AppState>, Path(user_id): Path<String>) -> Response {
    let result = state.users.delete(&user_id).await;
    if let Some(redirect) = lost(&state, &result, "/users") {
        return redirect;
    }
    let page = action_page(&state, &result, "User deleted");
    render_users(&state, page).await
}

async fn render_user_detail(state: &AppState, user_id: &str, page: PageContext) -> Response {
    let from = format!("/users/{}", user_id);
    let recent = AuditLogQuery::limit(RECENT_ACTIVITY);
    let (profile, assigned, services, activity) = tokio::join!(
        state.users.get(user_id),
        state.assignments.services_for_user(user_id),
        state.services.list(),
        state.audit_logs.by_user(user_id, &recent),
    );

    let profile = match profile {
        Ok(profile) => profile,
        Err(e) => {
            return session_lost_redirect(state, &e, &from)
                .unwrap_or_else(|| render_users_error(state, e))
        }
    };

    let (page, assigned) = match assigned {
        Ok(assigned) => (page, assigned),
        Err(e) => {
            if let Some(redirect) = session_lost_redirect(state, &e, &from) {
                return redirect;
            }
            (page.with_error(e.user_message()), Vec::new())
        }
    };
    let available = services
        .unwrap_or_default()
        .into_iter()
        .filter(|service| !assigned.iter().any(|a| a.id == service.id))
        .collect();

    UserDetailTemplate {
        page,
        profile,
        assigned,
        available,
        activity: panel(activity, "user_activity"),
    }
    .into_response()
}

fn render_users_error(state: &AppState, e: ConsoleError) -> Response {
    (
        e.http_status(),
        UsersTemplate {
            page: PageContext::new(state).with_error(e.user_message()),
            users: Vec::new(),
            statuses: Vec::new(),
        },
    )
        .into_response()
}

pub async fn user_detail_page(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Response {
    render_user_detail(&state, &user_id, PageContext::new(&state)).await
}

pub async fn assign_service(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Form(form): Form<AssignForm>,
) -> Response {
    let input = AssignmentInput {
        user_id: user_id.clone(),
        service_id: form.service_id,
        roles: split_list(&form.roles),
    };
    let result = state.assignments.assign(&input).await;
    let from = format!("/users/{}", user_id);
    if let Some(redirect) = lost(&state, &result, &from) {
        return redirect;
    }
    let page = action_page(&state, &result, "Service assigned");
    render_user_detail(&state, &user_id, page).await
}

pub async fn unassign_service(
    State(state): State<AppState>,
    Path((user_id, service_id)): Path<(String, String)>,
) -> Response {
    let result = state.assignments.remove(&user_id, &service_id).await;
    let from = format!("/users/{}", user_id);
    if let Some(redirect) = lost(&state, &result, &from) {
        return redirect;
    }
    let page = action_page(&state, &result, "Service access removed");
    render_user_detail(&state, &user_id, page).await
}

async fn render_assignment(
    state: &AppState,
    user_id: &str,
    service_id: &str,
    page: PageContext,
) -> Response {
    match state.assignments.details(user_id, service_id).await {
        Ok(assignment) => AssignmentTemplate { page, assignment }.into_response(),
        Err(e) => {
            let from = format!("/users/{}/services/{}", user_id, service_id);
            if let Some(redirect) = session_lost_redirect(state, &e, &from) {
                return redirect;
            }
            render_user_detail(state, user_id, page.with_error(e.user_message())).await
        }
    }
}

pub async fn assignment_page(
    State(state): State<AppState>,
    Path((user_id, service_id)): Path<(String, String)>,
) -> Response {
    render_assignment(&state, &user_id, &service_id, PageContext::new(&state)).await
}

pub async fn update_assignment(
    State(state): State<AppState>,
    Path((user_id, service_id)): Path<(String, String)>,
    Form(form): Form<AssignmentForm>,
) -> Response {
    let update = AssignmentUpdate {
        roles: Some(split_list(&form.roles)),
        status: optional(form.status),
    };
    let result = state
        .assignments
        .update(&user_id, &service_id, &update)
        .await;
    let from = format!("/users/{}/services/{}", user_id, service_id);
    if let Some(redirect) = lost(&state, &result, &from) {
        return redirect;
    }
    let page = action_page(&state, &result, "Service access updated");
    render_assignment(&state, &user_id, &service_id, page).await
}

// Roles

async fn render_roles(state: &AppState, page: PageContext) -> Response {
    match state.roles.list().await {
        Ok(roles) => RolesTemplate { page, roles }.into_response(),
        Err(e) => session_lost_redirect(state, &e, "/roles").unwrap_or_else(|| {
            (
                e.http_status(),
                RolesTemplate {
                    page: page.with_error(e.user_message()),
                    roles: Vec::new(),
                },
            )
                .into_response()
        }),
    }
}

pub async fn roles_page(State(state): State<AppState>) -> Response {
    render_roles(&state, PageContext::new(&state)).await
}

pub async fn create_role(State(state): State<AppState>, Form(form): Form<RoleForm>) -> Response {
    let input = RoleInput {
        name: form.name.trim().to_string(),
        description: optional(form.description),
        permissions: split_list(&form.permissions),
    };
    let result = state.roles.create(&input).await;
    if let Some(redirect) = lost(&state, &result, "/roles") {
        return redirect;
    }
    let page = action_page(&state, &result, "Role created");
    render_roles(&state, page).await
}

pub async fn delete_role(State(state): State<AppState>, Path(role_id): Path<String>) -> Response {
    let result = state.roles.delete(&role_id).await;
    if let Some(redirect) = lost(&state, &result, "/roles") {
        return redirect;
    }
    let page = action_page(&state, &result, "Role deleted");
    render_roles(&state, page).await
}

async fn render_role(state: &AppState, role_id: &str, page: PageContext) -> Response {
    match state.roles.get(role_id).await {
        Ok(role) => RoleDetailTemplate { page, role }.into_response(),
        Err(e) => match session_lost_redirect(state, &e, &format!("/roles/{}", role_id)) {
            Some(redirect) => redirect,
            None => render_roles(state, page.with_error(e.user_message())).await,
        },
    }
}

pub async fn role_detail_page(
    State(state): State<AppState>,
    Path(role_id): Path<String>,
) -> Response {
    render_role(&state, &role_id, PageContext::new(&state)).await
}

pub async fn update_role(
    State(state): State<AppState>,
    Path(role_id): Path<String>,
    Form(form): Form<RoleForm>,
) -> Response {
    let input = RoleInput {
        name: form.name.trim().to_string(),
        description: optional(form.description),
        permissions: split_list(&form.permissions),
    };
    let result = state.roles.update(&role_id, &input).await;
    if let Some(redirect) = lost(&state, &result, &format!("/roles/{}", role_id)) {
        return redirect;
    }
    let page = action_page(&state, &result, "Role updated");
    render_role(&state, &role_id, page).await
}

// Services

async fn render_services(
    state: &AppState,
    page: PageContext,
    credentials: Option<ServiceCredentials>,
) -> Response {
    match state.services.list().await {
        Ok(services) => ServicesTemplate {
            page,
            services,
            credentials,
        }
        .into_response(),
        Err(e) => session_lost_redirect(state, &e, "/services").unwrap_or_else(|| {
            (
                e.http_status(),
                ServicesTemplate {
                    page: page.with_error(e.user_message()),
                    services: Vec::new(),
                    credentials,
                },
            )
                .into_response()
        }),
    }
}

pub async fn services_page(State(state): State<AppState>) -> Response {
    render_services(&state, PageContext::new(&state), None).await
}

pub async fn create_service(
    State(state): State<AppState>,
    Form(form): Form<ServiceForm>,
) -> Response {
    let input = ServiceInput {
        name: form.name.trim().to_string(),
        description: optional(form.description),
        url: optional(form.url),
        active: Some(true),
    };
    let result = state.services.create(&input).await;
    if let Some(redirect) = lost(&state, &result, "/services") {
        return redirect;
    }
    let page = action_page(&state, &result, "Service registered");
    render_services(&state, page, None).await
}

pub async fn regenerate_credentials(
    State(state): State<AppState>,
    Path(service_id): Path<String>,
) -> Response {
    let result = state.services.regenerate_credentials(&service_id).await;
    if let Some(redirect) = lost(&state, &result, "/services") {
        return redirect;
    }
    let page = action_page(
        &state,
        &result,
        "New credentials issued. Copy the secret now; it will not be shown again.",
    );
    render_services(&state, page, result.ok()).await
}

pub async fn delete_service(
    State(state): State<AppState>,
    Path(service_id): Path<String>,
) -> Response {
    let result = state.services.delete(&service_id).await;
    if let Some(redirect) = lost(&state, &result, "/services") {
        return redirect;
    }
    let page = action_page(&state, &result, "Service deleted");
    render_services(&state, page, None).await
}

async fn render_service(state: &AppState, service_id: &str, page: PageContext) -> Response {
    let recent = AuditLogQuery::limit(RECENT_ACTIVITY);
    let (service, users, activity) = tokio::join!(
        state.services.get(service_id),
        state.assignments.users_for_service(service_id),
        state.audit_logs.by_service(service_id, &recent),
    );

    match service {
        Ok(service) => ServiceDetailTemplate {
            page,
            service,
            users: panel(users, "service_users"),
            activity: panel(activity, "service_activity"),
        }
        .into_response(),
        Err(e) => match session_lost_redirect(state, &e, &format!("/services/{}", service_id)) {
            Some(redirect) => redirect,
            None => render_services(state, page.with_error(e.user_message()), None).await,
        },
    }
}

pub async fn service_detail_page(
    State(state): State<AppState>,
    Path(service_id): Path<String>,
) -> Response {
    render_service(&state, &service_id, PageContext::new(&state)).await
}

pub async fn update_service(
    State(state): State<AppState>,
    Path(service_id): Path<String>,
    Form(form): Form<ServiceForm>,
) -> Response {
    let input = ServiceInput {
        name: form.name.trim().to_string(),
        description: optional(form.description),
        url: optional(form.url),
        active: Some(form.active.is_some()),
    };
    let result = state.services.update(&service_id, &input).await;
    if let Some(redirect) = lost(&state, &result, &format!("/services/{}", service_id)) {
        return redirect;
    }
    let page = action_page(&state, &result, "Service updated");
    render_service(&state, &service_id, page).await
}

// Audit logs

pub async fn audit_logs_page(
    State(state): State<AppState>,
    Query(query): Query<AuditLogQuery>,
) -> Response {
    let action = query
        .action
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .to_string();
    let current_page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(AUDIT_PAGE_SIZE)
        .clamp(1, AUDIT_PAGE_MAX);
    let query = AuditLogQuery {
        limit: Some(limit),
        page: Some(current_page),
        action: (!action.is_empty()).then(|| action.clone()),
    };

    let page = PageContext::new(&state);
    match state.audit_logs.list(&query).await {
        Ok(logs) => {
            let (prev_page, next_page) = neighbours(current_page, logs.len() >= limit as usize);
            AuditLogsTemplate {
                page,
                logs,
                action,
                limit,
                current_page,
                prev_page,
                next_page,
            }
            .into_response()
        }
        Err(e) => session_lost_redirect(&state, &e, "/audit-logs").unwrap_or_else(|| {
            (
                e.http_status(),
                AuditLogsTemplate {
                    page: page.with_error(e.user_message()),
                    logs: Vec::new(),
                    action,
                    limit,
                    current_page,
                    prev_page: neighbours(current_page, false).0,
                    next_page: None,
                },
            )
                .into_response()
        }),
    }
}

pub async fn audit_log_detail_page(
    State(state): State<AppState>,
    Path(log_id): Path<String>,
) -> Response {
    let page = PageContext::new(&state);
    match state.audit_logs.get(&log_id).await {
        Ok(log) => AuditLogDetailTemplate { page, log }.into_response(),
        Err(e) => {
            let from = format!("/audit-logs/{}", log_id);
            session_lost_redirect(&state, &e, &from).unwrap_or_else(|| {
                (
                    e.http_status(),
                    AuditLogsTemplate {
                        page: page.with_error(e.user_message()),
                        logs: Vec::new(),
                        action: String::new(),
                        limit: AUDIT_PAGE_SIZE,
                        current_page: 1,
                        prev_page: None,
                        next_page: None,
                    },
                )
                    .into_response()
            })
        }
    }
}
