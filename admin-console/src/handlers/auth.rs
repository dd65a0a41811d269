use super::pages::{see_other, PageContext};
use crate::AppState;
use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Form,
};
use console_core::auth::{default_landing, sanitize_return_to};
use console_core::models::{Credentials, ForgotPasswordRequest, RegisterRequest};
use serde::Deserialize;

const REGISTERED_NOTICE: &str =
    "Registration successful! Please check your email to verify your account.";

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
    pub username: String,
    pub from: String,
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub page: PageContext,
    pub username: String,
    pub email: String,
    pub display_name: String,
}

#[derive(Template)]
#[template(path = "forgot_password.html")]
pub struct ForgotPasswordTemplate {
    pub page: PageContext,
    pub email: String,
    pub sent: bool,
}

#[derive(Deserialize, Default)]
pub struct LoginQuery {
    pub from: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub from: Option<String>,
}

fn login_template(page: PageContext, username: String, from: Option<&str>) -> LoginTemplate {
    LoginTemplate {
        page,
        username,
        from: sanitize_return_to(from).unwrap_or_default(),
    }
}

pub async fn login_page(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
) -> Response {
    let snapshot = state.auth.snapshot();
    if let Some(user) = &snapshot.user {
        if state.auth.service().is_authenticated() {
            let target = sanitize_return_to(query.from.as_deref())
                .unwrap_or_else(|| default_landing(user).to_string());
            return see_other(&target);
        }
    }

    // An expired session leaves its message on the auth state.
    let mut page = PageContext::new(&state);
    page.error = snapshot.error;
    login_template(page, String::new(), query.from.as_deref()).into_response()
}

pub async fn login_handler(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Response {
    let credentials = Credentials::new(form.username.clone(), form.password);

    match state.auth.login(&credentials).await {
        Ok(user) => {
            let target = sanitize_return_to(form.from.as_deref())
                .unwrap_or_else(|| default_landing(&user).to_string());
            tracing::info!(user_id = %user.id, target = %target, "Operator signed in");
            see_other(&target)
        }
        Err(e) => {
            let page = PageContext::new(&state).with_error(e.user_message());
            (
                e.http_status(),
                login_template(page, form.username, form.from.as_deref()),
            )
                .into_response()
        }
    }
}

pub async fn register_page(State(state): State<AppState>) -> impl IntoResponse {
    RegisterTemplate {
        page: PageContext::new(&state),
        username: String::new(),
        email: String::new(),
        display_name: String::new(),
    }
}

pub async fn register_handler(
    State(state): State<AppState>,
    Form(request): Form<RegisterRequest>,
) -> Response {
    match state.auth.register(&request).await {
        Ok(_) => {
            let page = PageContext::new(&state).with_notice(REGISTERED_NOTICE);
            login_template(page, request.username, None).into_response()
        }
        Err(e) => {
            let page = PageContext::new(&state).with_error(e.user_message());
            (
                e.http_status(),
                RegisterTemplate {
                    page,
                    username: request.username,
                    email: request.email,
                    display_name: request.display_name,
                },
            )
                .into_response()
        }
    }
}

pub async fn forgot_password_page(State(state): State<AppState>) -> impl IntoResponse {
    ForgotPasswordTemplate {
        page: PageContext::new(&state),
        email: String::new(),
        sent: false,
    }
}

pub async fn forgot_password_handler(
    State(state): State<AppState>,
    Form(request): Form<ForgotPasswordRequest>,
) -> Response {
    match state.auth.service().request_password_reset(&request).await {
        Ok(message) => ForgotPasswordTemplate {
            page: PageContext::new(&state).with_notice(message),
            email: request.email,
            sent: true,
        }
        .into_response(),
        Err(e) => (
            e.http_status(),
            ForgotPasswordTemplate {
                page: PageContext::new(&state).with_error(e.user_message()),
                email: request.email,
                sent: false,
            },
        )
            .into_response(),
    }
}

pub async fn verify_email(State(state): State<AppState>, Path(token): Path<String>) -> Response {
    let page = PageContext::new(&state);
    match state.auth.service().verify_email(&token).await {
        Ok(message) => {
            login_template(page.with_notice(message), String::new(), None).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Email verification failed");
            (
                StatusCode::BAD_REQUEST,
                login_template(page.with_error(e.user_message()), String::new(), None),
            )
                .into_response()
        }
    }
}

pub async fn logout_handler(State(state): State<AppState>) -> Response {
    if let Err(e) = state.auth.logout().await {
        tracing::error!(error = %e, "Failed to clear local session");
    }
    see_other(state.guard.login_path())
}
