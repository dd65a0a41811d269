//! Layout data shared by every page and the pages with no logic of their own.

use crate::AppState;
use askama::Template;
use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use console_core::models::UserRecord;
use console_core::ConsoleError;

/// What the base layout needs: the signed-in user and the page's alerts.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub user: Option<UserRecord>,
    pub error: Option<String>,
    pub notice: Option<String>,
}

impl PageContext {
    pub fn new(state: &AppState) -> Self {
        Self {
            user: state.auth.snapshot().user,
            ..Default::default()
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_notice(mut self, notice: impl Into<String>) -> Self {
        self.notice = Some(notice.into());
        self
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(UserRecord::is_admin)
    }
}

/// A 303 to `location`, or to the site root when it cannot be sent as a header.
pub fn see_other(location: &str) -> Response {
    let value = HeaderValue::from_str(location).unwrap_or_else(|_| {
        tracing::warn!(location, "Refusing redirect to an invalid location");
        HeaderValue::from_static("/")
    });
    (StatusCode::SEE_OTHER, [(header::LOCATION, value)]).into_response()
}

/// Send the browser to sign in again, coming back to `from` afterwards.
pub fn to_login(state: &AppState, from: &str) -> Response {
    let decision = console_core::GuardDecision::RedirectToLogin {
        from: from.to_string(),
    };
    match state.guard.redirect_location(&decision) {
        Some(location) => see_other(&location),
        None => see_other(state.guard.login_path()),
    }
}

/// A lost session ends the page with a login redirect; other errors become the alert text.
pub fn session_lost_redirect(
    state: &AppState,
    error: &ConsoleError,
    from: &str,
) -> Option<Response> {
    if error.is_session_lost() {
        tracing::info!(path = from, "Session lost during request, redirecting to login");
        Some(to_login(state, from))
    } else {
        None
    }
}

#[derive(Template)]
#[template(path = "loading.html")]
pub struct LoadingTemplate {
    pub requested: String,
}

#[derive(Template)]
#[template(path = "forbidden.html")]
pub struct ForbiddenTemplate {
    pub page: PageContext,
}

#[derive(Template)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {
    pub page: PageContext,
    pub path: String,
}

pub async fn forbidden(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::FORBIDDEN,
        ForbiddenTemplate {
            page: PageContext::new(&state),
        },
    )
}

pub async fn not_found(State(state): State<AppState>, uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        NotFoundTemplate {
            page: PageContext::new(&state),
            path: uri.path().to_string(),
        },
    )
}
