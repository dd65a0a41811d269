use super::pages::{session_lost_redirect, to_login, PageContext};
use crate::AppState;
use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Form,
};
use console_core::models::{ChangePasswordRequest, ProfileUpdate, UserRecord};
use console_core::ConsoleError;
use serde::Deserialize;

const PROFILE_PATH: &str = "/profile";

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub page: PageContext,
    pub profile: UserRecord,
}

#[derive(Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub profile_image: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub location: String,
}

impl ProfileForm {
    /// Blank identity fields are left unchanged; bio and location are always sent.
    pub fn into_update(self) -> ProfileUpdate {
        fn present(value: String) -> Option<String> {
            let value = value.trim().to_string();
            (!value.is_empty()).then_some(value)
        }

        ProfileUpdate {
            display_name: present(self.display_name),
            email: present(self.email),
            profile_image: present(self.profile_image),
            ..Default::default()
        }
        .with_metadata("bio", self.bio.trim())
        .with_metadata("location", self.location.trim())
    }
}

fn render(state: &AppState, page: PageContext, status: StatusCode) -> Response {
    match state.auth.snapshot().user {
        Some(profile) => (status, ProfileTemplate { page, profile }).into_response(),
        None => to_login(state, PROFILE_PATH),
    }
}

fn render_result<T>(state: &AppState, result: Result<T, ConsoleError>, notice: &str) -> Response {
    match result {
        Ok(_) => render(
            state,
            PageContext::new(state).with_notice(notice),
            StatusCode::OK,
        ),
        Err(e) => session_lost_redirect(state, &e, PROFILE_PATH).unwrap_or_else(|| {
            render(
                state,
                PageContext::new(state).with_error(e.user_message()),
                e.http_status(),
            )
        }),
    }
}

pub async fn profile_page(State(state): State<AppState>) -> Response {
    render(&state, PageContext::new(&state), StatusCode::OK)
}

pub async fn update_profile_handler(
    State(state): State<AppState>,
    Form(form): Form<ProfileForm>,
) -> Response {
    let result = state.auth.update_profile(&form.into_update()).await;
    render_result(&state, result, "Profile updated successfully")
}

pub async fn change_password_handler(
    State(state): State<AppState>,
    Form(request): Form<ChangePasswordRequest>,
) -> Response {
    let result = state.auth.change_password(&request).await;
    render_result(&state, result, "Password changed successfully")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_fields_are_not_sent() {
        let update = ProfileForm {
            display_name: "  ".into(),
            email: String::new(),
            profile_image: String::new(),
            bio: "Hello".into(),
            location: String::new(),
        }
        .into_update();

        assert!(update.display_name.is_none());
        assert!(update.email.is_none());
        assert_eq!(update.metadata.get("bio").map(String::as_str), Some("Hello"));
        assert_eq!(update.metadata.get("location").map(String::as_str), Some(""));
    }
}
