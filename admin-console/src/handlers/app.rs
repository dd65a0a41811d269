use super::pages::PageContext;
use crate::AppState;
use askama::Template;
use axum::{extract::State, response::IntoResponse};

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub page: PageContext,
}

pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    IndexTemplate {
        page: PageContext::new(&state),
    }
}

pub async fn health_check() -> &'static str {
    "OK"
}
