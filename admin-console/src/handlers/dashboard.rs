use super::pages::{session_lost_redirect, to_login, PageContext};
use crate::AppState;
use askama::Template;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use console_core::models::{ActivitySeries, DashboardStats, RecentActivity, UserRecord};
use console_core::ConsoleError;

const RECENT_ACTIVITY_LIMIT: u32 = 5;

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub page: PageContext,
    pub stats: Option<DashboardStats>,
    pub dataset_labels: Vec<String>,
    pub activity_rows: Vec<(String, Vec<u64>)>,
    pub activities: Vec<RecentActivity>,
}

#[derive(Template)]
#[template(path = "user_home.html")]
pub struct UserHomeTemplate {
    pub page: PageContext,
    pub profile: UserRecord,
}

pub async fn dashboard_handler(State(state): State<AppState>) -> Response {
    let today = Utc::now().date_naive();
    let (stats, series, activities) = tokio::join!(
        state.dashboard.stats(),
        state.dashboard.activity_series(today),
        state.dashboard.recent_activities(RECENT_ACTIVITY_LIMIT),
    );

    let mut failures: Vec<ConsoleError> = Vec::new();
    let stats = keep(stats, &mut failures);
    let series = keep(series, &mut failures).unwrap_or_default();
    let activities = keep(activities, &mut failures).unwrap_or_default();

    if let Some(redirect) = failures
        .iter()
        .find_map(|e| session_lost_redirect(&state, e, "/dashboard"))
    {
        return redirect;
    }

    let mut page = PageContext::new(&state);
    if let Some(e) = failures.first() {
        tracing::warn!(error = %e, "Dashboard data incomplete");
        page = page.with_error(e.user_message());
    }

    DashboardTemplate {
        page,
        stats,
        dataset_labels: dataset_labels(&series),
        activity_rows: series.rows(),
        activities,
    }
    .into_response()
}

fn keep<T>(result: Result<T, ConsoleError>, failures: &mut Vec<ConsoleError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            failures.push(e);
            None
        }
    }
}

fn dataset_labels(series: &ActivitySeries) -> Vec<String> {
    series
        .datasets
        .iter()
        .map(|dataset| dataset.label.clone())
        .collect()
}

pub async fn user_home_handler(State(state): State<AppState>) -> Response {
    let page = PageContext::new(&state);
    match page.user.clone() {
        Some(profile) => UserHomeTemplate { page, profile }.into_response(),
        None => to_login(&state, "/user-home"),
    }
}
