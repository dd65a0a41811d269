use crate::error::ConsoleError;
use crate::http::ApiClient;
use crate::models::{
    ActivityDataset, ActivitySeries, ActivityStatus, AuditLog, AuditLogQuery, DashboardStats,
    RecentActivity, ServiceRecord,
};
use chrono::{Datelike, NaiveDate};
use serde_json::Value;
use std::sync::Arc;

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Number of calendar months shown in the activity chart, current month last.
pub const ACTIVITY_MONTHS: usize = 7;

const STATS_LOG_LIMIT: u32 = 50;
const ACTIVITY_LOG_LIMIT: u32 = 100;

/// Dashboard figures, using the aggregate endpoints when the API has them and
/// computing them from the list endpoints when it does not.
#[derive(Clone)]
pub struct DashboardClient {
    api: Arc<ApiClient>,
}

impl DashboardClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub async fn stats(&self) -> Result<DashboardStats, ConsoleError> {
        match self.api.get("/dashboard/stats").await {
            Ok(stats) => Ok(stats),
            Err(e) if e.is_endpoint_missing() => {
                tracing::debug!("Dashboard stats endpoint not available, using composite data");
                self.composite_stats().await
            }
            Err(e) => Err(e),
        }
    }

    async fn composite_stats(&self) -> Result<DashboardStats, ConsoleError> {
        let log_query = AuditLogQuery::limit(STATS_LOG_LIMIT);
        let (users, services, roles, logs) = tokio::try_join!(
            self.api.get::<Value>("/users"),
            self.api.get::<Vec<ServiceRecord>>("/services"),
            self.api.get::<Value>("/roles"),
            self.api.get_with_query::<Value, _>("/audit-logs", &log_query),
        )?;

        Ok(DashboardStats {
            total_users: count(&users),
            active_services: services.iter().filter(|service| service.active).count() as u64,
            total_roles: count(&roles),
            recent_activities: count(&logs),
        })
    }

    /// Monthly logins, registrations and service access for the months ending at `today`.
    pub async fn activity_series(&self, today: NaiveDate) -> Result<ActivitySeries, ConsoleError> {
        match self.api.get("/dashboard/activity-data").await {
            Ok(series) => Ok(series),
            Err(e) if e.is_endpoint_missing() => {
                tracing::debug!("Activity data endpoint not available, using audit logs");
                let logs: Vec<AuditLog> = self
                    .api
                    .get_with_query("/audit-logs", &AuditLogQuery::limit(ACTIVITY_LOG_LIMIT))
                    .await?;
                Ok(bucket_activity(&logs, today))
            }
            Err(e) => Err(e),
        }
    }

    pub async fn recent_activities(&self, limit: u32) -> Result<Vec<RecentActivity>, ConsoleError> {
        let logs: Vec<AuditLog> = self
            .api
            .get_with_query("/audit-logs", &AuditLogQuery::limit(limit))
            .await?;

        Ok(logs.into_iter().map(to_activity).collect())
    }
}

/// Length of a list body, or its `count` field for a counted envelope.
fn count(body: &Value) -> u64 {
    match body {
        Value::Array(items) => items.len() as u64,
        other => other.get("count").and_then(Value::as_u64).unwrap_or(0),
    }
}

/// (year, zero-based month) `back` months before `today`.
fn month_before(today: NaiveDate, back: usize) -> (i32, u32) {
    let index = today.year() * 12 + today.month0() as i32 - back as i32;
    (index.div_euclid(12), index.rem_euclid(12) as u32)
}

/// Count audit log entries per calendar month and kind.
pub fn bucket_activity(logs: &[AuditLog], today: NaiveDate) -> ActivitySeries {
    let months: Vec<(i32, u32)> = (0..ACTIVITY_MONTHS)
        .rev()
        .map(|back| month_before(today, back))
        .collect();

    let mut logins = vec![0u64; ACTIVITY_MONTHS];
    let mut registrations = vec![0u64; ACTIVITY_MONTHS];
    let mut service_access = vec![0u64; ACTIVITY_MONTHS];

    for log in logs {
        let key = (log.timestamp.year(), log.timestamp.month0());
        let Some(slot) = months.iter().position(|month| *month == key) else {
            continue;
        };

        if log.action == "user.login" {
            logins[slot] += 1;
        } else if log.action == "user.register" {
            registrations[slot] += 1;
        } else if log.action.contains("service") {
            service_access[slot] += 1;
        }
    }

    ActivitySeries {
        labels: months
            .iter()
            .map(|(_, month0)| MONTHS[*month0 as usize].to_string())
            .collect(),
        datasets: vec![
            ActivityDataset {
                label: "User Logins".to_string(),
                data: logins,
            },
            ActivityDataset {
                label: "New Registrations".to_string(),
                data: registrations,
            },
            ActivityDataset {
                label: "Service Access".to_string(),
                data: service_access,
            },
        ],
    }
}

/// Classify an audit entry from the wording of its details.
pub fn determine_status(details: Option<&str>) -> ActivityStatus {
    let Some(details) = details else {
        return ActivityStatus::Success;
    };
    let details = details.to_lowercase();

    if ["fail", "error", "invalid"]
        .iter()
        .any(|word| details.contains(word))
    {
        ActivityStatus::Failed
    } else if details.contains("warning") {
        ActivityStatus::Warning
    } else {
        ActivityStatus::Success
    }
}

fn to_activity(log: AuditLog) -> RecentActivity {
    RecentActivity {
        user: log.actor_label(),
        status: determine_status(log.details.as_deref()),
        id: log.id,
        action: log.action,
        details: log.details,
        timestamp: log.timestamp,
    }
}
