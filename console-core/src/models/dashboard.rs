use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    #[serde(default)]
    pub total_users: u64,
    #[serde(default)]
    pub active_services: u64,
    #[serde(default)]
    pub total_roles: u64,
    #[serde(default)]
    pub recent_activities: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ActivityDataset {
    pub label: String,
    pub data: Vec<u64>,
}

/// Monthly activity counts, one dataset per activity kind.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct ActivitySeries {
    pub labels: Vec<String>,
    pub datasets: Vec<ActivityDataset>,
}

impl ActivitySeries {
    /// Rows of (label, value per dataset), for tabular rendering.
    pub fn rows(&self) -> Vec<(String, Vec<u64>)> {
        self.labels
            .iter()
            .enumerate()
            .map(|(i, label)| {
                let values = self
                    .datasets
                    .iter()
                    .map(|dataset| dataset.data.get(i).copied().unwrap_or(0))
                    .collect();
                (label.clone(), values)
            })
            .collect()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    Success,
    Warning,
    Failed,
}

impl ActivityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityStatus::Success => "success",
            ActivityStatus::Warning => "warning",
            ActivityStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RecentActivity {
    pub id: String,
    pub user: String,
    pub action: String,
    pub details: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub status: ActivityStatus,
}
