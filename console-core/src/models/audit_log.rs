use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who performed an audited action: either a populated user or a bare id.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum AuditActor {
    User {
        #[serde(alias = "_id")]
        id: String,
        #[serde(default)]
        username: Option<String>,
    },
    Id(String),
}

impl AuditActor {
    pub fn label(&self) -> &str {
        match self {
            AuditActor::User {
                username: Some(username),
                ..
            } => username,
            AuditActor::User { id, .. } => id,
            AuditActor::Id(id) => id,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default, alias = "userId", skip_serializing_if = "Option::is_none")]
    pub user: Option<AuditActor>,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl AuditLog {
    /// Display name of the actor; entries without one were written by the system.
    pub fn actor_label(&self) -> String {
        self.user
            .as_ref()
            .map(|actor| actor.label().to_string())
            .unwrap_or_else(|| "System".to_string())
    }
}

/// Query string for the audit-log listings.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct AuditLogQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

impl AuditLogQuery {
    pub fn limit(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            ..Default::default()
        }
    }
}
