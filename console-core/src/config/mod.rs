use serde::Deserialize;
use std::path::PathBuf;

/// Remote user-management API.
#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    /// Base URL every endpoint path is appended to, e.g. `http://localhost:5000/api`.
    pub base_url: String,
}

impl ApiSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    #[default]
    File,
    Memory,
}

/// Where the operator's session is persisted between runs.
#[derive(Debug, Deserialize, Clone)]
pub struct SessionSettings {
    #[serde(default)]
    pub backend: SessionBackend,
    #[serde(default = "default_session_path")]
    pub path: PathBuf,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            backend: SessionBackend::default(),
            path: default_session_path(),
        }
    }
}

fn default_session_path() -> PathBuf {
    PathBuf::from(".admin-console").join("session.json")
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelemetrySettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// OTLP gRPC collector; spans are only exported when this is set.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            otlp_endpoint: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
