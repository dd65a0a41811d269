use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Malformed server response: {0}")]
    MalformedServerResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Request failed ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Session storage error: {0}")]
    Storage(String),

    #[error("Failed to encode request: {0}")]
    Encode(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl From<std::io::Error> for ConsoleError {
    fn from(err: std::io::Error) -> Self {
        ConsoleError::Storage(err.to_string())
    }
}

impl ConsoleError {
    /// Map a non-success HTTP status and the server's message onto the taxonomy.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 => ConsoleError::Unauthorized(message),
            403 => ConsoleError::Forbidden(message),
            500..=599 => ConsoleError::Server { status, message },
            _ => ConsoleError::Api { status, message },
        }
    }

    /// HTTP status carried by the remote failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ConsoleError::InvalidCredentials | ConsoleError::Unauthorized(_) => Some(401),
            ConsoleError::Forbidden(_) => Some(403),
            ConsoleError::Server { status, .. } | ConsoleError::Api { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Status the console answers with when this error ends a request.
    pub fn http_status(&self) -> StatusCode {
        match self {
            ConsoleError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ConsoleError::InvalidCredentials
            | ConsoleError::Unauthorized(_)
            | ConsoleError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            ConsoleError::Forbidden(_) => StatusCode::FORBIDDEN,
            ConsoleError::MalformedServerResponse(_)
            | ConsoleError::Network(_)
            | ConsoleError::Server { .. } => StatusCode::BAD_GATEWAY,
            ConsoleError::Api { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_REQUEST)
            }
            ConsoleError::Storage(_) | ConsoleError::Config(_) | ConsoleError::Encode(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The session is gone and the operator has to sign in again.
    pub fn is_session_lost(&self) -> bool {
        matches!(
            self,
            ConsoleError::Unauthorized(_) | ConsoleError::NotAuthenticated
        )
    }

    /// True when the remote API does not provide the requested endpoint.
    pub fn is_endpoint_missing(&self) -> bool {
        matches!(self.status(), Some(404 | 405 | 501))
    }

    /// Human-readable text for the inline alert shown next to a form or page.
    pub fn user_message(&self) -> String {
        match self {
            ConsoleError::Validation(errors) => validation_summary(errors),
            ConsoleError::InvalidCredentials => {
                "Invalid username or password. Please try again.".to_string()
            }
            ConsoleError::Unauthorized(_) | ConsoleError::NotAuthenticated => {
                "Your session has expired. Please sign in again.".to_string()
            }
            ConsoleError::Forbidden(message) if !message.is_empty() => message.clone(),
            ConsoleError::Forbidden(_) => {
                "You do not have permission to perform this action.".to_string()
            }
            ConsoleError::MalformedServerResponse(_) => {
                "The server returned an unexpected response. Please try again later.".to_string()
            }
            ConsoleError::Network(_) => {
                "Network error. Please check your internet connection.".to_string()
            }
            ConsoleError::Server { .. } => "Server error. Please try again later.".to_string(),
            ConsoleError::Api { message, .. } if !message.is_empty() => message.clone(),
            ConsoleError::Api { .. } => "The request could not be completed.".to_string(),
            ConsoleError::Storage(_) | ConsoleError::Config(_) => {
                "The console could not access its local session data.".to_string()
            }
            ConsoleError::Encode(_) => "The console could not prepare the request.".to_string(),
        }
    }
}

fn validation_summary(errors: &validator::ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| match &err.message {
                Some(message) => message.to_string(),
                None => format!("{} is invalid", field),
            })
        })
        .collect();
    messages.sort();
    messages.join(". ")
}

impl IntoResponse for ConsoleError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            details: Option<String>,
        }

        let status = self.http_status();

        let details = match &self {
            ConsoleError::MalformedServerResponse(_)
            | ConsoleError::Network(_)
            | ConsoleError::Server { .. }
            | ConsoleError::Storage(_) => Some(self.to_string()),
            _ => None,
        };

        (
            status,
            Json(ErrorResponse {
                error: self.user_message(),
                details,
            }),
        )
            .into_response()
    }
}
