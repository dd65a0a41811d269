use super::request::ApiRequest;
use crate::config::ApiSettings;
use crate::error::ConsoleError;
use crate::models::TokenPair;
use crate::observability::TracedClientExt;
use crate::session::SessionStore;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::broadcast;

pub const REFRESH_TOKEN_PATH: &str = "/users/refresh-token";

/// Session changes made by the client itself, outside of any caller's control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A 401 was answered by a successful token refresh.
    Refreshed,
    /// Refresh failed; the store has been cleared and the operator must sign in again.
    Expired,
}

/// HTTP client for the user-management API.
///
/// Attaches the stored access token to every authenticated request and runs the
/// refresh protocol once per logical request when the API answers 401.
pub struct ApiClient {
    client: Client,
    base_url: String,
    store: SessionStore,
    events: broadcast::Sender<SessionEvent>,
}

impl ApiClient {
    pub fn new(settings: &ApiSettings, store: SessionStore) -> Result<Self, ConsoleError> {
        let client = Client::builder()
            .user_agent(concat!("admin-console/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, settings, store))
    }

    pub fn with_client(client: Client, settings: &ApiSettings, store: SessionStore) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            store,
            events,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ConsoleError> {
        self.fetch(ApiRequest::get(path)).await
    }

    pub async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T, ConsoleError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.fetch(ApiRequest::get(path).with_query(query)?).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ConsoleError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.fetch(ApiRequest::post(path).with_json(body)?).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ConsoleError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.fetch(ApiRequest::put(path).with_json(body)?).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ConsoleError> {
        self.fetch(ApiRequest::delete(path)).await
    }

    /// Send `request` and decode the success body as `T`.
    pub async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ConsoleError> {
        let path = request.path.clone();
        let response = self.send(request).await?;
        decode(&path, response).await
    }

    /// Send `request`, refreshing the session and replaying once on 401.
    ///
    /// A replay that is rejected again is returned as `Unauthorized`; a failed
    /// refresh clears the store, publishes [`SessionEvent::Expired`] and is
    /// returned to the caller.
    pub async fn send(&self, request: ApiRequest) -> Result<Response, ConsoleError> {
        let mut retried = false;

        loop {
            let response = self.dispatch(&request).await?;

            if response.status() != StatusCode::UNAUTHORIZED || retried || !request.refreshable {
                return check_status(response).await;
            }
            retried = true;

            tracing::debug!(
                method = %request.method,
                path = %request.path,
                "Access token rejected, refreshing session"
            );

            if let Err(e) = self.refresh_tokens().await {
                tracing::warn!(error = %e, "Token refresh failed, ending session");
                self.expire_session();
                return Err(e);
            }
        }
    }

    /// Exchange the stored refresh token for a new pair and persist it.
    pub async fn refresh_tokens(&self) -> Result<TokenPair, ConsoleError> {
        let refresh_token = self.store.refresh_token().ok_or_else(|| {
            ConsoleError::Unauthorized("no refresh token in the session".to_string())
        })?;

        let request = ApiRequest::post(REFRESH_TOKEN_PATH)
            .with_body(json!({ "refreshToken": refresh_token }))
            .public();
        let response = check_status(self.dispatch(&request).await?).await?;
        let body: Value = decode(REFRESH_TOKEN_PATH, response).await?;
        let tokens = parse_token_pair(&body)?;

        self.store.save_tokens(&tokens)?;
        let _ = self.events.send(SessionEvent::Refreshed);
        tracing::info!("Session tokens refreshed");

        Ok(tokens)
    }

    fn expire_session(&self) {
        if let Err(e) = self.store.clear() {
            tracing::error!(error = %e, "Failed to clear session after refresh failure");
        }
        let _ = self.events.send(SessionEvent::Expired);
    }

    async fn dispatch(&self, request: &ApiRequest) -> Result<Response, ConsoleError> {
        let url = format!("{}{}", self.base_url, request.path);

        let mut builder = self.client.traced_request(request.method.clone(), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if request.authenticated {
            if let Some(token) = self.store.access_token() {
                builder = builder.bearer_auth(&token);
            }
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        builder.send().await.map_err(|e| {
            tracing::error!(method = %request.method, url = %url, error = %e, "API request failed");
            ConsoleError::Network(e)
        })
    }
}

/// Pull `{ token, refreshToken }` out of a response body.
pub(crate) fn parse_token_pair(body: &Value) -> Result<TokenPair, ConsoleError> {
    Ok(TokenPair {
        token: required_str(body, "token")?,
        refresh_token: required_str(body, "refreshToken")?,
    })
}

pub(crate) fn required_str(body: &Value, field: &str) -> Result<String, ConsoleError> {
    match body.get(field) {
        Some(Value::String(value)) if !value.is_empty() => Ok(value.clone()),
        Some(_) => Err(ConsoleError::MalformedServerResponse(format!(
            "`{}` is not a non-empty string",
            field
        ))),
        None => Err(ConsoleError::MalformedServerResponse(format!(
            "missing `{}`",
            field
        ))),
    }
}

async fn check_status(response: Response) -> Result<Response, ConsoleError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.bytes().await.unwrap_or_default();
    let message = error_message(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    });

    Err(ConsoleError::from_status(status.as_u16(), message))
}

/// The `message` (or `error`) string of a JSON error body.
fn error_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

/// Decode a success body; an empty body decodes as JSON `null`.
async fn decode<T: DeserializeOwned>(path: &str, response: Response) -> Result<T, ConsoleError> {
    let body = response.bytes().await?;
    let body: &[u8] = if body.is_empty() { b"null" } else { &body };

    serde_json::from_slice(body).map_err(|e| {
        tracing::warn!(path = path, error = %e, "Unexpected response body");
        ConsoleError::MalformedServerResponse(format!("{}: {}", path, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token_pair_requires_both_fields() {
        let pair = parse_token_pair(&json!({"token": "T", "refreshToken": "R"})).unwrap();
        assert_eq!(pair.token, "T");
        assert_eq!(pair.refresh_token, "R");

        assert!(matches!(
            parse_token_pair(&json!({"token": "T"})),
            Err(ConsoleError::MalformedServerResponse(_))
        ));
        assert!(matches!(
            parse_token_pair(&json!({"token": 5, "refreshToken": "R"})),
            Err(ConsoleError::MalformedServerResponse(_))
        ));
    }

    #[test]
    fn test_error_message_prefers_message_field() {
        assert_eq!(
            error_message(br#"{"message":"Invalid token","error":"x"}"#).as_deref(),
            Some("Invalid token")
        );
        assert_eq!(
            error_message(br#"{"error":"Nope"}"#).as_deref(),
            Some("Nope")
        );
        assert_eq!(error_message(b"<html>"), None);
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = ApiClient::new(
            &ApiSettings::new("http://localhost:5000/api/"),
            SessionStore::in_memory(),
        )
        .unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000/api");
    }
}
