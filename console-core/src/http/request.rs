use crate::error::ConsoleError;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

/// A replayable description of one call to the API.
///
/// Holds no retry state: the client decides about replays per send.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) body: Option<Value>,
    pub(crate) authenticated: bool,
    pub(crate) refreshable: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            authenticated: true,
            refreshable: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn with_json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ConsoleError> {
        let body = serde_json::to_value(body)
            .map_err(|e| ConsoleError::Encode(format!("request body: {}", e)))?;
        self.body = Some(body);
        Ok(self)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Flatten a serializable struct into query pairs; `None` fields are skipped.
    pub fn with_query<Q: Serialize + ?Sized>(mut self, query: &Q) -> Result<Self, ConsoleError> {
        let value = serde_json::to_value(query)
            .map_err(|e| ConsoleError::Encode(format!("query: {}", e)))?;

        if let Value::Object(map) = value {
            for (key, value) in map {
                match value {
                    Value::Null => {}
                    Value::String(s) => self.query.push((key, s)),
                    other => self.query.push((key, other.to_string())),
                }
            }
        }
        Ok(self)
    }

    /// Sent without a bearer token and exempt from the refresh protocol.
    pub fn public(mut self) -> Self {
        self.authenticated = false;
        self.refreshable = false;
        self
    }

    /// Sent with the bearer token, but a 401 is returned as-is.
    pub fn without_refresh(mut self) -> Self {
        self.refreshable = false;
        self
    }
}
