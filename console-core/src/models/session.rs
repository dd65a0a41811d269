use super::user::UserRecord;
use serde::{Deserialize, Serialize};

/// Access/refresh token pair issued by login and refresh.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub token: String,
    pub refresh_token: String,
}

/// The authenticated triple held by the console.
///
/// Access token and user are set and cleared together; the refresh token
/// follows the access token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user: Option<UserRecord>,
}

impl Session {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(tokens: TokenPair, user: UserRecord) -> Self {
        Self {
            access_token: Some(tokens.token),
            refresh_token: Some(tokens.refresh_token),
            user: Some(user),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some() && self.refresh_token.is_some() && self.user.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none() && self.user.is_none()
    }
}
