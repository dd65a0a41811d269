use super::storage::{FileStorage, KeyValueStorage, MemoryStorage};
use crate::config::{SessionBackend, SessionSettings};
use crate::error::ConsoleError;
use crate::models::{Session, TokenPair, UserRecord};
use std::path::PathBuf;
use std::sync::Arc;

pub const ACCESS_TOKEN_KEY: &str = "token";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
pub const USER_KEY: &str = "user";

const SESSION_KEYS: [&str; 3] = [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY];

/// Durable home of the session triple. No network access, no policy.
///
/// Reads fail soft: anything unreadable is reported as absent.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn KeyValueStorage>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FileStorage::new(path)))
    }

    pub fn from_settings(settings: &SessionSettings) -> Self {
        match settings.backend {
            SessionBackend::File => Self::file(settings.path.clone()),
            SessionBackend::Memory => Self::in_memory(),
        }
    }

    /// Persist the whole triple in one write. An empty session clears the store.
    pub fn save(&self, session: &Session) -> Result<(), ConsoleError> {
        match session {
            Session {
                access_token: Some(token),
                refresh_token: Some(refresh_token),
                user: Some(user),
            } => {
                let user_json = encode_user(user)?;
                self.storage.set_all(&[
                    (ACCESS_TOKEN_KEY, token.as_str()),
                    (REFRESH_TOKEN_KEY, refresh_token.as_str()),
                    (USER_KEY, user_json.as_str()),
                ])
            }
            session if session.is_empty() => self.clear(),
            _ => Err(ConsoleError::Storage(
                "refusing to persist a partial session".to_string(),
            )),
        }
    }

    /// The previously saved session, or an empty one.
    ///
    /// Corrupt or partial state is cleared so that a token never outlives its user.
    pub fn load(&self) -> Session {
        let access_token = self.read(ACCESS_TOKEN_KEY);
        let refresh_token = self.read(REFRESH_TOKEN_KEY);
        let user_json = self.read(USER_KEY);

        let parsed = user_json
            .as_deref()
            .map(|raw| serde_json::from_str::<UserRecord>(raw));
        let user = match parsed {
            Some(Ok(user)) => Some(user),
            Some(Err(e)) => {
                tracing::warn!(error = %e, "Stored user record is corrupt, discarding session");
                self.discard();
                return Session::empty();
            }
            None => None,
        };

        let session = Session {
            access_token,
            refresh_token,
            user,
        };

        if session.is_authenticated() || session.is_empty() {
            return session;
        }

        tracing::warn!("Stored session is incomplete, discarding it");
        self.discard();
        Session::empty()
    }

    pub fn clear(&self) -> Result<(), ConsoleError> {
        self.storage.remove_all(&SESSION_KEYS)
    }

    pub fn access_token(&self) -> Option<String> {
        self.read(ACCESS_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read(REFRESH_TOKEN_KEY)
    }

    pub fn user(&self) -> Option<UserRecord> {
        let raw = self.read(USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!(error = %e, "Stored user record is corrupt");
                None
            }
        }
    }

    /// Replace the token pair after a refresh; the cached user is untouched.
    pub fn save_tokens(&self, tokens: &TokenPair) -> Result<(), ConsoleError> {
        self.storage.set_all(&[
            (ACCESS_TOKEN_KEY, tokens.token.as_str()),
            (REFRESH_TOKEN_KEY, tokens.refresh_token.as_str()),
        ])
    }

    pub fn save_user(&self, user: &UserRecord) -> Result<(), ConsoleError> {
        let user_json = encode_user(user)?;
        self.storage.set_all(&[(USER_KEY, user_json.as_str())])
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.storage.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key = key, error = %e, "Failed to read session storage");
                None
            }
        }
    }

    fn discard(&self) {
        if let Err(e) = self.clear() {
            tracing::error!(error = %e, "Failed to clear session storage");
        }
    }
}

fn encode_user(user: &UserRecord) -> Result<String, ConsoleError> {
    serde_json::to_string(user)
        .map_err(|e| ConsoleError::Storage(format!("failed to encode user: {}", e)))
}
