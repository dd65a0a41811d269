use super::service::AuthService;
use crate::error::ConsoleError;
use crate::http::SessionEvent;
use crate::models::{
    ChangePasswordRequest, Credentials, ProfileUpdate, RegisterRequest, RegisteredUser, UserRecord,
};
use serde::Serialize;
use std::future::Future;
use std::sync::{Arc, Weak};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please sign in again.";

/// What every view needs to know about authentication.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthState {
    pub user: Option<UserRecord>,
    pub loading: bool,
    pub error: Option<String>,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            user: None,
            loading: true,
            error: None,
        }
    }
}

/// Observable authentication state for the console.
///
/// Built explicitly from an [`AuthService`] and handed to whoever renders; no
/// process-wide instance exists. Operations run inside a bracket that raises
/// `loading`, records the failure message in `error`, and always lowers
/// `loading` again.
pub struct AuthContext {
    service: AuthService,
    state: watch::Sender<AuthState>,
}

/// Lowers `loading` when an operation finishes or its future is dropped.
struct LoadingGuard<'a>(&'a watch::Sender<AuthState>);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.send_modify(|state| state.loading = false);
    }
}

impl AuthContext {
    pub fn new(service: AuthService) -> Self {
        let (state, _) = watch::channel(AuthState::default());
        Self { service, state }
    }

    pub fn service(&self) -> &AuthService {
        &self.service
    }

    /// Rehydrate from the session store.
    pub fn initialize(&self) {
        let session = self.service.store().load();
        if let Some(user) = &session.user {
            tracing::info!(user_id = %user.id, "Restored saved session");
        }

        self.state.send_modify(|state| {
            state.user = session.user;
            state.loading = false;
        });
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn clear_error(&self) {
        self.state.send_if_modified(|state| state.error.take().is_some());
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<UserRecord, ConsoleError> {
        self.bracket("login", async {
            let session = self.service.login(credentials).await?;
            let user = session.user.ok_or_else(|| {
                ConsoleError::MalformedServerResponse("login returned no user".to_string())
            })?;
            self.set_user(Some(user.clone()));
            Ok(user)
        })
        .await
    }

    pub async fn register(
        &self,
        request: &RegisterRequest,
    ) -> Result<RegisteredUser, ConsoleError> {
        self.bracket("register", self.service.register(request)).await
    }

    pub async fn logout(&self) -> Result<(), ConsoleError> {
        self.bracket("logout", async {
            self.service.logout().await?;
            self.set_user(None);
            Ok(())
        })
        .await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserRecord, ConsoleError> {
        self.bracket("update_profile", async {
            let user = self.service.update_profile(update).await?;
            self.set_user(Some(user.clone()));
            Ok(user)
        })
        .await
    }

    pub async fn change_password(
        &self,
        request: &ChangePasswordRequest,
    ) -> Result<(), ConsoleError> {
        self.bracket("change_password", self.service.change_password(request))
            .await
    }

    /// Drop the user when the HTTP client gives up on the session.
    ///
    /// The listener holds only a weak reference and ends with the context.
    pub fn watch_session_events(self: &Arc<Self>) -> JoinHandle<()> {
        let events = self.service.api().subscribe();
        let context = Arc::downgrade(self);
        tokio::spawn(listen(context, events))
    }

    async fn bracket<T, F>(&self, operation: &'static str, work: F) -> Result<T, ConsoleError>
    where
        F: Future<Output = Result<T, ConsoleError>>,
    {
        self.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });
        let _loading = LoadingGuard(&self.state);

        match work.await {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::warn!(operation = operation, error = %e, "Auth operation failed");
                let message = e.user_message();
                self.state.send_modify(|state| state.error = Some(message));
                Err(e)
            }
        }
    }

    fn set_user(&self, user: Option<UserRecord>) {
        self.state.send_modify(|state| state.user = user);
    }

    fn expire(&self) {
        self.state.send_modify(|state| {
            state.user = None;
            state.error = Some(SESSION_EXPIRED_MESSAGE.to_string());
        });
    }
}

async fn listen(context: Weak<AuthContext>, mut events: broadcast::Receiver<SessionEvent>) {
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped = skipped, "Session event listener lagged");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        let Some(ctx) = context.upgrade() else {
            break;
        };
        match event {
            SessionEvent::Expired => {
                tracing::info!("Session expired, signing out");
                ctx.expire();
            }
            SessionEvent::Refreshed => tracing::debug!("Session refreshed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiSettings;
    use crate::http::ApiClient;
    use crate::models::{Session, TokenPair};
    use crate::session::SessionStore;

    fn context(store: SessionStore) -> AuthContext {
        // Nothing listens here; requests that do go out fail to connect.
        let api = ApiClient::new(&ApiSettings::new("http://127.0.0.1:9"), store).unwrap();
        AuthContext::new(AuthService::new(Arc::new(api)))
    }

    #[test]
    fn test_starts_loading_until_initialized() {
        let ctx = context(SessionStore::in_memory());
        assert!(ctx.snapshot().loading);

        ctx.initialize();
        let state = ctx.snapshot();
        assert!(!state.loading);
        assert!(state.user.is_none());
    }

    #[test]
    fn test_initialize_restores_saved_user() {
        let store = SessionStore::in_memory();
        let user: UserRecord = serde_json::from_str(r#"{"id":"1","roles":["admin"]}"#).unwrap();
        store
            .save(&Session::new(
                TokenPair {
                    token: "T".into(),
                    refresh_token: "R".into(),
                },
                user.clone(),
            ))
            .unwrap();

        let ctx = context(store);
        ctx.initialize();
        assert_eq!(ctx.snapshot().user, Some(user));
    }

    #[tokio::test]
    async fn test_failed_operation_sets_error_and_clears_loading() {
        let ctx = context(SessionStore::in_memory());
        ctx.initialize();

        let result = ctx.login(&Credentials::new("", "")).await;
        assert!(matches!(result, Err(ConsoleError::Validation(_))));

        let state = ctx.snapshot();
        assert!(!state.loading);
        assert!(state.error.is_some());

        ctx.clear_error();
        assert!(ctx.snapshot().error.is_none());
    }

    #[tokio::test]
    async fn test_update_profile_without_user_is_not_authenticated() {
        let ctx = context(SessionStore::in_memory());
        ctx.initialize();

        let update = ProfileUpdate::default().with_metadata("bio", "x");
        let result = ctx.update_profile(&update).await;
        assert!(matches!(result, Err(ConsoleError::NotAuthenticated)));
        assert!(!ctx.snapshot().loading);
    }

    #[tokio::test]
    async fn test_cancelled_operation_clears_loading() {
        let ctx = context(SessionStore::in_memory());
        ctx.initialize();

        let pending = ctx.bracket("never", std::future::pending::<Result<(), ConsoleError>>());
        let timed_out =
            tokio::time::timeout(std::time::Duration::from_millis(10), pending).await;
        assert!(timed_out.is_err());
        assert!(!ctx.snapshot().loading);
    }
}
