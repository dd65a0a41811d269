use crate::error::ConsoleError;
use crate::http::{parse_token_pair, ApiClient, ApiRequest};
use crate::models::{
    ChangePasswordRequest, Credentials, ForgotPasswordRequest, ProfileUpdate, RegisterRequest,
    RegisteredUser, Session, TokenPair, UserRecord,
};
use crate::session::SessionStore;
use serde_json::Value;
use std::sync::Arc;
use validator::Validate;

/// Authentication operations against the user-management API.
///
/// Credential-bearing results are written to the session store before they are
/// returned, so an observer reading the store never lags behind the caller.
#[derive(Clone)]
pub struct AuthService {
    api: Arc<ApiClient>,
}

impl AuthService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    pub fn store(&self) -> &SessionStore {
        self.api.store()
    }

    /// Create an account. Does not sign the new user in.
    #[tracing::instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(
        &self,
        request: &RegisterRequest,
    ) -> Result<RegisteredUser, ConsoleError> {
        request.check()?;

        let request = ApiRequest::post("/users/register")
            .with_body(request.to_body())
            .public();
        let registered: RegisteredUser = self.api.fetch(request).await?;

        tracing::info!(user_id = ?registered.id, "Registration accepted");
        Ok(registered)
    }

    /// Exchange credentials for a session and persist it.
    ///
    /// The response must be the flat `{ token, refreshToken, user }` envelope.
    #[tracing::instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn login(&self, credentials: &Credentials) -> Result<Session, ConsoleError> {
        credentials.check()?;

        let request = ApiRequest::post("/users/login")
            .with_body(credentials.to_body())
            .public();
        let body: Value = match self.api.fetch(request).await {
            Ok(body) => body,
            Err(ConsoleError::Unauthorized(_)) => {
                tracing::warn!("Login rejected");
                return Err(ConsoleError::InvalidCredentials);
            }
            Err(e) => return Err(e),
        };

        let session = parse_login(&body)?;
        self.store().save(&session)?;

        tracing::info!("Login successful");
        Ok(session)
    }

    /// End the session. The remote call is best-effort; local state is always cleared.
    #[tracing::instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), ConsoleError> {
        if self.store().access_token().is_some() {
            let request = ApiRequest::post("/users/logout").without_refresh();
            if let Err(e) = self.api.send(request).await {
                tracing::warn!(error = %e, "Remote logout failed, clearing local session anyway");
            }
        }

        self.store().clear()?;
        tracing::info!("Logged out");
        Ok(())
    }

    pub async fn refresh(&self) -> Result<TokenPair, ConsoleError> {
        self.api.refresh_tokens().await
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn change_password(
        &self,
        request: &ChangePasswordRequest,
    ) -> Result<(), ConsoleError> {
        request.check()?;

        let request = ApiRequest::post("/users/change-password").with_body(request.to_body());
        self.api.send(request).await?;

        tracing::info!("Password changed");
        Ok(())
    }

    /// Send a partial profile change and merge it into the cached user.
    #[tracing::instrument(skip(self, update))]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserRecord, ConsoleError> {
        update.check()?;
        let mut user = self.store().user().ok_or(ConsoleError::NotAuthenticated)?;

        let request = ApiRequest::put("/users/profile").with_json(update)?;
        self.api.send(request).await?;

        user.apply(update);
        self.store().save_user(&user)?;

        tracing::info!(user_id = %user.id, "Profile updated");
        Ok(user)
    }

    /// Fetch the server's view of the signed-in user and cache it.
    pub async fn get_profile(&self) -> Result<UserRecord, ConsoleError> {
        let body: Value = self.api.get("/users/profile").await?;
        let user = parse_user(body.get("user").unwrap_or(&body))?;

        if self.store().access_token().is_some() {
            self.store().save_user(&user)?;
        }
        Ok(user)
    }

    pub async fn verify_email(&self, token: &str) -> Result<String, ConsoleError> {
        let path = format!("/users/verify-email/{}", urlencoding::encode(token));
        let body: Value = self.api.fetch(ApiRequest::get(path).public()).await?;
        Ok(message_or(&body, "Email verified successfully"))
    }

    pub async fn request_password_reset(
        &self,
        request: &ForgotPasswordRequest,
    ) -> Result<String, ConsoleError> {
        request.validate()?;

        let request = ApiRequest::post("/users/forgot-password")
            .with_json(request)?
            .public();
        let body: Value = self.api.fetch(request).await?;
        Ok(message_or(
            &body,
            "If an account exists for that address, a reset link has been sent",
        ))
    }

    pub fn current_user(&self) -> Option<UserRecord> {
        self.store().user()
    }

    /// Token presence only; the server remains the authority on validity.
    pub fn is_authenticated(&self) -> bool {
        self.store().access_token().is_some()
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.current_user()
            .map(|user| user.has_role(role))
            .unwrap_or(false)
    }

    /// True for an empty list; otherwise requires a cached user holding one of `roles`.
    pub fn has_any_role<S: AsRef<str>>(&self, roles: &[S]) -> bool {
        if roles.is_empty() {
            return true;
        }
        self.current_user()
            .map(|user| user.has_any_role(roles))
            .unwrap_or(false)
    }
}

fn parse_login(body: &Value) -> Result<Session, ConsoleError> {
    let tokens = parse_token_pair(body)?;
    let user = body
        .get("user")
        .ok_or_else(|| ConsoleError::MalformedServerResponse("missing `user`".to_string()))?;

    Ok(Session::new(tokens, parse_user(user)?))
}

fn parse_user(value: &Value) -> Result<UserRecord, ConsoleError> {
    serde_json::from_value(value.clone())
        .map_err(|e| ConsoleError::MalformedServerResponse(format!("user: {}", e)))
}

fn message_or(body: &Value, fallback: &str) -> String {
    body.get("message")
        .and_then(Value::as_str)
        .unwrap_or(fallback)
        .to_string()
}
