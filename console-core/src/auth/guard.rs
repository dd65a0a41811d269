use super::context::AuthState;
use crate::models::UserRecord;

pub const ADMIN_ROLE: &str = "admin";

/// Outcome of checking one navigation against the current auth state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session state is still being established; show a placeholder.
    Pending,
    Render,
    /// No signed-in user; `from` is the location to come back to.
    RedirectToLogin { from: String },
    /// Signed in, but without any of the required roles.
    Forbidden,
}

impl GuardDecision {
    pub fn label(&self) -> &'static str {
        match self {
            GuardDecision::Pending => "pending",
            GuardDecision::Render => "render",
            GuardDecision::RedirectToLogin { .. } => "redirect_login",
            GuardDecision::Forbidden => "forbidden",
        }
    }
}

/// Decides render vs redirect for protected views. Holds no state of its own.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    login_path: String,
    forbidden_path: String,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::new("/login", "/forbidden")
    }
}

impl RouteGuard {
    pub fn new(login_path: impl Into<String>, forbidden_path: impl Into<String>) -> Self {
        Self {
            login_path: login_path.into(),
            forbidden_path: forbidden_path.into(),
        }
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    pub fn forbidden_path(&self) -> &str {
        &self.forbidden_path
    }

    pub fn evaluate<S: AsRef<str>>(
        &self,
        state: &AuthState,
        required_roles: &[S],
        requested: &str,
    ) -> GuardDecision {
        if state.loading {
            return GuardDecision::Pending;
        }

        let Some(user) = &state.user else {
            return GuardDecision::RedirectToLogin {
                from: requested.to_string(),
            };
        };

        if user.has_any_role(required_roles) {
            GuardDecision::Render
        } else {
            GuardDecision::Forbidden
        }
    }

    /// Where to send the browser for a redirecting decision.
    pub fn redirect_location(&self, decision: &GuardDecision) -> Option<String> {
        match decision {
            GuardDecision::RedirectToLogin { from } => Some(format!(
                "{}?from={}",
                self.login_path,
                urlencoding::encode(from)
            )),
            GuardDecision::Forbidden => Some(self.forbidden_path.clone()),
            GuardDecision::Pending | GuardDecision::Render => None,
        }
    }
}

/// Landing page after sign-in when no return target was given.
pub fn default_landing(user: &UserRecord) -> &'static str {
    if user.is_admin() {
        "/dashboard"
    } else {
        "/user-home"
    }
}

/// Accept only same-origin absolute paths as a post-login return target.
pub fn sanitize_return_to(from: Option<&str>) -> Option<String> {
    let from = from?.trim();
    let mut chars = from.chars();
    if chars.next() != Some('/') || matches!(chars.next(), Some('/' | '\\')) {
        return None;
    }
    // Only visible ASCII survives into a Location header; browsers drop tabs
    // and newlines, which would turn "/\t/host" into a protocol-relative URL.
    if from.chars().all(|c| c.is_ascii_graphic() && c != '\\') {
        Some(from.to_string())
    } else {
        None
    }
}

/// A path prefix and the roles allowed to see it (empty: any signed-in user).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedRoute {
    pub path: String,
    pub required_roles: Vec<String>,
}

impl ProtectedRoute {
    pub fn authenticated(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            required_roles: Vec::new(),
        }
    }

    pub fn with_roles(path: impl Into<String>, roles: &[&str]) -> Self {
        Self {
            path: path.into(),
            required_roles: roles.iter().map(|role| role.to_string()).collect(),
        }
    }

    fn matches(&self, path: &str) -> bool {
        path == self.path
            || path
                .strip_prefix(self.path.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<ProtectedRoute>,
}

impl RouteTable {
    pub fn new(routes: Vec<ProtectedRoute>) -> Self {
        Self { routes }
    }

    /// The protected pages of the console.
    pub fn console() -> Self {
        Self::new(vec![
            ProtectedRoute::with_roles("/dashboard", &[ADMIN_ROLE]),
            ProtectedRoute::with_roles("/users", &[ADMIN_ROLE]),
            ProtectedRoute::with_roles("/roles", &[ADMIN_ROLE]),
            ProtectedRoute::with_roles("/services", &[ADMIN_ROLE]),
            ProtectedRoute::with_roles("/audit-logs", &[ADMIN_ROLE]),
            ProtectedRoute::authenticated("/user-home"),
            ProtectedRoute::authenticated("/profile"),
        ])
    }

    /// The longest registered prefix covering `path`.
    pub fn lookup(&self, path: &str) -> Option<&ProtectedRoute> {
        self.routes
            .iter()
            .filter(|route| route.matches(path))
            .max_by_key(|route| route.path.len())
    }

    pub fn routes(&self) -> &[ProtectedRoute] {
        &self.routes
    }
}
