use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use validator::{Validate, ValidationError, ValidationErrors};

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct Credentials {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    pub password: Secret<String>,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: Secret::new(password.into()),
        }
    }

    pub fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = collect(self.validate());
        if self.password.expose_secret().is_empty() {
            add(&mut errors, "password", "required", "Password is required");
        }
        finish(errors)
    }

    pub(crate) fn to_body(&self) -> Value {
        json!({
            "username": self.username,
            "password": self.password.expose_secret(),
        })
    }
}

#[derive(Debug, Deserialize, Clone, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(
        min = 3,
        max = 20,
        message = "Username must be between 3 and 20 characters"
    ))]
    pub username: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    pub password: Secret<String>,

    #[serde(alias = "confirm_password")]
    pub confirm_password: Secret<String>,

    #[serde(alias = "display_name")]
    #[validate(length(
        min = 2,
        max = 50,
        message = "Display Name must be between 2 and 50 characters"
    ))]
    pub display_name: String,
}

impl RegisterRequest {
    pub fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = collect(self.validate());

        if !self
            .username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            add(
                &mut errors,
                "username",
                "charset",
                "Username can only contain letters, numbers and underscores",
            );
        }
        if self.password.expose_secret().chars().count() < 4 {
            add(
                &mut errors,
                "password",
                "length",
                "Password must be at least 4 characters",
            );
        }
        if self.password.expose_secret() != self.confirm_password.expose_secret() {
            add(
                &mut errors,
                "confirm_password",
                "must_match",
                "Passwords must match",
            );
        }

        finish(errors)
    }

    /// The confirmation field never leaves the console.
    pub(crate) fn to_body(&self) -> Value {
        json!({
            "username": self.username,
            "email": self.email,
            "password": self.password.expose_secret(),
            "displayName": self.display_name,
        })
    }
}

/// Summary returned by `POST /users/register`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredUser {
    #[serde(default, alias = "_id", alias = "userId")]
    pub id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(alias = "current_password")]
    pub current_password: Secret<String>,
    #[serde(alias = "new_password")]
    pub new_password: Secret<String>,
    #[serde(default, alias = "confirm_password")]
    pub confirm_password: Option<Secret<String>>,
}

const PASSWORD_SPECIALS: &str = "@$!%*?&";

impl ChangePasswordRequest {
    pub fn new(current_password: impl Into<String>, new_password: impl Into<String>) -> Self {
        Self {
            current_password: Secret::new(current_password.into()),
            new_password: Secret::new(new_password.into()),
            confirm_password: None,
        }
    }

    pub fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let new_password = self.new_password.expose_secret();

        if self.current_password.expose_secret().is_empty() {
            add(
                &mut errors,
                "current_password",
                "required",
                "Current Password is required",
            );
        }
        if new_password.chars().count() < 8 {
            add(
                &mut errors,
                "new_password",
                "length",
                "Password must be at least 8 characters",
            );
        }
        let strong = new_password.chars().any(|c| c.is_ascii_lowercase())
            && new_password.chars().any(|c| c.is_ascii_uppercase())
            && new_password.chars().any(|c| c.is_ascii_digit())
            && new_password.chars().any(|c| PASSWORD_SPECIALS.contains(c));
        if !strong {
            add(
                &mut errors,
                "new_password",
                "strength",
                "Password must contain at least one uppercase letter, one lowercase letter, one number, and one special character",
            );
        }
        if let Some(confirm) = &self.confirm_password {
            if confirm.expose_secret() != new_password {
                add(
                    &mut errors,
                    "confirm_password",
                    "must_match",
                    "Passwords must match",
                );
            }
        }

        finish(errors)
    }

    pub(crate) fn to_body(&self) -> Value {
        json!({
            "currentPassword": self.current_password.expose_secret(),
            "newPassword": self.new_password.expose_secret(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

fn collect(result: Result<(), ValidationErrors>) -> ValidationErrors {
    match result {
        Ok(()) => ValidationErrors::new(),
        Err(errors) => errors,
    }
}

fn add(
    errors: &mut ValidationErrors,
    field: &'static str,
    code: &'static str,
    message: &'static str,
) {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    errors.add(field, error);
}

fn finish(errors: ValidationErrors) -> Result<(), ValidationErrors> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
