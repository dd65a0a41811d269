use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use validator::{Validate, ValidationError, ValidationErrors};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Pending,
    #[default]
    Active,
    Suspended,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Pending => "pending",
            UserStatus::Active => "active",
            UserStatus::Suspended => "suspended",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cached snapshot of the signed-in user, as returned by the API.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub roles: BTreeSet<String>,
    #[serde(default)]
    pub status: UserStatus,
    #[serde(default)]
    pub is_email_verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<DateTime<Utc>>,
}

impl UserRecord {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    /// True when the user holds at least one of `roles`, or when `roles` is empty.
    pub fn has_any_role<S: AsRef<str>>(&self, roles: &[S]) -> bool {
        roles.is_empty() || roles.iter().any(|role| self.roles.contains(role.as_ref()))
    }

    pub fn is_admin(&self) -> bool {
        self.has_role("admin")
    }

    /// Name shown in the header: display name, then username, then the email's local part.
    pub fn name(&self) -> String {
        if !self.display_name.is_empty() {
            self.display_name.clone()
        } else if !self.username.is_empty() {
            self.username.clone()
        } else {
            self.email.split('@').next().unwrap_or("User").to_string()
        }
    }

    pub fn initials(&self) -> String {
        let name = self.name();
        let initials: String = name
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .take(2)
            .collect();

        match initials.chars().count() {
            0 => "U".to_string(),
            1 => name.chars().take(2).collect::<String>().to_uppercase(),
            _ => initials.to_uppercase(),
        }
    }

    pub fn metadata_value(&self, key: &str) -> &str {
        self.metadata.get(key).map(String::as_str).unwrap_or("")
    }

    /// Shallow merge: fields absent from `update` keep their cached value and
    /// metadata is merged key by key.
    pub fn apply(&mut self, update: &ProfileUpdate) {
        if let Some(display_name) = &update.display_name {
            self.display_name = display_name.clone();
        }
        if let Some(email) = &update.email {
            self.email = email.clone();
        }
        if let Some(profile_image) = &update.profile_image {
            self.profile_image = Some(profile_image.clone());
        }
        for (key, value) in &update.metadata {
            self.metadata.insert(key.clone(), value.clone());
        }
    }
}

/// Partial profile change sent to `PUT /users/profile`.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(
        min = 2,
        max = 50,
        message = "Display Name must be between 2 and 50 characters"
    ))]
    pub display_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(url(message = "Must be a valid URL"))]
    pub profile_image: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl ProfileUpdate {
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Field constraints plus the limits on the free-text metadata entries.
    pub fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };

        let limits: [(&'static str, usize, &'static str); 2] = [
            ("bio", 300, "Bio must be at most 300 characters"),
            ("location", 100, "Location must be at most 100 characters"),
        ];
        for (key, max, message) in limits {
            if let Some(value) = self.metadata.get(key) {
                if value.chars().count() > max {
                    let mut error = ValidationError::new("length");
                    error.message = Some(message.into());
                    errors.add(key, error);
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
