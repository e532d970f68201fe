//! Wire DTOs for the auth API.
//!
//! DESIGN
//! ======
//! `User` is deserialized leniently: every field except the identifier and
//! email is optional, so profile fields added or dropped server-side never
//! break session resumption.

use serde::{Deserialize, Serialize};

/// Opaque role descriptor. Displayed, never evaluated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub role_id: i64,
    pub role_name: String,
}

/// The authenticated principal as returned by the auth endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Server-assigned opaque identifier.
    pub user_id: String,
    /// Unique email address.
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    /// Avatar image reference (URL or storage key).
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Risk-profile tag assigned by the server, e.g. `"moderate"`.
    #[serde(default)]
    pub risk_profile: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    /// Creation timestamp exactly as the server sent it.
    #[serde(default)]
    pub created_at: Option<String>,
}

impl User {
    /// Best available human-readable name: display name, then full name, then email.
    #[must_use]
    pub fn label(&self) -> String {
        if let Some(name) = self.display_name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.to_owned();
        }
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(only), None) | (None, Some(only)) => only.to_owned(),
            (None, None) => self.email.clone(),
        }
    }
}

/// Body for `POST /api/auth/login`.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Body for `POST /api/auth/register`.
#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub display_name: String,
}

impl<'a> RegisterRequest<'a> {
    /// Build a registration body, defaulting the display name to `"{first} {last}"`.
    #[must_use]
    pub fn new(
        email: &'a str,
        password: &'a str,
        first_name: &'a str,
        last_name: &'a str,
        display_name: Option<&str>,
    ) -> Self {
        let display_name = match display_name.map(str::trim) {
            Some(name) if !name.is_empty() => name.to_owned(),
            _ => format!("{first_name} {last_name}"),
        };
        Self { email, password, first_name, last_name, display_name }
    }
}

/// Success payload of login, register, and current-user calls.
///
/// The documented shape is `{ "user": { ... } }`; a bare user object is
/// accepted as well.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum UserPayload {
    Wrapped { user: User },
    Bare(User),
}

impl UserPayload {
    #[must_use]
    pub fn into_user(self) -> User {
        match self {
            Self::Wrapped { user } | Self::Bare(user) => user,
        }
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
