use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque bearer credential handed out by the identity provider.
///
/// The value is never inspected; it is only stored and attached to requests.
/// `Debug` output is masked so credentials do not leak into logs.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    /// Wrap a raw credential string without validating it
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Wrap a raw value, treating missing or blank input as "no credential"
    #[must_use]
    pub fn from_raw(value: Option<&str>) -> Option<Self> {
        value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(Self::new)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Short, log-safe rendering of the credential
    #[must_use]
    pub fn masked(&self) -> String {
        let prefix: String = self.0.chars().take(6).collect();
        if prefix.len() < self.0.len() {
            format!("{prefix}…")
        } else {
            "***".to_string()
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&self.masked()).finish()
    }
}

impl From<&str> for Credential {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Credential {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Role assigned to a user by the backend
///
/// Any role string the client does not recognise is treated as `Member`,
/// so an unexpected value can never grant admin access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    #[serde(other)]
    Member,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => f.write_str("admin"),
            Self::Member => f.write_str("member"),
        }
    }
}

/// Profile returned by `GET /api/users/me`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub role: Role,
}

impl UserProfile {
    #[must_use]
    pub fn new(email: impl Into<String>, name: Option<&str>, role: Role) -> Self {
        Self {
            id: None,
            email: email.into(),
            name: name.map(ToString::to_string),
            picture: None,
            role,
        }
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Name to show in the UI, falling back to the email address
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.email)
    }
}

/// Lifecycle state of a session, derived from a [`SessionSnapshot`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Bootstrapping,
    Authenticated,
    Anonymous,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bootstrapping => f.write_str("bootstrapping"),
            Self::Authenticated => f.write_str("authenticated"),
            Self::Anonymous => f.write_str("anonymous"),
        }
    }
}

/// Point-in-time view of the session shared with every consumer
///
/// `is_authenticated` is not stored; it is always computed from `user`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    user: Option<UserProfile>,
    is_loading: bool,
}

impl SessionSnapshot {
    #[must_use]
    pub fn new(user: Option<UserProfile>, is_loading: bool) -> Self {
        Self { user, is_loading }
    }

    /// Snapshot at mount time, before the stored credential is resolved
    #[must_use]
    pub fn bootstrapping() -> Self {
        Self::new(None, true)
    }

    #[must_use]
    pub fn anonymous() -> Self {
        Self::new(None, false)
    }

    #[must_use]
    pub fn authenticated(user: UserProfile) -> Self {
        Self::new(Some(user), false)
    }

    #[must_use]
    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(UserProfile::is_admin)
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        if self.is_loading {
            SessionState::Bootstrapping
        } else if self.is_authenticated() {
            SessionState::Authenticated
        } else {
            SessionState::Anonymous
        }
    }

    pub(crate) fn set_user(&mut self, user: Option<UserProfile>) {
        self.user = user;
    }

    pub(crate) fn finish_loading(&mut self) {
        self.is_loading = false;
    }
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self::bootstrapping()
    }
}
