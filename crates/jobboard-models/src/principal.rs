//! Principal (authenticated user) model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a user account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Generate a new random user ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Candidate,
    Employer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Candidate => "candidate",
            Role::Employer => "employer",
            Role::Admin => "admin",
        }
    }

    /// Capitalized form used in user-facing messages.
    pub fn title(&self) -> &'static str {
        match self {
            Role::Candidate => "Candidate",
            Role::Employer => "Employer",
            Role::Admin => "Admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct RoleParseError(pub String);

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "candidate" => Ok(Role::Candidate),
            "employer" => Ok(Role::Employer),
            "admin" => Ok(Role::Admin),
            other => Err(RoleParseError(other.to_string())),
        }
    }
}

/// The authenticated actor behind a request.
///
/// `is_banned` and `is_suspended` are independent flags. A ban is permanent
/// until an admin lifts it; a suspension ends once `suspended_until` passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Principal {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub is_banned: bool,
    #[serde(default)]
    pub is_suspended: bool,
    #[serde(default)]
    pub suspended_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Principal {
    /// Create a new, unrestricted principal.
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            name: name.into(),
            email: email.into(),
            role,
            is_banned: false,
            is_suspended: false,
            suspended_until: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }

    /// Suspended with a reinstatement time still in the future.
    pub fn suspension_active_at(&self, now: DateTime<Utc>) -> bool {
        self.is_suspended && self.suspended_until.is_some_and(|until| until > now)
    }

    /// Suspended, but the reinstatement time has passed or was never set.
    pub fn suspension_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.is_suspended && !self.suspension_active_at(now)
    }

    /// Clear the suspension flag and timestamp.
    ///
    /// Returns `false` when there was nothing to clear.
    pub fn lift_suspension(&mut self) -> bool {
        if !self.is_suspended && self.suspended_until.is_none() {
            return false;
        }
        self.is_suspended = false;
        self.suspended_until = None;
        self.updated_at = Utc::now();
        true
    }

    /// Suspend until the given time.
    pub fn suspend_until(&mut self, until: DateTime<Utc>) {
        self.is_suspended = true;
        self.suspended_until = Some(until);
        self.updated_at = Utc::now();
    }

    pub fn ban(&mut self) {
        self.is_banned = true;
        self.updated_at = Utc::now();
    }

    pub fn unban(&mut self) {
        self.is_banned = false;
        self.updated_at = Utc::now();
    }
}
