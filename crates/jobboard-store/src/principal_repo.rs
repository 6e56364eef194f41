//! Durable principal and session state.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use jobboard_models::{CredentialKind, Principal, Session, SessionId, UserId};

use crate::error::StoreResult;

/// Durable user record access.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait PrincipalStore: Send + Sync {
    /// Get a principal by ID.
    async fn find_by_id(&self, id: &UserId) -> StoreResult<Option<Principal>>;

    /// Set or reset the ban flag, leaving every other field as stored.
    ///
    /// Returns the updated principal, or `None` for an unknown user.
    async fn set_banned(&self, id: &UserId, banned: bool) -> StoreResult<Option<Principal>>;

    /// Suspend a user until `until`, leaving every other field as stored.
    async fn suspend_until(&self, id: &UserId, until: DateTime<Utc>) -> StoreResult<Option<Principal>>;

    /// Reset only the suspension fields.
    ///
    /// Returns `true` when a suspension was lifted. Unknown users and
    /// already-cleared suspensions both return `false`.
    async fn clear_suspension(&self, id: &UserId) -> StoreResult<bool>;

    /// List principals ordered by creation time.
    async fn list(&self, limit: usize, offset: usize) -> StoreResult<Vec<Principal>>;
}

/// Login session storage.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Open a new session for a user.
    async fn create(&self, user_id: &UserId, kind: CredentialKind, ttl: Duration) -> StoreResult<Session>;

    /// Get a live session. Expired sessions are reported as absent.
    async fn find(&self, id: &SessionId) -> StoreResult<Option<Session>>;

    /// Revoke a session. Revoking an unknown session is a no-op.
    async fn revoke(&self, id: &SessionId) -> StoreResult<()>;

    /// Revoke every session of a user, returning how many were removed.
    async fn revoke_all_for(&self, user_id: &UserId) -> StoreResult<usize>;
}
