//! Admin moderation of user accounts.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use jobboard_models::{Principal, UserId};
use jobboard_store::{PrincipalStore, SessionStore};

use crate::error::{ApiError, ApiResult};
use crate::metrics;

/// Result of a moderation action.
#[derive(Debug, Clone, Serialize)]
pub struct ModerationResult {
    pub user: Principal,
    /// Sessions revoked as part of the action.
    pub revoked_sessions: usize,
}

/// Ban, suspend and reinstate users.
#[derive(Clone)]
pub struct ModerationService {
    principals: Arc<dyn PrincipalStore>,
    sessions: Arc<dyn SessionStore>,
}

impl ModerationService {
    pub fn new(principals: Arc<dyn PrincipalStore>, sessions: Arc<dyn SessionStore>) -> Self {
        Self { principals, sessions }
    }

    /// Get a user or fail with 404.
    pub async fn get_user(&self, user_id: &UserId) -> ApiResult<Principal> {
        self.principals
            .find_by_id(user_id)
            .await?
            .ok_or_else(user_not_found)
    }

    /// Ban a user and revoke all of their sessions.
    pub async fn ban(&self, actor: &Principal, user_id: &UserId) -> ApiResult<ModerationResult> {
        ensure_not_self(actor, user_id, "ban")?;

        let user = self
            .principals
            .set_banned(user_id, true)
            .await?
            .ok_or_else(user_not_found)?;
        let revoked_sessions = self.sessions.revoke_all_for(user_id).await?;

        info!(
            admin_id = %actor.id,
            user_id = %user_id,
            revoked_sessions,
            "User banned"
        );
        metrics::record_moderation("ban");

        Ok(ModerationResult {
            user,
            revoked_sessions,
        })
    }

    pub async fn unban(&self, actor: &Principal, user_id: &UserId) -> ApiResult<ModerationResult> {
        let user = self
            .principals
            .set_banned(user_id, false)
            .await?
            .ok_or_else(user_not_found)?;

        info!(admin_id = %actor.id, user_id = %user_id, "User unbanned");
        metrics::record_moderation("unban");

        Ok(ModerationResult {
            user,
            revoked_sessions: 0,
        })
    }

    /// Suspend a user until `until`, which must lie after `now`.
    pub async fn suspend(
        &self,
        actor: &Principal,
        user_id: &UserId,
        until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> ApiResult<ModerationResult> {
        ensure_not_self(actor, user_id, "suspend")?;
        if until <= now {
            return Err(ApiError::bad_request("Suspension end must be in the future"));
        }

        let user = self
            .principals
            .suspend_until(user_id, until)
            .await?
            .ok_or_else(user_not_found)?;

        info!(
            admin_id = %actor.id,
            user_id = %user_id,
            until = %until,
            "User suspended"
        );
        metrics::record_moderation("suspend");

        Ok(ModerationResult {
            user,
            revoked_sessions: 0,
        })
    }

    pub async fn unsuspend(&self, actor: &Principal, user_id: &UserId) -> ApiResult<ModerationResult> {
        if self.principals.clear_suspension(user_id).await? {
            info!(admin_id = %actor.id, user_id = %user_id, "User unsuspended");
            metrics::record_moderation("unsuspend");
        }
        let user = self.get_user(user_id).await?;

        Ok(ModerationResult {
            user,
            revoked_sessions: 0,
        })
    }
}

fn user_not_found() -> ApiError {
    ApiError::not_found("User not found")
}

fn ensure_not_self(actor: &Principal, user_id: &UserId, action: &str) -> ApiResult<()> {
    if &actor.id == user_id {
        return Err(ApiError::bad_request(format!("You cannot {} your own account", action)));
    }
    Ok(())
}
