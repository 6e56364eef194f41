//! Admin handlers for user moderation and activity inspection.
//!
//! Every route here sits behind the admin access chain, so handlers can rely
//! on `CurrentUser` being an admin that is neither banned nor suspended.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use jobboard_models::{ActivityRecord, Principal, UserId};

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::services::ModerationResult;
use crate::state::AppState;

const MAX_PAGE_SIZE: usize = 100;

/// Query for listing users.
#[derive(Debug, Deserialize, Validate)]
pub struct ListUsersQuery {
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    20
}

/// List users response.
#[derive(Serialize)]
pub struct ListUsersResponse {
    pub users: Vec<Principal>,
    pub limit: usize,
    pub offset: usize,
}

/// List users (admin only).
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> ApiResult<Json<ListUsersResponse>> {
    query.validate()?;

    let users = state.stores.principals.list(query.limit, query.offset).await?;

    Ok(Json(ListUsersResponse {
        users,
        limit: query.limit,
        offset: query.offset,
    }))
}

/// Get a single user (admin only).
pub async fn get_user(
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> ApiResult<Json<Principal>> {
    let user = state.moderation.get_user(&UserId::from(uid)).await?;
    Ok(Json(user))
}

/// Moderation response.
#[derive(Serialize)]
pub struct ModerationResponse {
    pub success: bool,
    pub message: String,
    pub user: Principal,
    #[serde(skip_serializing_if = "is_zero")]
    pub revoked_sessions: usize,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl ModerationResponse {
    fn new(message: impl Into<String>, result: ModerationResult) -> Self {
        Self {
            success: true,
            message: message.into(),
            user: result.user,
            revoked_sessions: result.revoked_sessions,
        }
    }
}

pub async fn ban_user(
    State(state): State<AppState>,
    CurrentUser(admin): CurrentUser,
    Path(uid): Path<String>,
) -> ApiResult<Json<ModerationResponse>> {
    let result = state.moderation.ban(&admin, &UserId::from(uid)).await?;
    Ok(Json(ModerationResponse::new("User banned", result)))
}

pub async fn unban_user(
    State(state): State<AppState>,
    CurrentUser(admin): CurrentUser,
    Path(uid): Path<String>,
) -> ApiResult<Json<ModerationResponse>> {
    let result = state.moderation.unban(&admin, &UserId::from(uid)).await?;
    Ok(Json(ModerationResponse::new("User unbanned", result)))
}

/// Suspend request.
#[derive(Debug, Deserialize, Validate)]
pub struct SuspendRequest {
    /// End of the suspension (RFC 3339).
    #[validate(custom(function = "validate_future"))]
    pub until: DateTime<Utc>,
}

fn validate_future(until: &DateTime<Utc>) -> Result<(), ValidationError> {
    if *until <= Utc::now() {
        let mut err = ValidationError::new("future");
        err.message = Some("must be in the future".into());
        return Err(err);
    }
    Ok(())
}

pub async fn suspend_user(
    State(state): State<AppState>,
    CurrentUser(admin): CurrentUser,
    Path(uid): Path<String>,
    Json(request): Json<SuspendRequest>,
) -> ApiResult<Json<ModerationResponse>> {
    request.validate()?;

    let result = state
        .moderation
        .suspend(&admin, &UserId::from(uid), request.until, Utc::now())
        .await?;
    let message = format!(
        "User suspended until {}",
        request.until.format("%Y-%m-%d %H:%M:%S UTC")
    );
    Ok(Json(ModerationResponse::new(message, result)))
}

pub async fn unsuspend_user(
    State(state): State<AppState>,
    CurrentUser(admin): CurrentUser,
    Path(uid): Path<String>,
) -> ApiResult<Json<ModerationResponse>> {
    let result = state.moderation.unsuspend(&admin, &UserId::from(uid)).await?;
    Ok(Json(ModerationResponse::new("User unsuspended", result)))
}

/// Query for recent activity.
#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

/// Recent activity response.
#[derive(Serialize)]
pub struct ActivityResponse {
    pub records: Vec<ActivityRecord>,
}

/// Most recent activity records, newest first.
pub async fn recent_activity(
    State(state): State<AppState>,
    Query(query): Query<ActivityQuery>,
) -> ApiResult<Json<ActivityResponse>> {
    let limit = query.limit.clamp(1, MAX_PAGE_SIZE);
    let records = state.stores.activity.recent(limit).await?;
    Ok(Json(ActivityResponse { records }))
}
