//! Handlers for the caller's own session.

use axum::extract::State;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Serialize;
use tracing::info;

use jobboard_models::Principal;

use crate::auth::{CurrentUser, SessionAuthState, SESSION_COOKIE};
use crate::error::ApiResult;
use crate::state::AppState;

/// Current user response.
#[derive(Serialize)]
pub struct MeResponse {
    pub user: Principal,
}

/// Who am I.
pub async fn me(CurrentUser(user): CurrentUser) -> Json<MeResponse> {
    Json(MeResponse { user })
}

#[derive(Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

/// Revoke the current session and clear the session cookie.
pub async fn logout(
    State(state): State<AppState>,
    auth: SessionAuthState,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Json<LogoutResponse>)> {
    if let Some(session) = &auth.session {
        state.stores.sessions.revoke(&session.id).await?;
        info!(user_id = %session.user_id, session_id = %session.id, "User logged out");
    }

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    Ok((jar, Json(LogoutResponse { success: true })))
}
