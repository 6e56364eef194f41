//! Session authentication.
//!
//! Session credentials are HS256 tokens naming a user and a session id. A token
//! is only honored while its session is still live in the session store, so
//! revoking the session (logout, ban) invalidates the token immediately.
//!
//! `load_session` is the only place that reads credentials off the request.
//! Everything downstream works from the `SessionAuthState` it leaves in the
//! request extensions.

use axum::body::Body;
use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use jobboard_models::{CredentialKind, Principal, Session, SessionId, UserId};

use crate::access::UNAUTHENTICATED_MESSAGE;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Cookie carrying browser session tokens.
pub const SESSION_COOKIE: &str = "jb_session";

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User ID
    pub sub: String,
    /// Session ID
    pub sid: String,
    /// Credential kind the session was opened for
    pub kind: CredentialKind,
    /// Issued at
    pub iat: i64,
    /// Expiration
    pub exp: i64,
}

/// Signing and verification keys for session tokens.
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl SessionKeys {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Sign a token for a session.
    pub fn issue(&self, session: &Session) -> ApiResult<String> {
        let claims = SessionClaims {
            sub: session.user_id.to_string(),
            sid: session.id.to_string(),
            kind: session.kind,
            iat: session.created_at.timestamp(),
            exp: session.expires_at.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ApiError::internal(format!("Failed to sign session token: {}", e)))
    }

    /// Verify signature and expiry.
    pub fn verify(&self, token: &str) -> Option<SessionClaims> {
        match decode::<SessionClaims>(token, &self.decoding, &self.validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                debug!(error = %e, "Rejected session token");
                None
            }
        }
    }
}

/// Per-request view of who is calling.
#[derive(Debug, Clone, Default)]
pub struct SessionAuthState {
    pub principal: Option<Principal>,
    pub session: Option<Session>,
}

impl SessionAuthState {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }

    /// Drop the principal and session, e.g. after the session was invalidated.
    pub fn sign_out(&mut self) {
        self.principal = None;
        self.session = None;
    }
}

/// Resolve a raw token into an auth state.
///
/// Bad, expired or revoked tokens resolve to an anonymous state. Only store
/// failures are errors.
pub async fn resolve_token(state: &AppState, token: &str) -> ApiResult<SessionAuthState> {
    let Some(claims) = state.session_keys.verify(token) else {
        return Ok(SessionAuthState::anonymous());
    };

    let session_id = SessionId::from(claims.sid.as_str());
    let Some(session) = state.stores.sessions.find(&session_id).await? else {
        debug!(session_id = %session_id, "Session no longer live");
        return Ok(SessionAuthState::anonymous());
    };

    if session.user_id.as_str() != claims.sub
        || session.kind != claims.kind
        || session.is_expired_at(Utc::now())
    {
        return Ok(SessionAuthState::anonymous());
    }

    let user_id = UserId::from(claims.sub);
    let principal = state.stores.principals.find_by_id(&user_id).await?;
    if principal.is_none() {
        debug!(user_id = %user_id, "Session refers to unknown user");
        return Ok(SessionAuthState::anonymous());
    }

    Ok(SessionAuthState {
        principal,
        session: Some(session),
    })
}

/// Resolve the caller and attach a `SessionAuthState` to the request.
///
/// A bearer token takes precedence over the session cookie.
pub async fn load_session(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    jar: CookieJar,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = bearer
        .map(|TypedHeader(Authorization(b))| b.token().to_string())
        .or_else(|| jar.get(SESSION_COOKIE).map(|c| c.value().to_string()));

    let auth = match token {
        Some(token) => match resolve_token(&state, &token).await {
            Ok(auth) => auth,
            Err(e) => return e.into_response(),
        },
        None => SessionAuthState::anonymous(),
    };

    request.extensions_mut().insert(auth);
    next.run(request).await
}

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for SessionAuthState {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<SessionAuthState>()
            .cloned()
            .unwrap_or_default())
    }
}

/// Authenticated principal, rejecting anonymous callers with 401.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Principal);

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionAuthState>()
            .and_then(|auth| auth.principal.clone())
            .map(CurrentUser)
            .ok_or_else(|| ApiError::unauthorized(UNAUTHENTICATED_MESSAGE))
    }
}

/// Principal if one is signed in.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<Principal>);

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for MaybeUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(
            parts
                .extensions
                .get::<SessionAuthState>()
                .and_then(|auth| auth.principal.clone()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_issue_and_verify() {
        let keys = SessionKeys::new("unit-test-secret-value");
        let session = Session::new(UserId::from("u1"), CredentialKind::Browser, Duration::hours(1));
        let token = keys.issue(&session).unwrap();

        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.sid, session.id.to_string());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let session = Session::new(UserId::from("u1"), CredentialKind::Api, Duration::hours(1));
        let token = SessionKeys::new("first-secret-value!").issue(&session).unwrap();
        assert!(SessionKeys::new("second-secret-value").verify(&token).is_none());
    }

    #[test]
    fn test_expired_token_rejected() {
        let keys = SessionKeys::new("unit-test-secret-value");
        let session = Session::new(UserId::from("u1"), CredentialKind::Api, Duration::minutes(-5));
        let token = keys.issue(&session).unwrap();
        assert!(keys.verify(&token).is_none());
    }
}
