//! Access decisions and how denials are rendered.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::access::chain::{Capability, Surface};
use crate::auth::SESSION_COOKIE;

pub const UNAUTHENTICATED_MESSAGE: &str = "Unauthorized. Authentication required.";
pub const ADMIN_REQUIRED_MESSAGE: &str = "Forbidden. Admin access required.";
pub const BANNED_MESSAGE: &str = "Your account has been banned.";

/// Cookie carrying a one-shot error message for the login page.
pub const FLASH_ERROR_COOKIE: &str = "flash_error";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    Deny(Denial),
}

/// Why a request was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    Unauthenticated,
    ForbiddenRole(Capability),
    Banned,
    Suspended { until: DateTime<Utc> },
}

impl Denial {
    pub fn status(&self) -> StatusCode {
        match self {
            Denial::Unauthenticated => StatusCode::UNAUTHORIZED,
            Denial::ForbiddenRole(_) | Denial::Banned | Denial::Suspended { .. } => StatusCode::FORBIDDEN,
        }
    }

    /// Short label for logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Denial::Unauthenticated => "unauthenticated",
            Denial::ForbiddenRole(_) => "forbidden_role",
            Denial::Banned => "banned",
            Denial::Suspended { .. } => "suspended",
        }
    }

    /// Message for API clients.
    pub fn message(&self) -> String {
        match self {
            Denial::Unauthenticated => UNAUTHENTICATED_MESSAGE.to_string(),
            Denial::ForbiddenRole(Capability::Role(role)) => {
                format!("Forbidden. {} access required.", role.title())
            }
            Denial::ForbiddenRole(_) => ADMIN_REQUIRED_MESSAGE.to_string(),
            Denial::Banned => BANNED_MESSAGE.to_string(),
            Denial::Suspended { until } => {
                format!("Your account is suspended until {}.", format_reinstatement(until))
            }
        }
    }

    /// Message for browser pages.
    pub fn page_message(&self) -> String {
        match self {
            Denial::ForbiddenRole(Capability::Role(role)) => {
                format!("Access denied. This page is only available to {}s.", role)
            }
            Denial::ForbiddenRole(_) => "Access denied. This page is only available to admins.".to_string(),
            Denial::Unauthenticated => "Please log in to continue.".to_string(),
            _ => self.message(),
        }
    }

    /// Render for the calling surface.
    pub fn into_surface_response(self, surface: Surface, login_path: &str) -> Response {
        match surface {
            Surface::Api => self.into_api_response(),
            Surface::Browser => self.into_browser_response(login_path),
        }
    }

    /// `{ "success": false, "message": ..., "banned"?: true, "suspended_until"?: ts }`
    pub fn into_api_response(self) -> Response {
        let body = DenialBody {
            success: false,
            message: self.message(),
            banned: matches!(self, Denial::Banned).then_some(true),
            suspended_until: match self {
                Denial::Suspended { until } => Some(until),
                _ => None,
            },
        };
        (self.status(), Json(body)).into_response()
    }

    /// Redirect to login with a flash message, or a plain-text 403.
    pub fn into_browser_response(self, login_path: &str) -> Response {
        let message = self.page_message();
        match self {
            Denial::Unauthenticated => redirect_with_flash(CookieJar::new(), login_path, &message),
            Denial::Banned => {
                // The session behind the cookie is already revoked; drop the cookie as well.
                let mut expired = Cookie::build((SESSION_COOKIE, "")).path("/").build();
                expired.make_removal();
                redirect_with_flash(CookieJar::new().add(expired), login_path, &message)
            }
            Denial::ForbiddenRole(_) | Denial::Suspended { .. } => (
                self.status(),
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                message,
            )
                .into_response(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DenialBody {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    banned: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    suspended_until: Option<DateTime<Utc>>,
}

fn redirect_with_flash(jar: CookieJar, login_path: &str, message: &str) -> Response {
    // The jar percent-encodes cookie values on output.
    let flash = Cookie::build((FLASH_ERROR_COOKIE, message.to_string()))
        .path("/")
        .http_only(true);
    (jar.add(flash), Redirect::to(login_path)).into_response()
}

fn format_reinstatement(until: &DateTime<Utc>) -> String {
    until.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use chrono::TimeZone;
    use jobboard_models::Role;

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_unauthenticated_api_body() {
        let response = Denial::Unauthenticated.into_api_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            json_body(response).await,
            serde_json::json!({ "success": false, "message": "Unauthorized. Authentication required." })
        );
    }

    #[tokio::test]
    async fn test_banned_api_body_has_flag() {
        let response = Denial::Banned.into_api_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = json_body(response).await;
        assert_eq!(body["banned"], serde_json::json!(true));
        assert!(body.get("suspended_until").is_none());
    }

    #[tokio::test]
    async fn test_suspended_api_body_carries_timestamp() {
        let until = Utc.with_ymd_and_hms(2031, 5, 1, 12, 0, 0).unwrap();
        let response = Denial::Suspended { until }.into_api_response();
        let body = json_body(response).await;
        assert_eq!(body["suspended_until"], serde_json::json!("2031-05-01T12:00:00Z"));
        assert_eq!(
            body["message"],
            serde_json::json!("Your account is suspended until 2031-05-01 12:00:00 UTC.")
        );
    }

    #[test]
    fn test_browser_unauthenticated_redirects_with_flash() {
        let response = Denial::Unauthenticated.into_browser_response("/login");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/login");
        let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(set_cookie.starts_with("flash_error=Please%20log%20in%20to%20continue."));

        let cookie = Cookie::parse_encoded(set_cookie).unwrap();
        assert_eq!(cookie.name(), FLASH_ERROR_COOKIE);
        assert_eq!(cookie.value(), "Please log in to continue.");
    }

    #[test]
    fn test_browser_ban_flash_decodes_once() {
        let response = Denial::Banned.into_browser_response("/login");
        let flash = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap())
            .find(|c| c.starts_with("flash_error="))
            .unwrap();
        let cookie = Cookie::parse_encoded(flash).unwrap();
        assert_eq!(cookie.value(), BANNED_MESSAGE);
    }

    #[tokio::test]
    async fn test_browser_wrong_role_is_plain_text() {
        let response =
            Denial::ForbiddenRole(Capability::Role(Role::Employer)).into_browser_response("/login");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(
            &bytes[..],
            b"Access denied. This page is only available to employers."
        );
    }

    #[test]
    fn test_browser_ban_clears_session_cookie() {
        let response = Denial::Banned.into_browser_response("/login");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let cookies: Vec<_> = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert!(cookies.iter().any(|c| c.starts_with("jb_session=")));
        assert!(cookies.iter().any(|c| c.starts_with("flash_error=")));
    }
}
