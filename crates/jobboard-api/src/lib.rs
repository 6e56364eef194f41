//! Axum HTTP API server for the jobboard.
//!
//! This crate provides:
//! - Session resolution from bearer tokens or the session cookie
//! - The access chain guarding admin, dashboard and API routes
//! - Security headers on every response
//! - Best-effort activity recording for entity views
//! - Admin moderation, rate limiting and Prometheus metrics

pub mod access;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod security;
pub mod services;
pub mod state;

pub use auth::{SessionAuthState, SessionKeys, SESSION_COOKIE};
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use security::SecurityHeaderPolicy;
pub use services::{ActivityRecorder, ModerationService};
pub use state::{AppState, Stores};
