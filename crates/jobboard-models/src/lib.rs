//! Shared data models for the jobboard backend.
//!
//! This crate provides Serde-serializable types for:
//! - Principals (users) with their role and revocation state
//! - Sessions and credential kinds
//! - Viewable entities: jobs, companies, blog posts
//! - Activity records written by the activity recorder

pub mod activity;
pub mod entity;
pub mod principal;
pub mod session;

// Re-export common types
pub use activity::{ActivityRecord, ActivityType, SubjectKind, SubjectRef};
pub use entity::{BlogPost, Company, Job};
pub use principal::{Principal, Role, RoleParseError, UserId};
pub use session::{CredentialKind, Session, SessionId};
