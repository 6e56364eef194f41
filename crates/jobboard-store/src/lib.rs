//! Store capabilities for the jobboard API.
//!
//! This crate provides:
//! - Principal and session stores (durable user and login state)
//! - Read-only entity lookups for jobs, companies, users and blog posts
//! - The append-only activity log sink
//! - An in-memory backend implementing all of the above

pub mod activity_log;
pub mod entity_repo;
pub mod error;
pub mod memory;
pub mod principal_repo;

pub use activity_log::ActivityLog;
pub use entity_repo::EntityStore;
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use principal_repo::{PrincipalStore, SessionStore};

#[cfg(feature = "mock")]
pub use activity_log::MockActivityLog;
#[cfg(feature = "mock")]
pub use entity_repo::MockEntityStore;
#[cfg(feature = "mock")]
pub use principal_repo::{MockPrincipalStore, MockSessionStore};
