//! Request handlers.

pub mod admin;
pub mod dashboard;
pub mod health;
pub mod public;
pub mod session;

pub use admin::*;
pub use dashboard::*;
pub use health::*;
pub use public::*;
pub use session::*;
