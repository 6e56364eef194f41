//! Request authorization.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → auth::load_session (resolve principal, once per request)
//!     → access::enforce_access (route_layer, per route group)
//!         → AccessChain::evaluate   pure, short-circuits on first denial
//!         → effects::apply_effects  session invalidation / suspension clear
//!         → Denial rendered per surface, or handler runs
//! ```
//!
//! Gate order is fixed: authentication, capability (admin or role), ban,
//! suspension. A banned and suspended principal always gets the ban
//! explanation, and a non-admin never learns whether an admin account is
//! banned.

pub mod chain;
pub mod denial;
pub mod effects;
pub mod layer;

pub use chain::{
    AccessChain, Capability, Effect, Evaluation, Gate, GateContext, GateOutcome, RoutePolicy, Surface,
};
pub use denial::{AccessDecision, Denial, ADMIN_REQUIRED_MESSAGE, BANNED_MESSAGE, UNAUTHENTICATED_MESSAGE};
pub use effects::apply_effects;
pub use layer::{enforce_access, AccessLayerState};
