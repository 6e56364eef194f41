//! Business logic services.

pub mod activity;
pub mod moderation;

pub use activity::{
    record_activity, tracked_route, ActivityLayerState, ActivityRecorder, RecordOutcome,
    TrackableView, TrackedRoute, TRACKED_ROUTES,
};
pub use moderation::{ModerationResult, ModerationService};
