//! Append-only activity log sink.

use async_trait::async_trait;

use jobboard_models::ActivityRecord;

use crate::error::StoreResult;

#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait ActivityLog: Send + Sync {
    /// Append a record.
    async fn track(&self, record: ActivityRecord) -> StoreResult<()>;

    /// Most recent records, newest first.
    async fn recent(&self, limit: usize) -> StoreResult<Vec<ActivityRecord>>;
}
