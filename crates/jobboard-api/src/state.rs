//! Application state.

use std::sync::Arc;

use jobboard_store::{ActivityLog, EntityStore, MemoryStore, PrincipalStore, SessionStore};

use crate::auth::SessionKeys;
use crate::config::ApiConfig;
use crate::security::SecurityHeaderPolicy;
use crate::services::{ActivityRecorder, ModerationService};

/// Store capabilities handed to the access layer and the recorder.
#[derive(Clone)]
pub struct Stores {
    pub principals: Arc<dyn PrincipalStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub entities: Arc<dyn EntityStore>,
    pub activity: Arc<dyn ActivityLog>,
}

impl Stores {
    /// Back every capability with the same in-memory store.
    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self {
            principals: store.clone(),
            sessions: store.clone(),
            entities: store.clone(),
            activity: store,
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub stores: Stores,
    pub session_keys: Arc<SessionKeys>,
    pub security_headers: Arc<SecurityHeaderPolicy>,
    pub activity: ActivityRecorder,
    pub moderation: ModerationService,
}

impl AppState {
    /// Create new application state.
    pub fn new(config: ApiConfig, stores: Stores) -> Self {
        let session_keys = Arc::new(SessionKeys::new(&config.session_secret));
        let security_headers = Arc::new(SecurityHeaderPolicy::from_config(&config));
        let activity = ActivityRecorder::new(Arc::clone(&stores.entities), Arc::clone(&stores.activity));
        let moderation = ModerationService::new(Arc::clone(&stores.principals), Arc::clone(&stores.sessions));

        Self {
            config,
            stores,
            session_keys,
            security_headers,
            activity,
            moderation,
        }
    }
}
