//! Activity recording for authenticated views.
//!
//! Only the routes in [`TRACKED_ROUTES`] are recorded. Recording happens after
//! the handler has produced a successful response and runs on a spawned task,
//! so neither its latency nor its failures reach the caller.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{RawPathParams, State};
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use jobboard_models::{ActivityRecord, ActivityType, SubjectRef, UserId};
use jobboard_store::{ActivityLog, EntityStore, StoreResult};

use crate::auth::SessionAuthState;
use crate::metrics;

/// A named route whose successful views are recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackedRoute {
    pub name: &'static str,
    pub path: &'static str,
    pub activity_type: ActivityType,
}

/// Allow-list of recorded routes. Paths are relative to the `/api` prefix.
pub static TRACKED_ROUTES: [TrackedRoute; 4] = [
    TrackedRoute {
        name: "jobs.show",
        path: "/jobs/:slug",
        activity_type: ActivityType::JobViewed,
    },
    TrackedRoute {
        name: "companies.show",
        path: "/companies/:slug",
        activity_type: ActivityType::CompanyViewed,
    },
    TrackedRoute {
        name: "candidates.show",
        path: "/candidates/:id",
        activity_type: ActivityType::CandidateViewed,
    },
    TrackedRoute {
        name: "blog.show",
        path: "/blog/:slug",
        activity_type: ActivityType::BlogPostViewed,
    },
];

/// Look up a tracked route by name.
pub fn tracked_route(name: &str) -> Option<&'static TrackedRoute> {
    TRACKED_ROUTES.iter().find(|route| route.name == name)
}

/// A view of a tracked route, reduced to what is needed to find its subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackableView {
    pub activity_type: ActivityType,
    pub subject_key: String,
}

impl TrackableView {
    pub fn new(activity_type: ActivityType, subject_key: impl Into<String>) -> Self {
        Self {
            activity_type,
            subject_key: subject_key.into(),
        }
    }

    /// Build a view from matched path parameters.
    ///
    /// Returns `None` when the parameter naming the subject is missing or empty.
    pub fn from_params<'a>(
        route: &TrackedRoute,
        params: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Option<Self> {
        let wanted = route.activity_type.subject_param();
        params
            .into_iter()
            .find(|(name, value)| *name == wanted && !value.is_empty())
            .map(|(_, value)| Self::new(route.activity_type, value))
    }
}

/// Result of a single record attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Recorded,
    SubjectMissing,
    Failed,
}

impl RecordOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordOutcome::Recorded => "recorded",
            RecordOutcome::SubjectMissing => "subject_missing",
            RecordOutcome::Failed => "failed",
        }
    }
}

/// Resolves view subjects and writes activity records.
#[derive(Clone)]
pub struct ActivityRecorder {
    entities: Arc<dyn EntityStore>,
    log: Arc<dyn ActivityLog>,
}

impl ActivityRecorder {
    pub fn new(entities: Arc<dyn EntityStore>, log: Arc<dyn ActivityLog>) -> Self {
        Self { entities, log }
    }

    /// Record one view. Errors are logged and reported in the outcome only.
    pub async fn record(&self, view: &TrackableView, causer: &UserId) -> RecordOutcome {
        let outcome = match self.resolve(view).await {
            Ok(Some((subject, display_name))) => {
                let record = ActivityRecord::new(
                    view.activity_type,
                    view.activity_type.describe(&display_name),
                    subject,
                    causer.clone(),
                );
                match self.log.track(record).await {
                    Ok(()) => RecordOutcome::Recorded,
                    Err(e) => {
                        warn!(activity = %view.activity_type, error = %e, "Failed to write activity record");
                        RecordOutcome::Failed
                    }
                }
            }
            Ok(None) => {
                debug!(
                    activity = %view.activity_type,
                    subject = %view.subject_key,
                    "Activity subject not found, skipping"
                );
                RecordOutcome::SubjectMissing
            }
            Err(e) => {
                warn!(activity = %view.activity_type, error = %e, "Failed to resolve activity subject");
                RecordOutcome::Failed
            }
        };

        metrics::record_activity(view.activity_type.as_str(), outcome.as_str());
        outcome
    }

    /// Record on a background task.
    pub fn spawn_record(&self, view: TrackableView, causer: UserId) -> JoinHandle<RecordOutcome> {
        let recorder = self.clone();
        tokio::spawn(async move { recorder.record(&view, &causer).await })
    }

    /// Find the subject and its display name.
    async fn resolve(&self, view: &TrackableView) -> StoreResult<Option<(SubjectRef, String)>> {
        let kind = view.activity_type.subject_kind();
        let key = view.subject_key.as_str();

        let found = match view.activity_type {
            ActivityType::JobViewed => self
                .entities
                .find_job_by_slug(key)
                .await?
                .map(|job| (job.id, job.title)),
            ActivityType::CompanyViewed => self
                .entities
                .find_company_by_slug(key)
                .await?
                .map(|company| (company.id, company.name)),
            ActivityType::CandidateViewed => self
                .entities
                .find_user_by_id(&UserId::from(key))
                .await?
                .map(|user| (user.id.to_string(), user.name)),
            ActivityType::BlogPostViewed => self
                .entities
                .find_blog_post_by_slug(key)
                .await?
                .map(|post| (post.id, post.title)),
        };

        Ok(found.map(|(id, name)| (SubjectRef { kind, id }, name)))
    }
}

/// Middleware state for one tracked route.
#[derive(Clone)]
pub struct ActivityLayerState {
    recorder: ActivityRecorder,
    route: &'static TrackedRoute,
}

impl ActivityLayerState {
    pub fn new(recorder: ActivityRecorder, route: &'static TrackedRoute) -> Self {
        Self { recorder, route }
    }
}

/// Record the view after a successful response from an authenticated caller.
///
/// Install with `route_layer` on the tracked route itself.
pub async fn record_activity(
    State(layer): State<ActivityLayerState>,
    params: RawPathParams,
    request: Request<Body>,
    next: Next,
) -> Response {
    let view = TrackableView::from_params(layer.route, params.iter());
    let causer = request
        .extensions()
        .get::<SessionAuthState>()
        .and_then(|auth| auth.principal.as_ref())
        .map(|p| p.id.clone());

    let response = next.run(request).await;

    if response.status().is_success() {
        if let (Some(view), Some(causer)) = (view, causer) {
            debug!(route = layer.route.name, "Dispatching activity record");
            layer.recorder.spawn_record(view, causer);
        }
    }

    response
}
