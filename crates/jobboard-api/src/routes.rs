//! API routes.

use axum::middleware;
use axum::routing::{get, post, MethodRouter};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

use jobboard_models::{ActivityType, Role};

use crate::access::{enforce_access, AccessLayerState, RoutePolicy, Surface};
use crate::auth::load_session;
use crate::handlers::admin::{
    ban_user, get_user, list_users, recent_activity, suspend_user, unban_user, unsuspend_user,
};
use crate::handlers::dashboard::{candidate_dashboard, employer_dashboard};
use crate::handlers::public::{show_blog_post, show_candidate, show_company, show_job};
use crate::handlers::session::{logout, me};
use crate::handlers::{health, ready};
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, rate_limit_middleware, request_id, request_logging, ClientRateLimiter};
use crate::security::security_headers;
use crate::services::{record_activity, ActivityLayerState, TRACKED_ROUTES};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    // Public entity pages, each recorded in the activity log
    let mut public_routes = Router::new();
    for route in TRACKED_ROUTES.iter() {
        let handler: MethodRouter<AppState> = match route.activity_type {
            ActivityType::JobViewed => get(show_job),
            ActivityType::CompanyViewed => get(show_company),
            ActivityType::CandidateViewed => get(show_candidate),
            ActivityType::BlogPostViewed => get(show_blog_post),
        };
        let recorder = ActivityLayerState::new(state.activity.clone(), route);
        public_routes = public_routes.route(
            route.path,
            handler.route_layer(middleware::from_fn_with_state(recorder, record_activity)),
        );
    }
    let public_routes = guarded(public_routes, &state, RoutePolicy::public(Surface::Api));

    let session_routes = Router::new()
        .route("/me", get(me))
        .route("/logout", post(logout));
    let session_routes = guarded(session_routes, &state, RoutePolicy::authenticated(Surface::Api));

    // Admin moderation (admin only)
    let admin_routes = Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/users/:uid", get(get_user))
        .route("/admin/users/:uid/ban", post(ban_user))
        .route("/admin/users/:uid/unban", post(unban_user))
        .route("/admin/users/:uid/suspend", post(suspend_user))
        .route("/admin/users/:uid/unsuspend", post(unsuspend_user))
        .route("/admin/activity", get(recent_activity));
    let admin_routes = guarded(admin_routes, &state, RoutePolicy::admin());

    let rate_limiter = ClientRateLimiter::new(state.config.rate_limit_rps, state.config.rate_limit_burst)
        .trust_proxy(state.config.trust_proxy);

    let api_routes = Router::new()
        .merge(public_routes)
        .merge(session_routes)
        .merge(admin_routes)
        .layer(middleware::from_fn_with_state(rate_limiter, rate_limit_middleware));

    // Browser dashboards, one role each
    let employer_routes = guarded(
        Router::new().route("/employer/dashboard", get(employer_dashboard)),
        &state,
        RoutePolicy::role(Role::Employer),
    );
    let candidate_routes = guarded(
        Router::new().route("/candidate/dashboard", get(candidate_dashboard)),
        &state,
        RoutePolicy::role(Role::Candidate),
    );

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    // Metrics endpoint (if enabled)
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    // Security headers sit outermost so every response carries them,
    // including denials, timeouts and 404s.
    Router::new()
        .nest("/api", api_routes)
        .merge(employer_routes)
        .merge(candidate_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(middleware::from_fn_with_state(state.clone(), load_session))
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(TimeoutLayer::new(state.config.request_timeout))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .layer(middleware::from_fn_with_state(state.clone(), security_headers))
        .with_state(state)
}

/// Run the access chain for `policy` in front of every route in `routes`.
fn guarded(routes: Router<AppState>, state: &AppState, policy: RoutePolicy) -> Router<AppState> {
    routes.route_layer(middleware::from_fn_with_state(
        AccessLayerState::new(state.clone(), policy),
        enforce_access,
    ))
}
