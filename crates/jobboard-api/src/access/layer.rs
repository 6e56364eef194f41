//! Axum middleware running the access chain for a route group.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;
use tracing::{debug, warn};

use crate::access::chain::{AccessChain, GateContext, RoutePolicy};
use crate::access::denial::{AccessDecision, Denial};
use crate::access::effects::apply_effects;
use crate::auth::SessionAuthState;
use crate::metrics;
use crate::state::AppState;

/// Middleware state: the app plus the policy of the guarded route group.
#[derive(Clone)]
pub struct AccessLayerState {
    app: AppState,
    policy: RoutePolicy,
    chain: Arc<AccessChain>,
}

impl AccessLayerState {
    pub fn new(app: AppState, policy: RoutePolicy) -> Self {
        let chain = Arc::new(AccessChain::for_policy(&policy));
        Self { app, policy, chain }
    }
}

/// Gate a request before it reaches the handler.
///
/// Install with `route_layer` so only matched routes are checked.
pub async fn enforce_access(
    State(layer): State<AccessLayerState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let mut auth = request
        .extensions()
        .get::<SessionAuthState>()
        .cloned()
        .unwrap_or_default();

    let evaluation = layer.chain.evaluate(&GateContext::new(
        auth.principal.as_ref(),
        auth.session.as_ref(),
        Utc::now(),
    ));

    let user_id = auth.principal.as_ref().map(|p| p.id.to_string());
    if !evaluation.effects.is_empty() {
        apply_effects(&layer.app.stores, &mut auth, &evaluation.effects).await;
    }

    match evaluation.decision {
        AccessDecision::Allow => {
            request.extensions_mut().insert(auth);
            next.run(request).await
        }
        AccessDecision::Deny(denial) => {
            match denial {
                Denial::Unauthenticated => {
                    debug!(path = %request.uri().path(), "Unauthenticated request denied");
                }
                _ => warn!(
                    path = %request.uri().path(),
                    user_id = ?user_id,
                    reason = denial.reason(),
                    "Access denied"
                ),
            }
            metrics::record_access_denied(denial.reason());
            denial.into_surface_response(layer.policy.surface, &layer.app.config.login_path)
        }
    }
}
