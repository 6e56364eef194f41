//! Applying the state changes requested by access gates.
//!
//! Both effects are idempotent: clearing an already-cleared suspension and
//! revoking an already-revoked session leave the stored state unchanged, so
//! concurrent requests from the same user converge without locking. The
//! suspension clear touches only the suspension fields of the stored record,
//! never the request's snapshot of the principal.

use tracing::{info, warn};

use crate::access::chain::Effect;
use crate::auth::SessionAuthState;
use crate::state::Stores;

/// Apply effects against the stores and the request-scoped auth state.
///
/// Store failures are logged and do not change the access decision already
/// made by the chain.
pub async fn apply_effects(stores: &Stores, auth: &mut SessionAuthState, effects: &[Effect]) {
    for effect in effects {
        match effect {
            Effect::ClearSuspension(user_id) => {
                let Some(principal) = auth.principal.as_mut().filter(|p| &p.id == user_id) else {
                    continue;
                };
                if !principal.lift_suspension() {
                    continue;
                }
                match stores.principals.clear_suspension(user_id).await {
                    Ok(true) => info!(user_id = %user_id, "Cleared expired suspension"),
                    Ok(false) => {}
                    Err(e) => warn!(user_id = %user_id, error = %e, "Failed to persist suspension clear"),
                }
            }
            Effect::InvalidateSession(session_id) => {
                match stores.sessions.revoke(session_id).await {
                    Ok(()) => info!(session_id = %session_id, "Invalidated session of banned user"),
                    Err(e) => warn!(session_id = %session_id, error = %e, "Failed to invalidate session"),
                }
                auth.sign_out();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use jobboard_models::{CredentialKind, Principal, Role, Session};
    use jobboard_store::{
        MemoryStore, MockActivityLog, MockEntityStore, MockPrincipalStore, MockSessionStore,
        PrincipalStore, StoreError,
    };

    fn stores(principals: MockPrincipalStore, sessions: MockSessionStore) -> Stores {
        Stores {
            principals: Arc::new(principals),
            sessions: Arc::new(sessions),
            entities: Arc::new(MockEntityStore::new()),
            activity: Arc::new(MockActivityLog::new()),
        }
    }

    fn suspended_in_past() -> Principal {
        let mut p = Principal::new("Sam", "sam@example.com", Role::Employer);
        p.suspend_until(Utc::now() - Duration::minutes(1));
        p
    }

    #[tokio::test]
    async fn test_clear_suspension_persists_once() {
        let p = suspended_in_past();
        let id = p.id.clone();

        let mut principals = MockPrincipalStore::new();
        principals
            .expect_clear_suspension()
            .withf(move |cleared| *cleared == id)
            .times(1)
            .returning(|_| Ok(true));
        let stores = stores(principals, MockSessionStore::new());

        let effects = vec![Effect::ClearSuspension(p.id.clone())];
        let mut auth = SessionAuthState {
            principal: Some(p),
            session: None,
        };

        apply_effects(&stores, &mut auth, &effects).await;
        let cleared = auth.principal.clone().unwrap();
        assert!(!cleared.is_suspended);
        assert!(cleared.suspended_until.is_none());

        // Second run on the already-cleared principal is a no-op: no further write.
        apply_effects(&stores, &mut auth, &effects).await;
        assert_eq!(auth.principal.unwrap(), cleared);
    }

    #[tokio::test]
    async fn test_clear_suspension_save_failure_is_swallowed() {
        let p = suspended_in_past();
        let mut principals = MockPrincipalStore::new();
        principals
            .expect_clear_suspension()
            .times(1)
            .returning(|_| Err(StoreError::unavailable("down")));
        let stores = stores(principals, MockSessionStore::new());

        let effects = vec![Effect::ClearSuspension(p.id.clone())];
        let mut auth = SessionAuthState {
            principal: Some(p),
            session: None,
        };
        apply_effects(&stores, &mut auth, &effects).await;
        assert!(auth.is_authenticated());
    }

    #[tokio::test]
    async fn test_clear_suspension_does_not_undo_later_ban() {
        let store = Arc::new(MemoryStore::new());
        let p = suspended_in_past();
        store.insert_principal(p.clone()).await;

        // The request holds a snapshot taken before an admin bans the user.
        let snapshot = store.find_by_id(&p.id).await.unwrap().unwrap();
        store.set_banned(&p.id, true).await.unwrap();

        let effects = vec![Effect::ClearSuspension(p.id.clone())];
        let mut auth = SessionAuthState {
            principal: Some(snapshot),
            session: None,
        };
        apply_effects(&Stores::memory(store.clone()), &mut auth, &effects).await;

        let stored = store.find_by_id(&p.id).await.unwrap().unwrap();
        assert!(stored.is_banned);
        assert!(!stored.is_suspended);
        assert!(stored.suspended_until.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_session_revokes_and_signs_out() {
        let mut p = Principal::new("Bo", "bo@example.com", Role::Candidate);
        p.ban();
        let session = Session::new(p.id.clone(), CredentialKind::Browser, Duration::hours(1));
        let sid = session.id.clone();

        let mut sessions = MockSessionStore::new();
        sessions
            .expect_revoke()
            .withf(move |id| *id == sid)
            .times(1)
            .returning(|_| Ok(()));
        let stores = stores(MockPrincipalStore::new(), sessions);

        let effects = vec![Effect::InvalidateSession(session.id.clone())];
        let mut auth = SessionAuthState {
            principal: Some(p),
            session: Some(session),
        };
        apply_effects(&stores, &mut auth, &effects).await;
        assert!(!auth.is_authenticated());
        assert!(auth.session.is_none());
    }
}
