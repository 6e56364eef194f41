//! Access gates and the chain that runs them.

use chrono::{DateTime, Utc};

use jobboard_models::{Principal, Role, Session, SessionId, UserId};

use crate::access::denial::{AccessDecision, Denial};

/// Capability a route demands beyond authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    None,
    Admin,
    Role(Role),
}

/// Calling surface, which decides the shape of denial responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// JSON clients: denials are `{success: false, message, ...}` bodies.
    Api,
    /// Browser pages: denials redirect to login or return plain text.
    Browser,
}

/// Access requirements declared by a route group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutePolicy {
    pub requires_auth: bool,
    pub capability: Capability,
    pub surface: Surface,
}

impl RoutePolicy {
    /// Open to anyone. Signed-in callers still go through the revocation gates.
    pub fn public(surface: Surface) -> Self {
        Self {
            requires_auth: false,
            capability: Capability::None,
            surface,
        }
    }

    pub fn authenticated(surface: Surface) -> Self {
        Self {
            requires_auth: true,
            capability: Capability::None,
            surface,
        }
    }

    /// Admin API routes.
    pub fn admin() -> Self {
        Self {
            requires_auth: true,
            capability: Capability::Admin,
            surface: Surface::Api,
        }
    }

    /// Browser pages restricted to one non-admin role.
    pub fn role(role: Role) -> Self {
        Self {
            requires_auth: true,
            capability: Capability::Role(role),
            surface: Surface::Browser,
        }
    }
}

/// Everything a gate may look at.
#[derive(Debug, Clone, Copy)]
pub struct GateContext<'a> {
    pub principal: Option<&'a Principal>,
    pub session: Option<&'a Session>,
    pub now: DateTime<Utc>,
}

impl<'a> GateContext<'a> {
    pub fn new(principal: Option<&'a Principal>, session: Option<&'a Session>, now: DateTime<Utc>) -> Self {
        Self {
            principal,
            session,
            now,
        }
    }
}

/// State change requested by a gate. Applied by `effects::apply_effects`,
/// never by the gates themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Clear `is_suspended` and `suspended_until` for the user.
    ClearSuspension(UserId),
    /// Revoke a browser session.
    InvalidateSession(SessionId),
}

/// Result of a single gate.
#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome {
    Pass,
    PassWith(Effect),
    Deny(Denial, Option<Effect>),
}

/// A single access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    RequireAuthenticated,
    RequireAdmin,
    RequireRole(Role),
    RejectBanned,
    ClearExpiredSuspension,
}

impl Gate {
    pub fn check(&self, ctx: &GateContext<'_>) -> GateOutcome {
        match self {
            Gate::RequireAuthenticated => match ctx.principal {
                Some(_) => GateOutcome::Pass,
                None => GateOutcome::Deny(Denial::Unauthenticated, None),
            },
            Gate::RequireAdmin => match ctx.principal {
                Some(p) if p.is_admin() => GateOutcome::Pass,
                Some(_) => GateOutcome::Deny(Denial::ForbiddenRole(Capability::Admin), None),
                None => GateOutcome::Deny(Denial::Unauthenticated, None),
            },
            Gate::RequireRole(role) => match ctx.principal {
                Some(p) if p.has_role(*role) => GateOutcome::Pass,
                Some(_) => GateOutcome::Deny(Denial::ForbiddenRole(Capability::Role(*role)), None),
                None => GateOutcome::Deny(Denial::Unauthenticated, None),
            },
            Gate::RejectBanned => match ctx.principal {
                Some(p) if p.is_banned => {
                    let invalidate = ctx
                        .session
                        .filter(|s| s.is_browser())
                        .map(|s| Effect::InvalidateSession(s.id.clone()));
                    GateOutcome::Deny(Denial::Banned, invalidate)
                }
                _ => GateOutcome::Pass,
            },
            Gate::ClearExpiredSuspension => match ctx.principal {
                Some(p) if p.suspension_active_at(ctx.now) => match p.suspended_until {
                    Some(until) => GateOutcome::Deny(Denial::Suspended { until }, None),
                    None => GateOutcome::Pass,
                },
                Some(p) if p.suspension_expired_at(ctx.now) => {
                    GateOutcome::PassWith(Effect::ClearSuspension(p.id.clone()))
                }
                _ => GateOutcome::Pass,
            },
        }
    }
}

/// Outcome of running a chain: the decision plus the effects to apply.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub decision: AccessDecision,
    pub effects: Vec<Effect>,
}

impl Evaluation {
    pub fn is_allowed(&self) -> bool {
        matches!(self.decision, AccessDecision::Allow)
    }
}

/// Ordered list of gates for a route group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessChain {
    gates: Vec<Gate>,
}

impl AccessChain {
    pub fn new(gates: Vec<Gate>) -> Self {
        Self { gates }
    }

    /// Build the gate list for a policy. A role gate replaces the admin gate;
    /// the revocation gates always run last.
    pub fn for_policy(policy: &RoutePolicy) -> Self {
        let mut gates = Vec::with_capacity(4);
        if policy.requires_auth {
            gates.push(Gate::RequireAuthenticated);
        }
        match policy.capability {
            Capability::None => {}
            Capability::Admin => gates.push(Gate::RequireAdmin),
            Capability::Role(role) => gates.push(Gate::RequireRole(role)),
        }
        gates.push(Gate::RejectBanned);
        gates.push(Gate::ClearExpiredSuspension);
        Self { gates }
    }

    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    /// Run the gates in order, stopping at the first denial.
    pub fn evaluate(&self, ctx: &GateContext<'_>) -> Evaluation {
        let mut effects = Vec::new();
        for gate in &self.gates {
            match gate.check(ctx) {
                GateOutcome::Pass => {}
                GateOutcome::PassWith(effect) => effects.push(effect),
                GateOutcome::Deny(denial, effect) => {
                    effects.extend(effect);
                    return Evaluation {
                        decision: AccessDecision::Deny(denial),
                        effects,
                    };
                }
            }
        }
        Evaluation {
            decision: AccessDecision::Allow,
            effects,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use jobboard_models::CredentialKind;

    fn principal(role: Role) -> Principal {
        Principal::new("Test User", "test@example.com", role)
    }

    fn browser_session(p: &Principal) -> Session {
        Session::new(p.id.clone(), CredentialKind::Browser, Duration::hours(1))
    }

    fn eval(policy: RoutePolicy, p: Option<&Principal>, s: Option<&Session>) -> Evaluation {
        let now = Utc::now();
        AccessChain::for_policy(&policy).evaluate(&GateContext::new(p, s, now))
    }

    #[test]
    fn test_gate_order_per_policy() {
        assert_eq!(
            AccessChain::for_policy(&RoutePolicy::admin()).gates(),
            &[
                Gate::RequireAuthenticated,
                Gate::RequireAdmin,
                Gate::RejectBanned,
                Gate::ClearExpiredSuspension
            ]
        );
        assert_eq!(
            AccessChain::for_policy(&RoutePolicy::role(Role::Employer)).gates(),
            &[
                Gate::RequireAuthenticated,
                Gate::RequireRole(Role::Employer),
                Gate::RejectBanned,
                Gate::ClearExpiredSuspension
            ]
        );
        assert_eq!(
            AccessChain::for_policy(&RoutePolicy::public(Surface::Api)).gates(),
            &[Gate::RejectBanned, Gate::ClearExpiredSuspension]
        );
    }

    #[test]
    fn test_anonymous_on_admin_route_is_unauthenticated() {
        let result = eval(RoutePolicy::admin(), None, None);
        assert_eq!(result.decision, AccessDecision::Deny(Denial::Unauthenticated));
        assert!(result.effects.is_empty());
    }

    #[test]
    fn test_non_admin_on_admin_route_is_forbidden() {
        let p = principal(Role::Employer);
        let result = eval(RoutePolicy::admin(), Some(&p), None);
        assert_eq!(
            result.decision,
            AccessDecision::Deny(Denial::ForbiddenRole(Capability::Admin))
        );
    }

    #[test]
    fn test_role_check_precedes_ban_check() {
        // A banned non-admin on an admin route learns only that it is not an admin.
        let mut p = principal(Role::Candidate);
        p.ban();
        let result = eval(RoutePolicy::admin(), Some(&p), None);
        assert_eq!(
            result.decision,
            AccessDecision::Deny(Denial::ForbiddenRole(Capability::Admin))
        );
        assert!(result.effects.is_empty());
    }

    #[test]
    fn test_ban_wins_over_any_suspension_state() {
        let now = Utc::now();
        let suspensions = [
            (false, None),
            (true, None),
            (true, Some(now + Duration::days(3))),
            (true, Some(now - Duration::days(3))),
            (false, Some(now + Duration::days(3))),
        ];
        for role in [Role::Candidate, Role::Employer, Role::Admin] {
            for (is_suspended, until) in suspensions {
                let mut p = principal(role);
                p.ban();
                p.is_suspended = is_suspended;
                p.suspended_until = until;

                for policy in [
                    RoutePolicy::public(Surface::Api),
                    RoutePolicy::authenticated(Surface::Api),
                    RoutePolicy::role(role),
                ] {
                    let result = eval(policy, Some(&p), None);
                    assert_eq!(result.decision, AccessDecision::Deny(Denial::Banned));
                    assert!(!result.effects.iter().any(|e| matches!(e, Effect::ClearSuspension(_))));
                }
            }
        }
    }

    #[test]
    fn test_ban_invalidates_browser_session_only() {
        let mut p = principal(Role::Candidate);
        p.ban();

        let browser = browser_session(&p);
        let result = eval(RoutePolicy::authenticated(Surface::Browser), Some(&p), Some(&browser));
        assert_eq!(result.effects, vec![Effect::InvalidateSession(browser.id.clone())]);

        let api = Session::new(p.id.clone(), CredentialKind::Api, Duration::hours(1));
        let result = eval(RoutePolicy::authenticated(Surface::Api), Some(&p), Some(&api));
        assert_eq!(result.decision, AccessDecision::Deny(Denial::Banned));
        assert!(result.effects.is_empty());
    }

    #[test]
    fn test_active_suspension_denies_without_effects() {
        let until = Utc::now() + Duration::hours(6);
        let mut p = principal(Role::Employer);
        p.suspend_until(until);
        let before = p.clone();

        let result = eval(RoutePolicy::role(Role::Employer), Some(&p), None);
        assert_eq!(result.decision, AccessDecision::Deny(Denial::Suspended { until }));
        assert!(result.effects.is_empty());
        assert_eq!(p, before);
    }

    #[test]
    fn test_expired_suspension_allows_and_requests_clear() {
        for until in [Some(Utc::now() - Duration::seconds(1)), None] {
            let mut p = principal(Role::Candidate);
            p.is_suspended = true;
            p.suspended_until = until;

            let result = eval(RoutePolicy::authenticated(Surface::Api), Some(&p), None);
            assert!(result.is_allowed());
            assert_eq!(result.effects, vec![Effect::ClearSuspension(p.id.clone())]);
        }
    }

    #[test]
    fn test_cleared_principal_produces_no_effects() {
        let p = principal(Role::Candidate);
        let result = eval(RoutePolicy::authenticated(Surface::Api), Some(&p), None);
        assert!(result.is_allowed());
        assert!(result.effects.is_empty());
    }

    #[test]
    fn test_public_route_allows_anonymous() {
        let result = eval(RoutePolicy::public(Surface::Browser), None, None);
        assert!(result.is_allowed());
    }

    #[test]
    fn test_wrong_role_on_role_route() {
        let p = principal(Role::Candidate);
        let result = eval(RoutePolicy::role(Role::Employer), Some(&p), None);
        assert_eq!(
            result.decision,
            AccessDecision::Deny(Denial::ForbiddenRole(Capability::Role(Role::Employer)))
        );
    }
}
