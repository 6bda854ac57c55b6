//! Route Guard
//!
//! [`check`] is a pure function of the session snapshot. The order of checks
//! is fixed: loading first, then authentication, then role. Checking the role
//! before authentication would expose admin-only redirect behaviour to
//! anonymous users.

use super::routes::{self, RouteMatch, HOME_PATH, LOGIN_PATH};
use crate::models::SessionSnapshot;
use crate::session::{SessionContext, SessionEvent};
use std::fmt;

/// What a protected view demands of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GuardRequirement {
    pub admin_only: bool,
}

impl GuardRequirement {
    pub const AUTHENTICATED: Self = Self { admin_only: false };
    pub const ADMIN: Self = Self { admin_only: true };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    Unauthenticated,
    NotAdmin,
    UnknownRoute,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Session still bootstrapping; render a neutral loading indicator
    Pending,
    /// Navigate to `target`, replacing the current history entry
    DenyRedirect {
        target: String,
        reason: DenyReason,
        /// Original destination, kept so login can return to it
        from: Option<String>,
    },
    Allow,
}

impl GuardOutcome {
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Location to navigate to for a redirect, carrying the original
    /// destination as a `redirect` query parameter when there is one
    #[must_use]
    pub fn redirect_location(&self) -> Option<String> {
        match self {
            Self::DenyRedirect {
                target,
                from: Some(from),
                ..
            } if from != HOME_PATH => Some(format!(
                "{target}?redirect={}",
                urlencoding::encode(from)
            )),
            Self::DenyRedirect { target, .. } => Some(target.clone()),
            _ => None,
        }
    }
}

impl fmt::Display for GuardOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Allow => f.write_str("allow"),
            Self::DenyRedirect { target, reason, .. } => {
                write!(f, "redirect to {target} ({reason:?})")
            }
        }
    }
}

/// Decide whether `destination` may be rendered for `snapshot`
#[must_use]
pub fn check(
    snapshot: &SessionSnapshot,
    requirement: GuardRequirement,
    destination: &str,
) -> GuardOutcome {
    if snapshot.is_loading() {
        return GuardOutcome::Pending;
    }

    if !snapshot.is_authenticated() {
        return GuardOutcome::DenyRedirect {
            target: LOGIN_PATH.to_string(),
            reason: DenyReason::Unauthenticated,
            from: Some(destination.to_string()),
        };
    }

    if requirement.admin_only && !snapshot.is_admin() {
        return GuardOutcome::DenyRedirect {
            target: HOME_PATH.to_string(),
            reason: DenyReason::NotAdmin,
            from: None,
        };
    }

    GuardOutcome::Allow
}

/// Guard bound to a live session, consulted before rendering any view
#[derive(Debug, Clone)]
pub struct RouteGuard {
    context: SessionContext,
}

impl RouteGuard {
    #[must_use]
    pub fn new(context: SessionContext) -> Self {
        Self { context }
    }

    /// Decide navigation to `path` using the route table and the current
    /// snapshot; never triggers a network call
    #[must_use]
    pub fn navigate(&self, path: &str) -> GuardOutcome {
        let outcome = match routes::resolve(path) {
            RouteMatch::Public(_) => GuardOutcome::Allow,
            RouteMatch::Protected(_, requirement) => {
                check(&self.context.snapshot(), requirement, path)
            }
            RouteMatch::Unknown => GuardOutcome::DenyRedirect {
                target: HOME_PATH.to_string(),
                reason: DenyReason::UnknownRoute,
                from: None,
            },
        };

        self.context.emit(SessionEvent::GuardDecision {
            path: path.to_string(),
            outcome: outcome.to_string(),
        });
        outcome
    }
}
