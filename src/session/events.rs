//! Observability hook for session transitions
//!
//! Session code never logs transitions directly. It emits [`SessionEvent`]s to
//! an injected [`SessionObserver`], so tracing can be swapped or disabled
//! without touching the state machine.

use crate::models::SessionState;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    BootstrapStarted { has_credential: bool },
    BootstrapCompleted { state: SessionState },
    BootstrapCancelled,
    ResolutionFailed { reason: String, credential_cleared: bool },
    LoggedIn { email: String },
    LoggedOut,
    Unauthorized,
    CallbackReceived { has_token: bool },
    CallbackCompleted { redirect_to: String },
    CallbackFailed { reason: String },
    GuardDecision { path: String, outcome: String },
}

pub trait SessionObserver: Send + Sync {
    fn on_event(&self, event: &SessionEvent, at: DateTime<Utc>);
}

/// Observer writing transitions through the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl SessionObserver for LogObserver {
    fn on_event(&self, event: &SessionEvent, at: DateTime<Utc>) {
        let at = at.to_rfc3339();
        match event {
            SessionEvent::BootstrapStarted { has_credential } => {
                debug!("[{at}] ⏳ bootstrap started (stored credential: {has_credential})");
            }
            SessionEvent::BootstrapCompleted { state } => {
                info!("[{at}] bootstrap completed: {state}");
            }
            SessionEvent::BootstrapCancelled => {
                debug!("[{at}] bootstrap cancelled before resolution finished");
            }
            SessionEvent::ResolutionFailed {
                reason,
                credential_cleared,
            } => {
                warn!(
                    "[{at}] session resolution failed: {reason} \
                     (credential cleared: {credential_cleared})"
                );
            }
            SessionEvent::LoggedIn { email } => info!("[{at}] 🔐 logged in as {email}"),
            SessionEvent::LoggedOut => info!("[{at}] logged out"),
            SessionEvent::Unauthorized => {
                warn!("[{at}] ⛔ backend rejected credential, session ended");
            }
            SessionEvent::CallbackReceived { has_token } => {
                debug!("[{at}] 🔄 callback received (token present: {has_token})");
            }
            SessionEvent::CallbackCompleted { redirect_to } => {
                info!("[{at}] ✅ callback completed, continuing to {redirect_to}");
            }
            SessionEvent::CallbackFailed { reason } => {
                warn!("[{at}] 💥 callback failed: {reason}");
            }
            SessionEvent::GuardDecision { path, outcome } => {
                debug!("[{at}] 🛡️ {path}: {outcome}");
            }
        }
    }
}

/// Observer that discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SessionObserver for NoopObserver {
    fn on_event(&self, _event: &SessionEvent, _at: DateTime<Utc>) {}
}
