//! Mock objects and fake implementations for testing
//!
//! [`MockResolver`] stands in for the backend's profile endpoint and records
//! how it was used; [`RecordingObserver`] captures emitted session events.

use crate::api::{ResolveError, SessionResolver};
use crate::models::{Credential, UserProfile};
use crate::session::{SessionEvent, SessionObserver};
use crate::storage::TokenStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Scripted [`SessionResolver`]
pub struct MockResolver {
    outcome: Result<UserProfile, ResolveError>,
    delay: Option<Duration>,
    store: Option<Arc<dyn TokenStore>>,
    calls: AtomicUsize,
    seen: Mutex<Vec<Option<Credential>>>,
}

impl MockResolver {
    /// Resolver that always yields `profile`
    #[must_use]
    pub fn returning(profile: UserProfile) -> Self {
        Self::with_outcome(Ok(profile))
    }

    /// Resolver that always fails with `error`
    #[must_use]
    pub fn failing(error: ResolveError) -> Self {
        Self::with_outcome(Err(error))
    }

    fn with_outcome(outcome: Result<UserProfile, ResolveError>) -> Self {
        Self {
            outcome,
            delay: None,
            store: None,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Sleep for `delay` before answering
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Record the credential held by `store` at the moment each call starts
    #[must_use]
    pub fn observing(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Number of resolutions started
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Credentials seen by each call, when observing a store
    #[must_use]
    pub fn seen_credentials(&self) -> Vec<Option<Credential>> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl SessionResolver for MockResolver {
    async fn resolve(&self) -> Result<UserProfile, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(store) = &self.store {
            self.seen
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(store.get());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcome.clone()
    }
}

/// Observer keeping every event it receives, in order
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<SessionEvent>>,
}

impl RecordingObserver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> Vec<SessionEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether any recorded event satisfies `predicate`
    pub fn saw(&self, predicate: impl Fn(&SessionEvent) -> bool) -> bool {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(predicate)
    }
}

impl SessionObserver for RecordingObserver {
    fn on_event(&self, event: &SessionEvent, _at: DateTime<Utc>) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
