//! Session Context - the owner of the session snapshot
//!
//! ## State machine
//!
//! ```text
//! Bootstrapping ──resolve ok──▶ Authenticated ◀──login── Anonymous
//!       │                            │                      ▲
//!       └──no credential / failure───┴────────logout────────┘
//! ```
//!
//! `is_loading` is true only while bootstrapping and flips to false exactly
//! once. Every mutation of the stored credential and the snapshot happens
//! under the snapshot channel's lock, and `login`/`logout` bump a generation
//! counter so a bootstrap result that arrives late cannot undo them.

use crate::api::{ResolveError, SessionResolver, UnauthorizedHook};
use crate::models::{Credential, SessionSnapshot, SessionState, UserProfile};
use crate::session::errors::SessionError;
use crate::session::events::{LogObserver, SessionEvent, SessionObserver};
use crate::storage::TokenStore;
use crate::utils::logging::LoggingHelper;
use chrono::Utc;
use log::warn;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;

struct Inner {
    store: Arc<dyn TokenStore>,
    resolver: Arc<dyn SessionResolver>,
    observer: Arc<dyn SessionObserver>,
    snapshot: watch::Sender<SessionSnapshot>,
    bootstrap_started: AtomicBool,
    generation: AtomicU64,
    keep_token_on_network_error: bool,
}

/// Shared handle to one session; clones observe and mutate the same state
#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("snapshot", &*self.inner.snapshot.borrow())
            .finish_non_exhaustive()
    }
}

pub struct SessionContextBuilder {
    store: Arc<dyn TokenStore>,
    resolver: Arc<dyn SessionResolver>,
    observer: Arc<dyn SessionObserver>,
    keep_token_on_network_error: bool,
}

impl SessionContextBuilder {
    /// Replace the default log-backed observer
    #[must_use]
    pub fn observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Keep the stored credential when bootstrap resolution fails with a
    /// transport error instead of clearing it
    #[must_use]
    pub fn keep_token_on_network_error(mut self, keep: bool) -> Self {
        self.keep_token_on_network_error = keep;
        self
    }

    #[must_use]
    pub fn build(self) -> SessionContext {
        let (snapshot, _) = watch::channel(SessionSnapshot::bootstrapping());
        SessionContext {
            inner: Arc::new(Inner {
                store: self.store,
                resolver: self.resolver,
                observer: self.observer,
                snapshot,
                bootstrap_started: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                keep_token_on_network_error: self.keep_token_on_network_error,
            }),
        }
    }
}

// =============================================================================
// Construction and access
// =============================================================================

impl SessionContext {
    #[must_use]
    pub fn builder(
        store: Arc<dyn TokenStore>,
        resolver: Arc<dyn SessionResolver>,
    ) -> SessionContextBuilder {
        SessionContextBuilder {
            store,
            resolver,
            observer: Arc::new(LogObserver),
            keep_token_on_network_error: false,
        }
    }

    #[must_use]
    pub fn new(store: Arc<dyn TokenStore>, resolver: Arc<dyn SessionResolver>) -> Self {
        Self::builder(store, resolver).build()
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.snapshot.borrow().clone()
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.snapshot.borrow().state()
    }

    /// Receiver notified on every snapshot change
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.snapshot.subscribe()
    }

    #[must_use]
    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        &self.inner.store
    }

    #[must_use]
    pub fn resolver(&self) -> &Arc<dyn SessionResolver> {
        &self.inner.resolver
    }

    /// Wait for bootstrap to finish and return the settled snapshot
    pub async fn ready(&self) -> SessionSnapshot {
        let mut receiver = self.subscribe();
        let settled = match receiver.wait_for(|snapshot| !snapshot.is_loading()).await {
            Ok(snapshot) => snapshot.clone(),
            // the sender lives in `self`, so the channel cannot close here
            Err(_) => self.snapshot(),
        };
        settled
    }

    pub(crate) fn emit(&self, event: SessionEvent) {
        self.inner.observer.on_event(&event, Utc::now());
    }
}

// =============================================================================
// Bootstrap
// =============================================================================

impl SessionContext {
    /// Resolve the stored credential once and leave the loading state
    ///
    /// Only the first call does any work; later calls return immediately.
    /// A bootstrap cancelled by unmounting does not count.
    pub async fn bootstrap(&self) {
        self.run_bootstrap(None).await;
    }

    /// Start bootstrap in the background, tied to the returned handle
    ///
    /// Dropping the handle before resolution finishes abandons the result,
    /// leaving the snapshot untouched. A later `mount` resolves again.
    #[must_use]
    pub fn mount(&self) -> MountHandle {
        let cancel = Arc::new(Notify::new());
        let signal = Arc::clone(&cancel);
        let context = self.clone();
        let task = tokio::spawn(async move { context.run_bootstrap(Some(signal)).await });
        MountHandle {
            cancel,
            task: Some(task),
        }
    }

    async fn run_bootstrap(&self, cancel: Option<Arc<Notify>>) {
        if self.inner.bootstrap_started.swap(true, Ordering::SeqCst) {
            return;
        }

        let generation = self.inner.generation.load(Ordering::SeqCst);
        let has_credential = self.inner.store.has_credential();
        self.emit(SessionEvent::BootstrapStarted { has_credential });

        if !has_credential {
            self.finish_bootstrap(generation, None);
            return;
        }

        let resolution = match cancel {
            Some(cancel) => tokio::select! {
                result = self.inner.resolver.resolve() => result,
                () = cancel.notified() => {
                    // nothing was applied; let the next mount resolve again
                    self.inner.bootstrap_started.store(false, Ordering::SeqCst);
                    self.emit(SessionEvent::BootstrapCancelled);
                    return;
                }
            },
            None => self.inner.resolver.resolve().await,
        };

        self.finish_bootstrap(generation, Some(resolution));
    }

    fn finish_bootstrap(
        &self,
        generation: u64,
        resolution: Option<Result<UserProfile, ResolveError>>,
    ) {
        let mut failure = None;

        self.inner.snapshot.send_modify(|snapshot| {
            let superseded = self.inner.generation.load(Ordering::SeqCst) != generation;
            match resolution {
                Some(Ok(profile)) if !superseded => snapshot.set_user(Some(profile)),
                Some(Err(error)) => {
                    let keep = superseded
                        || (self.inner.keep_token_on_network_error && error.is_network());
                    if !keep {
                        if let Err(e) = self.inner.store.clear() {
                            LoggingHelper::log_storage_failure("clear", &e);
                        }
                    }
                    if !superseded {
                        snapshot.set_user(None);
                    }
                    failure = Some((error, !keep));
                }
                _ => {}
            }
            snapshot.finish_loading();
        });

        if let Some((error, credential_cleared)) = failure {
            self.emit(SessionEvent::ResolutionFailed {
                reason: error.to_string(),
                credential_cleared,
            });
        }
        self.emit(SessionEvent::BootstrapCompleted {
            state: self.state(),
        });
    }
}

// =============================================================================
// Transitions
// =============================================================================

impl SessionContext {
    /// Store the credential and mark the session authenticated
    ///
    /// No network call is made; the caller supplies the resolved profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the credential cannot be persisted, in which case
    /// the snapshot is left unchanged
    pub fn login(&self, credential: Credential, profile: UserProfile) -> Result<(), SessionError> {
        let email = profile.email.clone();
        let mut stored = Ok(());

        self.inner.snapshot.send_if_modified(|snapshot| {
            if let Err(e) = self.inner.store.set(&credential) {
                stored = Err(e);
                return false;
            }
            self.inner.generation.fetch_add(1, Ordering::SeqCst);
            snapshot.set_user(Some(profile));
            true
        });

        stored?;
        self.emit(SessionEvent::LoggedIn { email });
        Ok(())
    }

    /// Clear the credential and drop the user; safe to call when anonymous
    ///
    /// # Errors
    ///
    /// Returns an error if the stored credential could not be removed. The
    /// in-memory session is cleared regardless.
    pub fn logout(&self) -> Result<(), SessionError> {
        let mut cleared = Ok(());

        self.inner.snapshot.send_if_modified(|snapshot| {
            cleared = self.inner.store.clear();
            self.inner.generation.fetch_add(1, Ordering::SeqCst);
            let was_authenticated = snapshot.is_authenticated();
            snapshot.set_user(None);
            was_authenticated
        });

        self.emit(SessionEvent::LoggedOut);
        cleared.map_err(SessionError::from)
    }

    /// React to a 401 observed by any backend call
    ///
    /// The API client has already cleared the stored credential; this drops
    /// the in-memory user so guards send the user back to the login view.
    pub fn handle_unauthorized(&self) {
        let ended = self.inner.snapshot.send_if_modified(|snapshot| {
            if snapshot.is_loading() || !snapshot.is_authenticated() {
                return false;
            }
            self.inner.generation.fetch_add(1, Ordering::SeqCst);
            snapshot.set_user(None);
            true
        });

        if ended {
            self.emit(SessionEvent::Unauthorized);
        }
    }

    /// Hook for [`crate::api::ApiClient::set_unauthorized_hook`]
    ///
    /// Holds only a weak reference, so the client never keeps the session alive.
    #[must_use]
    pub fn unauthorized_hook(&self) -> UnauthorizedHook {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        Arc::new(move || {
            if let Some(inner) = weak.upgrade() {
                SessionContext { inner }.handle_unauthorized();
            }
        })
    }
}

/// Ties a background bootstrap to the lifetime of its mount point
pub struct MountHandle {
    cancel: Arc<Notify>,
    task: Option<JoinHandle<()>>,
}

impl MountHandle {
    /// Wait for the background bootstrap to finish
    pub async fn ready(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Session bootstrap task failed: {e}");
            }
        }
    }

    /// Unmount; an unfinished bootstrap will not touch the session
    pub fn unmount(self) {
        drop(self);
    }
}

impl Drop for MountHandle {
    fn drop(&mut self) {
        self.cancel.notify_one();
    }
}
