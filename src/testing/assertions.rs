//! Assertion helpers for session snapshots and guard outcomes

use crate::models::{SessionSnapshot, SessionState};
use crate::routing::{DenyReason, GuardOutcome};
use crate::storage::TokenStore;

/// Assert that the snapshot is in the expected state
///
/// # Panics
///
/// Panics if the snapshot's state differs from `expected`.
pub fn assert_session_state(snapshot: &SessionSnapshot, expected: SessionState) {
    assert_eq!(
        snapshot.state(),
        expected,
        "Expected session state {expected}, got {snapshot:?}"
    );
}

/// Assert that the snapshot holds a user with the given email
///
/// # Panics
///
/// Panics if the snapshot is anonymous or holds a different user.
pub fn assert_signed_in_as(snapshot: &SessionSnapshot, email: &str) {
    match snapshot.user() {
        Some(user) => assert_eq!(user.email, email, "Signed in as the wrong user"),
        None => panic!("Expected a user signed in as {email}, got {snapshot:?}"),
    }
}

/// Assert that the store holds exactly `token`
///
/// # Panics
///
/// Panics if the store is empty or holds another credential.
pub fn assert_stored_token(store: &dyn TokenStore, token: &str) {
    match store.get() {
        Some(credential) => assert_eq!(credential.as_str(), token, "Unexpected stored credential"),
        None => panic!("Expected credential {token} in the store, found none"),
    }
}

/// Assert that the store holds no credential
///
/// # Panics
///
/// Panics if a credential is stored.
pub fn assert_store_empty(store: &dyn TokenStore) {
    assert!(
        store.get().is_none(),
        "Expected an empty store, found {:?}",
        store.get()
    );
}

/// Assert that the outcome redirects to `target` for `reason`
///
/// # Panics
///
/// Panics if the outcome is not a redirect with that target and reason.
pub fn assert_redirects(outcome: &GuardOutcome, target: &str, reason: DenyReason) {
    match outcome {
        GuardOutcome::DenyRedirect {
            target: actual,
            reason: actual_reason,
            ..
        } => {
            assert_eq!(actual, target, "Redirect target mismatch");
            assert_eq!(*actual_reason, reason, "Redirect reason mismatch");
        }
        other => panic!("Expected redirect to {target}, got {other}"),
    }
}
