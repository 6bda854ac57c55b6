// Integration tests for session bootstrap, login/logout and mount lifetime
use coursepilot::api::ResolveError;
use coursepilot::models::{Credential, SessionState};
use coursepilot::session::{SessionContext, SessionEvent};
use coursepilot::storage::{MemoryTokenStore, TokenStore};
use coursepilot::testing::constants::{ADMIN_EMAIL, MEMBER_EMAIL, TEST_TOKEN};
use coursepilot::testing::{
    assert_session_state, assert_signed_in_as, assert_store_empty, assert_stored_token,
    MockResolver, RecordingObserver, TestFixtures,
};
use std::sync::Arc;
use std::time::Duration;

fn observed_context(
    store: Arc<MemoryTokenStore>,
    resolver: Arc<MockResolver>,
    keep_token_on_network_error: bool,
) -> (SessionContext, Arc<RecordingObserver>) {
    let observer = Arc::new(RecordingObserver::new());
    let context = SessionContext::builder(store, resolver)
        .observer(observer.clone())
        .keep_token_on_network_error(keep_token_on_network_error)
        .build();
    (context, observer)
}

#[tokio::test]
async fn test_bootstrap_without_credential_makes_no_call() {
    let resolver = Arc::new(MockResolver::returning(TestFixtures::member_profile()));
    let (context, _store) = TestFixtures::context(resolver.clone());

    assert!(context.snapshot().is_loading());
    context.bootstrap().await;

    assert_eq!(resolver.calls(), 0);
    let snapshot = context.snapshot();
    assert!(!snapshot.is_loading());
    assert_session_state(&snapshot, SessionState::Anonymous);
}

#[tokio::test]
async fn test_bootstrap_with_valid_credential() {
    let resolver = Arc::new(MockResolver::returning(TestFixtures::member_profile()));
    let (context, store) = TestFixtures::context_with_credential(TEST_TOKEN, resolver.clone());

    context.bootstrap().await;

    assert_eq!(resolver.calls(), 1);
    let snapshot = context.snapshot();
    assert_session_state(&snapshot, SessionState::Authenticated);
    assert_signed_in_as(&snapshot, MEMBER_EMAIL);
    assert!(!snapshot.is_admin());
    assert_stored_token(store.as_ref(), TEST_TOKEN);
}

#[tokio::test]
async fn test_rejected_credential_is_cleared() {
    let store = Arc::new(MemoryTokenStore::with_credential(TEST_TOKEN));
    let resolver = Arc::new(MockResolver::failing(ResolveError::Unauthenticated));
    let (context, observer) = observed_context(store.clone(), resolver, false);

    context.bootstrap().await;

    assert_session_state(&context.snapshot(), SessionState::Anonymous);
    assert_store_empty(store.as_ref());
    assert!(observer.saw(|event| matches!(
        event,
        SessionEvent::ResolutionFailed { credential_cleared: true, .. }
    )));
}

#[tokio::test]
async fn test_network_failure_clears_credential_by_default() {
    let store = Arc::new(MemoryTokenStore::with_credential(TEST_TOKEN));
    let resolver = Arc::new(MockResolver::failing(ResolveError::Network(
        "connection refused".to_string(),
    )));
    let (context, _observer) = observed_context(store.clone(), resolver, false);

    context.bootstrap().await;

    assert_session_state(&context.snapshot(), SessionState::Anonymous);
    assert_store_empty(store.as_ref());
}

#[tokio::test]
async fn test_network_failure_can_keep_credential() {
    let store = Arc::new(MemoryTokenStore::with_credential(TEST_TOKEN));
    let resolver = Arc::new(MockResolver::failing(ResolveError::Network(
        "connection refused".to_string(),
    )));
    let (context, observer) = observed_context(store.clone(), resolver, true);

    context.bootstrap().await;

    assert_session_state(&context.snapshot(), SessionState::Anonymous);
    assert_stored_token(store.as_ref(), TEST_TOKEN);
    assert!(observer.saw(|event| matches!(
        event,
        SessionEvent::ResolutionFailed { credential_cleared: false, .. }
    )));
}

#[tokio::test]
async fn test_keep_option_still_clears_rejected_credential() {
    let store = Arc::new(MemoryTokenStore::with_credential(TEST_TOKEN));
    let resolver = Arc::new(MockResolver::failing(ResolveError::Unauthenticated));
    let (context, _observer) = observed_context(store.clone(), resolver, true);

    context.bootstrap().await;

    assert_store_empty(store.as_ref());
}

#[tokio::test]
async fn test_login_then_logout() {
    let resolver = Arc::new(MockResolver::returning(TestFixtures::member_profile()));
    let (context, store) = TestFixtures::context(resolver);
    context.bootstrap().await;

    context
        .login(Credential::new(TEST_TOKEN), TestFixtures::admin_profile())
        .unwrap();
    assert_signed_in_as(&context.snapshot(), ADMIN_EMAIL);
    assert!(context.snapshot().is_admin());
    assert_stored_token(store.as_ref(), TEST_TOKEN);

    context.logout().unwrap();
    assert_session_state(&context.snapshot(), SessionState::Anonymous);
    assert_store_empty(store.as_ref());
}

#[tokio::test]
async fn test_logout_is_idempotent() {
    let resolver = Arc::new(MockResolver::returning(TestFixtures::member_profile()));
    let (context, store) = TestFixtures::context(resolver);
    context.bootstrap().await;

    context.logout().unwrap();
    context.logout().unwrap();

    assert_session_state(&context.snapshot(), SessionState::Anonymous);
    assert_store_empty(store.as_ref());
}

#[tokio::test]
async fn test_subscribers_see_bootstrap_result() {
    let resolver = Arc::new(MockResolver::returning(TestFixtures::member_profile()));
    let (context, _store) = TestFixtures::context_with_credential(TEST_TOKEN, resolver);
    let mut receiver = context.subscribe();

    context.bootstrap().await;

    assert!(receiver.has_changed().unwrap());
    let snapshot = receiver.borrow_and_update().clone();
    assert_session_state(&snapshot, SessionState::Authenticated);
}

#[tokio::test]
async fn test_mounted_bootstrap_settles() {
    let resolver = Arc::new(MockResolver::returning(TestFixtures::member_profile()));
    let (context, _store) = TestFixtures::context_with_credential(TEST_TOKEN, resolver);

    let _handle = context.mount();
    let snapshot = context.ready().await;

    assert!(!snapshot.is_loading());
    assert_signed_in_as(&snapshot, MEMBER_EMAIL);
}

#[tokio::test]
async fn test_unmount_abandons_pending_resolution() {
    let resolver = Arc::new(
        MockResolver::returning(TestFixtures::member_profile())
            .with_delay(Duration::from_millis(200)),
    );
    let (context, store) = TestFixtures::context_with_credential(TEST_TOKEN, resolver);

    let handle = context.mount();
    handle.unmount();
    tokio::time::sleep(Duration::from_millis(400)).await;

    let snapshot = context.snapshot();
    assert!(snapshot.is_loading());
    assert!(snapshot.user().is_none());
    assert_stored_token(store.as_ref(), TEST_TOKEN);
}

#[tokio::test]
async fn test_remount_after_unmount_settles() {
    let resolver = Arc::new(
        MockResolver::returning(TestFixtures::member_profile())
            .with_delay(Duration::from_millis(100)),
    );
    let (context, _store) =
        TestFixtures::context_with_credential(TEST_TOKEN, resolver.clone());

    let first = context.mount();
    tokio::task::yield_now().await;
    first.unmount();
    let _second = context.mount();

    let snapshot = tokio::time::timeout(Duration::from_secs(2), context.ready())
        .await
        .expect("remounted session should settle");

    assert!(!snapshot.is_loading());
    assert_signed_in_as(&snapshot, MEMBER_EMAIL);
    assert_eq!(resolver.calls(), 2);
}

#[tokio::test]
async fn test_logout_during_bootstrap_wins() {
    let resolver = Arc::new(
        MockResolver::returning(TestFixtures::member_profile())
            .with_delay(Duration::from_millis(100)),
    );
    let (context, store) = TestFixtures::context_with_credential(TEST_TOKEN, resolver);

    let mut handle = context.mount();
    tokio::time::sleep(Duration::from_millis(20)).await;
    context.logout().unwrap();
    handle.ready().await;

    let snapshot = context.snapshot();
    assert!(!snapshot.is_loading());
    assert_session_state(&snapshot, SessionState::Anonymous);
    assert!(store.get().is_none());
}

#[tokio::test]
async fn test_login_during_bootstrap_is_not_overwritten() {
    let resolver = Arc::new(
        MockResolver::failing(ResolveError::Unauthenticated)
            .with_delay(Duration::from_millis(100)),
    );
    let (context, store) = TestFixtures::context_with_credential("stale", resolver);

    let mut handle = context.mount();
    tokio::time::sleep(Duration::from_millis(20)).await;
    context
        .login(Credential::new(TEST_TOKEN), TestFixtures::member_profile())
        .unwrap();
    handle.ready().await;

    assert_signed_in_as(&context.snapshot(), MEMBER_EMAIL);
    assert_stored_token(store.as_ref(), TEST_TOKEN);
}
