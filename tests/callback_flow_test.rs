// Integration tests for the identity-provider callback flow and route guard
use coursepilot::api::ResolveError;
use coursepilot::handlers::CallbackHandler;
use coursepilot::models::SessionState;
use coursepilot::routing::{DenyReason, GuardOutcome, MemoryHistory, Navigator, RouteGuard};
use coursepilot::session::{SessionContext, SessionError, SessionEvent};
use coursepilot::storage::{MemoryTokenStore, TokenStore};
use coursepilot::testing::constants::{MEMBER_EMAIL, MEMBER_NAME, TEST_TOKEN};
use coursepilot::testing::{
    assert_redirects, assert_session_state, assert_signed_in_as, assert_store_empty,
    assert_stored_token, MockResolver, RecordingObserver, TestFixtures,
};
use std::sync::Arc;

const CALLBACK_URL: &str = "http://localhost:5173/auth/callback?token=abc123";

async fn settled_context(
    resolver: Arc<MockResolver>,
) -> (SessionContext, Arc<MemoryTokenStore>) {
    let (context, store) = TestFixtures::context(resolver);
    context.bootstrap().await;
    (context, store)
}

#[tokio::test]
async fn test_callback_signs_in_and_lands_on_home() {
    let resolver = Arc::new(MockResolver::returning(TestFixtures::member_profile()));
    let (context, store) = settled_context(resolver.clone()).await;
    let history = Arc::new(MemoryHistory::starting_at("/auth/callback?token=abc123"));
    let handler = CallbackHandler::new(context.clone(), history.clone());

    let user = handler.handle(CALLBACK_URL).await.unwrap();

    assert_eq!(user.display_name(), MEMBER_NAME);
    assert_eq!(resolver.calls(), 1);
    assert_stored_token(store.as_ref(), TEST_TOKEN);
    assert_session_state(&context.snapshot(), SessionState::Authenticated);
    assert_signed_in_as(&context.snapshot(), MEMBER_EMAIL);
    // the callback entry is replaced, not kept in history
    assert_eq!(history.entries(), vec!["/"]);
    assert_eq!(history.current().as_deref(), Some("/"));
}

#[tokio::test]
async fn test_credential_is_stored_before_resolution() {
    let store = Arc::new(MemoryTokenStore::new());
    let resolver = Arc::new(
        MockResolver::returning(TestFixtures::member_profile())
            .observing(store.clone() as Arc<dyn TokenStore>),
    );
    let context = SessionContext::new(store.clone(), resolver.clone());
    context.bootstrap().await;
    let handler = CallbackHandler::new(context, Arc::new(MemoryHistory::new()));

    handler.handle(CALLBACK_URL).await.unwrap();

    let seen = resolver.seen_credentials();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].as_ref().map(|c| c.as_str()), Some(TEST_TOKEN));
}

#[tokio::test]
async fn test_missing_token_returns_to_login() {
    let resolver = Arc::new(MockResolver::returning(TestFixtures::member_profile()));
    let (context, store) = settled_context(resolver.clone()).await;
    let history = Arc::new(MemoryHistory::starting_at("/auth/callback"));
    let handler = CallbackHandler::new(context.clone(), history.clone());

    let result = handler.handle("http://localhost:5173/auth/callback").await;

    assert!(matches!(result, Err(SessionError::MissingCallbackToken)));
    assert_eq!(resolver.calls(), 0);
    assert_store_empty(store.as_ref());
    assert_session_state(&context.snapshot(), SessionState::Anonymous);
    assert_eq!(history.entries(), vec!["/login"]);
}

#[tokio::test]
async fn test_failed_resolution_clears_credential() {
    let observer = Arc::new(RecordingObserver::new());
    let store = Arc::new(MemoryTokenStore::new());
    let resolver = Arc::new(MockResolver::failing(ResolveError::Unauthenticated));
    let context = SessionContext::builder(store.clone(), resolver)
        .observer(observer.clone())
        .build();
    context.bootstrap().await;
    let history = Arc::new(MemoryHistory::new());
    let handler = CallbackHandler::new(context.clone(), history.clone());

    let result = handler.handle(CALLBACK_URL).await;

    assert!(matches!(
        result,
        Err(SessionError::Unauthorized)
    ));
    assert_store_empty(store.as_ref());
    assert_session_state(&context.snapshot(), SessionState::Anonymous);
    assert_eq!(history.current().as_deref(), Some("/login"));
    assert!(observer.saw(|event| matches!(event, SessionEvent::CallbackFailed { .. })));
}

#[tokio::test]
async fn test_unreachable_backend_fails_callback() {
    let resolver = Arc::new(MockResolver::failing(ResolveError::Network(
        "connection refused".to_string(),
    )));
    let (context, store) = settled_context(resolver).await;
    let history = Arc::new(MemoryHistory::new());
    let handler = CallbackHandler::new(context, history.clone());

    let result = handler.handle(CALLBACK_URL).await;

    assert!(matches!(
        result,
        Err(SessionError::ResolutionFailed(ResolveError::Network(_)))
    ));
    assert_store_empty(store.as_ref());
    assert_eq!(history.current().as_deref(), Some("/login"));
}

#[tokio::test]
async fn test_reentry_with_consumed_url_fails_cleanly() {
    let resolver = Arc::new(MockResolver::returning(TestFixtures::member_profile()));
    let (context, store) = settled_context(resolver.clone()).await;
    let history = Arc::new(MemoryHistory::new());
    let handler = CallbackHandler::new(context.clone(), history.clone());

    handler.handle(CALLBACK_URL).await.unwrap();
    let again = handler.handle("/auth/callback").await;

    assert!(matches!(again, Err(SessionError::MissingCallbackToken)));
    assert_eq!(resolver.calls(), 1);
    assert_store_empty(store.as_ref());
    assert_eq!(history.current().as_deref(), Some("/login"));
}

#[tokio::test]
async fn test_callback_honours_safe_return_path() {
    let resolver = Arc::new(MockResolver::returning(TestFixtures::member_profile()));
    let (context, _store) = settled_context(resolver).await;
    let history = Arc::new(MemoryHistory::new());
    let handler = CallbackHandler::new(context, history.clone());

    handler
        .handle("/auth/callback?token=abc123&redirect=%2Fhistory")
        .await
        .unwrap();
    assert_eq!(history.current().as_deref(), Some("/history"));

    handler
        .handle("/auth/callback?token=abc123&redirect=%2F%2Fevil.com")
        .await
        .unwrap();
    assert_eq!(history.current().as_deref(), Some("/"));
}

#[tokio::test]
async fn test_guard_follows_session_through_login_flow() {
    let resolver = Arc::new(MockResolver::returning(TestFixtures::member_profile()));
    let (context, _store) = TestFixtures::context(resolver);
    let guard = RouteGuard::new(context.clone());

    assert_eq!(guard.navigate("/history"), GuardOutcome::Pending);
    context.bootstrap().await;

    let denied = guard.navigate("/history");
    assert_redirects(&denied, "/login", DenyReason::Unauthenticated);
    assert_eq!(
        denied.redirect_location().as_deref(),
        Some("/login?redirect=%2Fhistory")
    );
    assert!(guard.navigate("/login").is_allowed());

    CallbackHandler::new(context.clone(), Arc::new(MemoryHistory::new()))
        .handle(CALLBACK_URL)
        .await
        .unwrap();

    assert!(guard.navigate("/history").is_allowed());
    assert_redirects(&guard.navigate("/admin"), "/", DenyReason::NotAdmin);
    assert_redirects(&guard.navigate("/nowhere"), "/", DenyReason::UnknownRoute);
}

#[tokio::test]
async fn test_admin_reaches_admin_views() {
    let resolver = Arc::new(MockResolver::returning(TestFixtures::admin_profile()));
    let (context, _store) = TestFixtures::context_with_credential(TEST_TOKEN, resolver);
    context.bootstrap().await;
    let guard = RouteGuard::new(context);

    assert!(guard.navigate("/admin").is_allowed());
    assert!(guard.navigate("/admin/chapters").is_allowed());
}
