//! Test fixtures providing pre-built test objects

use crate::api::SessionResolver;
use crate::models::{Role, UserProfile};
use crate::session::SessionContext;
use crate::storage::{MemoryTokenStore, TokenStore};
use std::sync::Arc;

use super::constants::{ADMIN_EMAIL, ADMIN_NAME, MEMBER_EMAIL, MEMBER_NAME};

/// Central fixture provider for all test data
pub struct TestFixtures;

impl TestFixtures {
    #[must_use]
    pub fn member_profile() -> UserProfile {
        let mut profile = UserProfile::new(MEMBER_EMAIL, Some(MEMBER_NAME), Role::Member);
        profile.id = Some(1);
        profile
    }

    #[must_use]
    pub fn admin_profile() -> UserProfile {
        let mut profile = UserProfile::new(ADMIN_EMAIL, Some(ADMIN_NAME), Role::Admin);
        profile.id = Some(2);
        profile
    }

    /// Context over an empty in-memory store
    #[must_use]
    pub fn context(resolver: Arc<dyn SessionResolver>) -> (SessionContext, Arc<MemoryTokenStore>) {
        let store = Arc::new(MemoryTokenStore::new());
        let context = SessionContext::new(store.clone() as Arc<dyn TokenStore>, resolver);
        (context, store)
    }

    /// Context over an in-memory store already holding `token`
    #[must_use]
    pub fn context_with_credential(
        token: &str,
        resolver: Arc<dyn SessionResolver>,
    ) -> (SessionContext, Arc<MemoryTokenStore>) {
        let store = Arc::new(MemoryTokenStore::with_credential(token));
        let context = SessionContext::new(store.clone() as Arc<dyn TokenStore>, resolver);
        (context, store)
    }
}
