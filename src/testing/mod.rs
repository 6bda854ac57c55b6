//! Unified testing utilities for coursepilot
//!
//! Available to unit tests and, behind the `testing` feature, to the
//! integration tests under `tests/`.
//!
//! - [`fixtures`] - pre-built profiles, stores and contexts
//! - [`mock`] - scripted resolver and a recording observer
//! - [`assertions`] - assertion helpers for snapshots and guard outcomes
//!
//! ## Usage
//!
//! ```rust,ignore
//! use coursepilot::testing::{fixtures::TestFixtures, mock::MockResolver};
//! use std::sync::Arc;
//!
//! let resolver = Arc::new(MockResolver::returning(TestFixtures::member_profile()));
//! let (context, store) = TestFixtures::context_with_credential("abc123", resolver.clone());
//! assert!(store.get().is_some());
//! assert!(context.snapshot().is_loading());
//! ```

pub mod assertions;
pub mod fixtures;
pub mod mock;

pub use assertions::*;
pub use fixtures::TestFixtures;
pub use mock::{MockResolver, RecordingObserver};

/// Common test constants
pub mod constants {
    /// Credential handed out by the fake identity provider
    pub const TEST_TOKEN: &str = "abc123";

    /// Member test user
    pub const MEMBER_EMAIL: &str = "ada@x.com";
    pub const MEMBER_NAME: &str = "Ada";

    /// Admin test user
    pub const ADMIN_EMAIL: &str = "grace@x.com";
    pub const ADMIN_NAME: &str = "Grace";
}
