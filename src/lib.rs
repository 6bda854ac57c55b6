#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the coursepilot client core
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod api;
pub mod handlers;
pub mod models;
pub mod routing;
pub mod session;
pub mod settings;
pub mod storage;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use api::{ApiClient, ApiError, HttpSessionResolver, ResolveError, SessionResolver};
pub use handlers::CallbackHandler;
pub use models::{Credential, Role, SessionSnapshot, SessionState, UserProfile};
pub use routing::{GuardOutcome, GuardRequirement, RouteGuard};
pub use session::{SessionContext, SessionError};
pub use settings::CoursepilotSettings;
pub use storage::{FileTokenStore, MemoryTokenStore, TokenStore};
