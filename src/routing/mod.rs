//! Navigation and route protection
//!
//! - [`guard`] - the decision consulted before rendering a protected view
//! - [`routes`] - the route table
//! - [`navigator`] - history abstraction used for redirects

pub mod guard;
pub mod navigator;
pub mod routes;

pub use guard::{check, DenyReason, GuardOutcome, GuardRequirement, RouteGuard};
pub use navigator::{HistoryMode, MemoryHistory, Navigator};
pub use routes::{resolve, Route, RouteMatch, CALLBACK_PATH, HOME_PATH, LOGIN_PATH};
