//! Backend access
//!
//! - [`client`] - the authenticated request contract shared by every screen
//! - [`resolver`] - turns the stored credential into a user profile

pub mod client;
pub mod resolver;

pub use client::{ApiClient, ApiError, UnauthorizedHook};
pub use resolver::{HttpSessionResolver, ResolveError, SessionResolver, USER_PROFILE_ENDPOINT};
