//! Session Management Module
//!
//! - [`context`] - the session state machine and its snapshot broadcast
//! - [`events`] - observability hook for session transitions
//! - [`errors`] - session error taxonomy

pub mod context;
pub mod errors;
pub mod events;

pub use context::{MountHandle, SessionContext, SessionContextBuilder};
pub use errors::SessionError;
pub use events::{LogObserver, NoopObserver, SessionEvent, SessionObserver};
