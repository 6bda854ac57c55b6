//! Flow handlers driven by navigation
//!
//! - [`callback`] - completes login when the identity provider redirects back

pub mod callback;

pub use callback::{CallbackHandler, CallbackValidator, ValidatedCallback};
