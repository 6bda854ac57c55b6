//! Identity-provider callback handler
//!
//! Entered once, right after the identity provider redirects back to
//! `/auth/callback?token=<credential>`. The flow is strictly sequential:
//!
//! 1. extract the credential from the location's query
//! 2. persist it, so the resolution request is authenticated
//! 3. resolve the session to a user profile
//! 4. log the session in
//! 5. navigate to the default protected view, replacing the callback entry
//!
//! Any failure clears the stored credential and replaces the callback entry
//! with the login view. Re-entering with a consumed URL (no token) takes the
//! same failure path.

use crate::models::{Credential, UserProfile};
use crate::routing::{HistoryMode, Navigator, HOME_PATH, LOGIN_PATH};
use crate::session::{SessionContext, SessionError, SessionEvent};
use crate::utils::logging::LoggingHelper;
use crate::utils::redirect_validator::sanitize_return_path;
use std::sync::Arc;
use url::Url;

/// Query parameter carrying the credential
pub const TOKEN_PARAM: &str = "token";
/// Optional query parameter carrying the post-login return path
pub const REDIRECT_PARAM: &str = "redirect";

// locations are usually relative; this only anchors them for parsing
const LOCATION_BASE: &str = "http://localhost/";

/// Data extracted from a callback location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCallback {
    pub token: Credential,
    /// Validated return path, `/` when absent or rejected
    pub redirect_to: String,
}

/// Callback validator with structured extraction steps
pub struct CallbackValidator;

impl CallbackValidator {
    /// Extract the credential and return path from a callback location
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::MissingCallbackToken`] if the location cannot
    /// be parsed or carries no non-empty `token` parameter
    pub fn validate_and_extract(location: &str) -> Result<ValidatedCallback, SessionError> {
        let url = Self::parse_location(location)?;

        let token = Self::extract_token(&url);
        LoggingHelper::log_callback_received(url.path(), token.as_ref());
        let token = token.ok_or(SessionError::MissingCallbackToken)?;

        let requested = url
            .query_pairs()
            .find(|(key, _)| key == REDIRECT_PARAM)
            .map(|(_, value)| value.into_owned());
        let redirect_to = sanitize_return_path(requested.as_deref(), HOME_PATH);

        Ok(ValidatedCallback { token, redirect_to })
    }

    fn parse_location(location: &str) -> Result<Url, SessionError> {
        Url::parse(location)
            .or_else(|_| Url::parse(LOCATION_BASE).and_then(|base| base.join(location)))
            .map_err(|_| SessionError::MissingCallbackToken)
    }

    fn extract_token(url: &Url) -> Option<Credential> {
        url.query_pairs()
            .find(|(key, _)| key == TOKEN_PARAM)
            .and_then(|(_, value)| Credential::from_raw(Some(&value)))
    }
}

pub struct CallbackHandler {
    context: SessionContext,
    navigator: Arc<dyn Navigator>,
}

impl CallbackHandler {
    #[must_use]
    pub fn new(context: SessionContext, navigator: Arc<dyn Navigator>) -> Self {
        Self { context, navigator }
    }

    /// Run the callback flow for `location` and navigate accordingly
    ///
    /// # Errors
    ///
    /// Returns the failure that sent the user back to the login view. By the
    /// time this returns the failure has already been handled: the stored
    /// credential is cleared and navigation has happened.
    pub async fn handle(&self, location: &str) -> Result<UserProfile, SessionError> {
        match self.authenticate(location).await {
            Ok((profile, redirect_to)) => {
                self.navigator.navigate(&redirect_to, HistoryMode::Replace);
                self.context
                    .emit(SessionEvent::CallbackCompleted { redirect_to });
                Ok(profile)
            }
            Err(error) => {
                if let Err(e) = self.context.token_store().clear() {
                    LoggingHelper::log_storage_failure("clear", &e);
                }
                self.context.emit(SessionEvent::CallbackFailed {
                    reason: error.to_string(),
                });
                self.navigator.navigate(LOGIN_PATH, HistoryMode::Replace);
                Err(error)
            }
        }
    }

    async fn authenticate(&self, location: &str) -> Result<(UserProfile, String), SessionError> {
        let extracted = CallbackValidator::validate_and_extract(location);
        self.context.emit(SessionEvent::CallbackReceived {
            has_token: extracted.is_ok(),
        });
        let ValidatedCallback { token, redirect_to } = extracted?;

        // must land before the resolver runs; it reads the store
        self.context.token_store().set(&token)?;

        let profile = self.context.resolver().resolve().await?;
        self.context.login(token, profile.clone())?;

        Ok((profile, redirect_to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_token_from_relative_location() {
        let callback =
            CallbackValidator::validate_and_extract("/auth/callback?token=abc123").unwrap();

        assert_eq!(callback.token, Credential::new("abc123"));
        assert_eq!(callback.redirect_to, "/");
    }

    #[test]
    fn test_extracts_token_from_absolute_location() {
        let callback = CallbackValidator::validate_and_extract(
            "http://localhost:5173/auth/callback?state=x&token=eyJ.a.b",
        )
        .unwrap();

        assert_eq!(callback.token.as_str(), "eyJ.a.b");
    }

    #[test]
    fn test_token_is_percent_decoded() {
        let callback =
            CallbackValidator::validate_and_extract("/auth/callback?token=a%2Bb%3D").unwrap();
        assert_eq!(callback.token.as_str(), "a+b=");
    }

    #[test]
    fn test_missing_or_blank_token() {
        for location in ["/auth/callback", "/auth/callback?token=", "/auth/callback?tok=abc"] {
            assert!(
                matches!(
                    CallbackValidator::validate_and_extract(location),
                    Err(SessionError::MissingCallbackToken)
                ),
                "{location} should be rejected"
            );
        }
    }

    #[test]
    fn test_return_path_is_validated() {
        let ok = CallbackValidator::validate_and_extract(
            "/auth/callback?token=t&redirect=%2Fadmin%2Fchapters",
        )
        .unwrap();
        assert_eq!(ok.redirect_to, "/admin/chapters");

        let hostile = CallbackValidator::validate_and_extract(
            "/auth/callback?token=t&redirect=https%3A%2F%2Fevil.com",
        )
        .unwrap();
        assert_eq!(hostile.redirect_to, "/");
    }
}
