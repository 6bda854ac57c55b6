use crate::api::ResolveError;
use crate::storage::StorageError;

/// Failures surfaced by session operations
///
/// Bootstrap converts these into a terminal `Anonymous` state and the
/// callback flow into a redirect to the login view; they are returned to
/// callers for reporting only.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Nothing to resolve; a valid anonymous state rather than a fault
    #[error("no credential stored")]
    NoCredential,

    #[error("session resolution failed: {0}")]
    ResolutionFailed(ResolveError),

    /// The identity-provider redirect carried no `token` parameter
    #[error("callback URL is missing the token parameter")]
    MissingCallbackToken,

    /// The backend answered 401; the credential has been cleared
    #[error("session ended: credential rejected")]
    Unauthorized,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<ResolveError> for SessionError {
    fn from(error: ResolveError) -> Self {
        match error {
            ResolveError::NoCredential => Self::NoCredential,
            ResolveError::Unauthenticated => Self::Unauthorized,
            other => Self::ResolutionFailed(other),
        }
    }
}
