//! Session resolution: "who am I" for the stored credential

use super::client::{ApiClient, ApiError};
use crate::models::UserProfile;
use async_trait::async_trait;
use log::debug;

/// Endpoint returning the profile of the credential's owner
pub const USER_PROFILE_ENDPOINT: &str = "/api/users/me";

/// Why a credential could not be resolved to a profile
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("no credential is stored")]
    NoCredential,

    /// The backend rejected the credential (expired or invalid)
    #[error("credential rejected by the backend")]
    Unauthenticated,

    /// The backend could not be reached
    #[error("network error: {0}")]
    Network(String),

    #[error("backend error: {0}")]
    Backend(String),
}

impl ResolveError {
    /// Transport failures say nothing about the credential's validity
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

impl From<ApiError> for ResolveError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::Unauthorized => Self::Unauthenticated,
            ApiError::Transport { .. } => Self::Network(error.to_string()),
            other => Self::Backend(other.to_string()),
        }
    }
}

/// Resolves the currently stored credential to a [`UserProfile`]
#[async_trait]
pub trait SessionResolver: Send + Sync {
    /// # Errors
    ///
    /// Returns [`ResolveError::Unauthenticated`] when the backend rejects the
    /// credential and [`ResolveError::Network`] on transport failure
    async fn resolve(&self) -> Result<UserProfile, ResolveError>;
}

/// Resolver backed by `GET /api/users/me`
#[derive(Debug, Clone)]
pub struct HttpSessionResolver {
    client: ApiClient,
}

impl HttpSessionResolver {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    #[must_use]
    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}

#[async_trait]
impl SessionResolver for HttpSessionResolver {
    async fn resolve(&self) -> Result<UserProfile, ResolveError> {
        if !self.client.token_store().has_credential() {
            debug!("Skipping profile lookup, no credential stored");
            return Err(ResolveError::NoCredential);
        }

        let profile: UserProfile = self.client.get_json(USER_PROFILE_ENDPOINT).await?;
        debug!("Resolved session for {} ({})", profile.email, profile.role);
        Ok(profile)
    }
}
