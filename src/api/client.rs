//! Authenticated HTTP client for the course-assistant backend
//!
//! Every request goes through [`ApiClient::request`], which implements the
//! backend contract shared by all screens:
//!
//! - the stored credential is attached as `Authorization: Bearer <credential>`
//! - a `401` from any endpoint clears the stored credential, unless it was
//!   replaced while the request was in flight, and yields
//!   [`ApiError::Unauthorized`]; prompting re-login is left to the caller
//! - a `204` yields `Ok(None)`
//! - other non-success statuses carry the body's `detail` message when present

use crate::models::Credential;
use crate::settings::ApiSettings;
use crate::storage::TokenStore;
use crate::utils::logging::LoggingHelper;
use log::debug;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use url::Url;

const DEFAULT_ERROR_DETAIL: &str = "API request failed";

/// Callback fired after a 401 has cleared the stored credential
pub type UnauthorizedHook = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("unauthorized: please sign in again")]
    Unauthorized,

    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned {status}: {detail}")]
    Status {
        endpoint: String,
        status: u16,
        detail: String,
    },

    #[error("invalid response body from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{endpoint} returned no content where a body was expected")]
    EmptyBody { endpoint: String },

    #[error("invalid API URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    store: Arc<dyn TokenStore>,
    // shared by all clones so a hook installed later reaches every copy
    on_unauthorized: Arc<OnceLock<UnauthorizedHook>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("has_unauthorized_hook", &self.on_unauthorized.get().is_some())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for the given backend origin
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not a valid URL or the HTTP client
    /// cannot be constructed
    pub fn new(
        base_url: &str,
        timeout: Duration,
        store: Arc<dyn TokenStore>,
    ) -> Result<Self, ApiError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|source| ApiError::InvalidUrl {
            url: base_url.clone(),
            source,
        })?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::Client)?;

        Ok(Self {
            http,
            base_url,
            store,
            on_unauthorized: Arc::new(OnceLock::new()),
        })
    }

    /// # Errors
    ///
    /// See [`ApiClient::new`]
    pub fn from_settings(
        settings: &ApiSettings,
        store: Arc<dyn TokenStore>,
    ) -> Result<Self, ApiError> {
        Self::new(
            &settings.base_url,
            Duration::from_secs(settings.timeout_secs),
            store,
        )
    }

    /// Install the hook run after a 401; only the first installation wins
    ///
    /// Returns `false` if a hook was already installed.
    pub fn set_unauthorized_hook(&self, hook: UnauthorizedHook) -> bool {
        self.on_unauthorized.set(hook).is_ok()
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    /// Backend address that starts the external identity-provider login
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting URL is invalid
    pub fn login_url(&self) -> Result<Url, ApiError> {
        self.endpoint_url("/auth/login")
    }

    fn endpoint_url(&self, endpoint: &str) -> Result<Url, ApiError> {
        let raw = format!("{}{}", self.base_url, endpoint);
        Url::parse(&raw).map_err(|source| ApiError::InvalidUrl { url: raw, source })
    }

    /// Send a request and return the decoded JSON body, or `None` for
    /// `204 No Content` and empty bodies
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] on 401 (after clearing the stored
    /// credential), [`ApiError::Status`] for other failures, and transport or
    /// decode errors otherwise
    pub async fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> Result<Option<Value>, ApiError> {
        let url = self.endpoint_url(endpoint)?;
        let credential = self.store.get();
        LoggingHelper::log_api_request(&method, endpoint, credential.as_ref());

        let mut builder = self
            .http
            .request(method, url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json");
        if let Some(credential) = &credential {
            builder = builder.bearer_auth(credential.as_str());
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|source| {
            LoggingHelper::log_api_transport_failure(endpoint, &source);
            ApiError::Transport {
                endpoint: endpoint.to_string(),
                source,
            }
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            self.handle_unauthorized(endpoint, credential.as_ref());
            return Err(ApiError::Unauthorized);
        }

        if !status.is_success() {
            let detail = response
                .json::<Value>()
                .await
                .ok()
                .as_ref()
                .and_then(extract_detail)
                .unwrap_or_else(|| DEFAULT_ERROR_DETAIL.to_string());
            LoggingHelper::log_api_status_failure(endpoint, status.as_u16(), &detail);
            return Err(ApiError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                detail,
            });
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let text = response.text().await.map_err(|source| ApiError::Transport {
            endpoint: endpoint.to_string(),
            source,
        })?;
        if text.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&text)
            .map(Some)
            .map_err(|source| ApiError::Decode {
                endpoint: endpoint.to_string(),
                source,
            })
    }

    /// `GET` an endpoint and decode its body into `T`
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`]; additionally fails with
    /// [`ApiError::EmptyBody`] when the response has no body
    pub async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        let body = self.request::<Value>(Method::GET, endpoint, None).await?;
        let value = body.ok_or_else(|| ApiError::EmptyBody {
            endpoint: endpoint.to_string(),
        })?;
        serde_json::from_value(value).map_err(|source| ApiError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
    }

    /// # Errors
    ///
    /// See [`ApiClient::request`]
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<Option<Value>, ApiError> {
        self.request(Method::POST, endpoint, Some(body)).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::request`]
    pub async fn delete(&self, endpoint: &str) -> Result<Option<Value>, ApiError> {
        self.request::<Value>(Method::DELETE, endpoint, None).await
    }

    /// Clear the credential that was rejected and run the hook
    ///
    /// A credential stored after `sent` was attached belongs to a newer
    /// session and is left alone, as is that session.
    fn handle_unauthorized(&self, endpoint: &str, sent: Option<&Credential>) {
        LoggingHelper::log_unauthorized(endpoint);
        let Some(sent) = sent else {
            return;
        };
        match self.store.clear_if(sent) {
            Ok(true) => {
                if let Some(hook) = self.on_unauthorized.get() {
                    hook();
                }
            }
            Ok(false) => debug!("Credential replaced since {endpoint} was sent, keeping it"),
            Err(e) => LoggingHelper::log_storage_failure("clear", &e),
        }
    }
}

fn extract_detail(body: &Value) -> Option<String> {
    match body.get("detail")? {
        Value::String(detail) => Some(detail.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}
