// Centralized logging utilities so call sites share message formats
use crate::models::Credential;
use log::{debug, error, info, warn};
use std::path::PathBuf;

pub struct LoggingHelper;

impl LoggingHelper {
    /// Log which settings files were applied
    pub fn log_settings_sources(sources: &[PathBuf]) {
        if sources.is_empty() {
            debug!("No Settings.toml found, using defaults and environment");
        }
        for source in sources {
            info!("✓ Loaded settings from {}", source.display());
        }
    }

    /// Log an outbound API request
    pub fn log_api_request(
        method: &reqwest::Method,
        endpoint: &str,
        credential: Option<&Credential>,
    ) {
        debug!(
            "🔍 {} {} (credential: {})",
            method,
            endpoint,
            credential.map_or_else(|| "none".to_string(), Credential::masked)
        );
    }

    /// Log a request that never produced a response
    pub fn log_api_transport_failure(endpoint: &str, error: &reqwest::Error) {
        error!("API transport error for {endpoint}: {error}");
    }

    /// Log a non-success response
    pub fn log_api_status_failure(endpoint: &str, status: u16, detail: &str) {
        warn!("API error {endpoint}: {status} {detail}");
    }

    /// Log the uniform 401 handling
    pub fn log_unauthorized(endpoint: &str) {
        warn!("⛔ {endpoint} returned 401, clearing stored credential");
    }

    /// Log the credential found on an identity-provider callback
    pub fn log_callback_received(location_path: &str, credential: Option<&Credential>) {
        match credential {
            Some(token) => debug!(
                "🔄 Callback received at {location_path} with token {}",
                token.masked()
            ),
            None => warn!("❌ Callback received at {location_path} without a token parameter"),
        }
    }

    /// Log a storage failure that was tolerated
    pub fn log_storage_failure(action: &str, error: &dyn std::error::Error) {
        warn!("Token storage {action} failed: {error}");
    }
}
