use crate::storage::DEFAULT_TOKEN_KEY;
use crate::utils::logging::LoggingHelper;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CoursepilotSettings {
    pub api: ApiSettings,
    pub storage: StorageSettings,
    pub session: SessionSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Backend origin, e.g. `http://127.0.0.1:8000`
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// JSON file acting as the client's persistent storage area
    pub token_file: String,
    /// Name of the entry holding the credential
    pub token_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Keep the stored credential when session resolution fails with a
    /// transport error. Off by default: any resolution failure clears it.
    pub keep_token_on_network_error: bool,
    /// Emit session transitions through the log-backed observer
    pub trace_transitions: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            token_file: ".coursepilot/storage.json".to_string(),
            token_key: DEFAULT_TOKEN_KEY.to_string(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            keep_token_on_network_error: false,
            trace_transitions: true,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl CoursepilotSettings {
    /// Load settings from configuration files and environment variables,
    /// then initialize the logger with the resulting level
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Settings file cannot be read or parsed
    /// - TOML parsing fails
    /// - Logger initialization fails
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        Self::load_env_file();

        let (mut settings, sources) = Self::load_base_settings()?;
        Self::apply_env_overrides(&mut settings);

        Self::initialize_logging(&settings.logging)?;
        LoggingHelper::log_settings_sources(&sources);

        Ok(settings)
    }

    /// Load base settings from TOML file(s) or use defaults
    /// Settings are loaded with the following priority (highest to lowest):
    /// 1. Environment variables (applied separately after loading base settings)
    /// 2. Settings.toml in `COURSEPILOT_SECRETS_DIR` (if specified and exists)
    /// 3. Settings.toml in current directory (if exists)
    /// 4. Default settings
    ///
    /// Returns the settings together with the files they were read from.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Settings file cannot be read
    /// - TOML parsing fails
    fn load_base_settings() -> Result<(Self, Vec<PathBuf>), Box<dyn std::error::Error>> {
        let mut settings = Self::default();
        let mut sources = Vec::new();

        let default_config_path = PathBuf::from("Settings.toml");
        if default_config_path.exists() {
            settings = Self::from_toml_file(&default_config_path)?;
            sources.push(default_config_path);
        }

        if let Ok(secrets_dir) = std::env::var("COURSEPILOT_SECRETS_DIR") {
            let secrets_path = PathBuf::from(secrets_dir).join("Settings.toml");
            if secrets_path.exists() {
                settings = Self::from_toml_file(&secrets_path)?;
                sources.push(secrets_path);
            }
        }

        Ok((settings, sources))
    }

    /// Parse a single TOML settings file; missing sections take defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML
    pub fn from_toml_file(path: &std::path::Path) -> Result<Self, Box<dyn std::error::Error>> {
        let toml_content = fs::read_to_string(path)?;
        Ok(basic_toml::from_str(&toml_content)?)
    }

    /// Apply environment variable overrides to settings
    pub fn apply_env_overrides(settings: &mut Self) {
        Self::apply_api_env_overrides(&mut settings.api);
        Self::apply_storage_env_overrides(&mut settings.storage);
        Self::apply_session_env_overrides(&mut settings.session);
        Self::apply_logging_env_overrides(&mut settings.logging);
    }

    fn apply_api_env_overrides(api_settings: &mut ApiSettings) {
        if let Ok(base_url) = std::env::var("API_BASE_URL") {
            api_settings.base_url = base_url;
        }
        if let Ok(timeout_str) = std::env::var("API_TIMEOUT_SECS") {
            if let Ok(timeout) = timeout_str.parse::<u64>() {
                api_settings.timeout_secs = timeout;
            }
        }
    }

    fn apply_storage_env_overrides(storage_settings: &mut StorageSettings) {
        if let Ok(token_file) = std::env::var("TOKEN_FILE") {
            storage_settings.token_file = token_file;
        }
        if let Ok(token_key) = std::env::var("TOKEN_KEY") {
            if !token_key.trim().is_empty() {
                storage_settings.token_key = token_key;
            }
        }
    }

    fn apply_session_env_overrides(session_settings: &mut SessionSettings) {
        Self::apply_bool_env_override(
            "KEEP_TOKEN_ON_NETWORK_ERROR",
            &mut session_settings.keep_token_on_network_error,
        );
        Self::apply_bool_env_override(
            "TRACE_SESSION_TRANSITIONS",
            &mut session_settings.trace_transitions,
        );
    }

    fn apply_bool_env_override(env_var: &str, target: &mut bool) {
        if let Ok(value_str) = std::env::var(env_var) {
            if let Ok(value) = value_str.parse::<bool>() {
                *target = value;
            }
        }
    }

    fn apply_logging_env_overrides(logging_settings: &mut LoggingSettings) {
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            logging_settings.level = log_level;
        }
    }

    fn initialize_logging(logging: &LoggingSettings) -> Result<(), Box<dyn std::error::Error>> {
        env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(logging.level.as_str()),
        )
        .try_init()?;
        Ok(())
    }

    /// Load environment variables from .env file
    fn load_env_file() {
        if let Ok(contents) = std::fs::read_to_string(".env") {
            for line in contents.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    // variables already set in the environment win over the file
                    if std::env::var_os(key.trim()).is_none() {
                        std::env::set_var(key.trim(), value.trim());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn clean_env_vars() {
        for var in [
            "API_BASE_URL",
            "API_TIMEOUT_SECS",
            "TOKEN_FILE",
            "TOKEN_KEY",
            "KEEP_TOKEN_ON_NETWORK_ERROR",
            "TRACE_SESSION_TRANSITIONS",
            "RUST_LOG",
            "COURSEPILOT_SECRETS_DIR",
        ] {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_defaults() {
        let settings = CoursepilotSettings::default();

        assert_eq!(settings.api.base_url, "http://127.0.0.1:8000");
        assert_eq!(settings.storage.token_key, "authToken");
        assert!(!settings.session.keep_token_on_network_error);
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clean_env_vars();
        std::env::set_var("API_BASE_URL", "https://tutor.example.edu/");
        std::env::set_var("API_TIMEOUT_SECS", "5");
        std::env::set_var("TOKEN_KEY", "bearer");
        std::env::set_var("KEEP_TOKEN_ON_NETWORK_ERROR", "true");

        let mut settings = CoursepilotSettings::default();
        CoursepilotSettings::apply_env_overrides(&mut settings);

        assert_eq!(settings.api.base_url, "https://tutor.example.edu/");
        assert_eq!(settings.api.timeout_secs, 5);
        assert_eq!(settings.storage.token_key, "bearer");
        assert!(settings.session.keep_token_on_network_error);

        clean_env_vars();
    }

    #[test]
    #[serial]
    fn test_invalid_env_values_are_ignored() {
        clean_env_vars();
        std::env::set_var("API_TIMEOUT_SECS", "soon");
        std::env::set_var("KEEP_TOKEN_ON_NETWORK_ERROR", "maybe");
        std::env::set_var("TOKEN_KEY", "  ");

        let mut settings = CoursepilotSettings::default();
        CoursepilotSettings::apply_env_overrides(&mut settings);

        assert_eq!(settings.api.timeout_secs, 30);
        assert!(!settings.session.keep_token_on_network_error);
        assert_eq!(settings.storage.token_key, "authToken");

        clean_env_vars();
    }

    #[test]
    fn test_partial_toml_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[api]\nbase_url = \"http://backend:9000\"\n\n[session]\nkeep_token_on_network_error = true"
        )
        .unwrap();

        let settings = CoursepilotSettings::from_toml_file(file.path()).unwrap();

        assert_eq!(settings.api.base_url, "http://backend:9000");
        assert_eq!(settings.api.timeout_secs, 30);
        assert!(settings.session.keep_token_on_network_error);
        assert!(settings.session.trace_transitions);
        assert_eq!(settings.storage.token_file, ".coursepilot/storage.json");
    }
}
