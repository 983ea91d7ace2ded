//! Layered configuration: defaults, then an optional TOML file, then env

use crate::error::ConfigError;
use crate::manifest::{DEFAULT_MANIFEST_POLL_INTERVAL, DEFAULT_PLAYGROUND_NAME, DEFAULT_PLAYGROUND_TENANT};
use datalab_telemetry::{RecorderConfig, DEFAULT_UI_VERSION};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Backend base URL used when nothing else is configured
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Env var overriding [`DataLabConfig::api_base_url`]
pub const ENV_API_BASE_URL: &str = "DATALAB_API_BASE_URL";
/// Env var overriding [`DataLabConfig::ui_version`]
pub const ENV_UI_VERSION: &str = "DATALAB_UI_VERSION";
/// Env var overriding [`DataLabConfig::model_hint`]; empty clears it
pub const ENV_MODEL_HINT: &str = "DATALAB_MODEL_HINT";
/// Env var overriding [`DataLabConfig::playground_tenant`]
pub const ENV_PLAYGROUND_TENANT: &str = "DATALAB_PLAYGROUND_TENANT";
/// Env var overriding [`DataLabConfig::playground_name`]
pub const ENV_PLAYGROUND_NAME: &str = "DATALAB_PLAYGROUND_NAME";

/// DataLab configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataLabConfig {
    /// Backend base URL; a trailing `/` is tolerated
    pub api_base_url: String,
    /// Client build tag sent with every payload
    pub ui_version: String,
    /// Model preference sent with every payload
    pub model_hint: Option<String>,
    /// Per-request HTTP timeout in seconds
    pub request_timeout_secs: u64,
    /// Recorder timers
    pub recorder: RecorderConfig,
    /// Tenant whose playground manifest is polled
    pub playground_tenant: String,
    /// Playground whose manifest is polled
    pub playground_name: String,
    /// Manifest auto-refresh period in seconds
    pub manifest_poll_interval_secs: u64,
}

impl DataLabConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults, then `path` if given, then environment overrides, then validation
    ///
    /// # Errors
    /// Unreadable or malformed file, or an invalid final value.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_path(path)?,
            None => Self::default(),
        };
        let config = config.apply_env();
        config.validate()?;
        tracing::debug!(api_base_url = %config.api_base_url, ui_version = %config.ui_version, "configuration loaded");
        Ok(config)
    }

    /// Parse TOML; missing keys keep their defaults
    ///
    /// # Errors
    /// [`ConfigError::Parse`] on malformed input.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    /// [`ConfigError::Io`] or [`ConfigError::Parse`].
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Apply overrides from the process environment
    #[must_use]
    pub fn apply_env(self) -> Self {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup
    #[must_use]
    pub fn apply_env_with(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(ENV_API_BASE_URL) {
            self.api_base_url = url;
        }
        if let Some(version) = lookup(ENV_UI_VERSION) {
            self.ui_version = version;
        }
        if let Some(hint) = lookup(ENV_MODEL_HINT) {
            self.model_hint = (!hint.trim().is_empty()).then_some(hint);
        }
        if let Some(tenant) = lookup(ENV_PLAYGROUND_TENANT) {
            self.playground_tenant = tenant;
        }
        if let Some(name) = lookup(ENV_PLAYGROUND_NAME) {
            self.playground_name = name;
        }
        self
    }

    /// Check value ranges
    ///
    /// # Errors
    /// [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api_base_url must not be empty".into()));
        }
        if self.ui_version.trim().is_empty() {
            return Err(ConfigError::Invalid("ui_version must not be empty".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("request_timeout_secs must be positive".into()));
        }
        if self.recorder.inactivity_threshold_ms == 0 {
            return Err(ConfigError::Invalid(
                "recorder.inactivity_threshold_ms must be positive".into(),
            ));
        }
        if self.recorder.snapshot_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "recorder.snapshot_interval_ms must be positive".into(),
            ));
        }
        if self.playground_tenant.trim().is_empty() || self.playground_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "playground_tenant and playground_name must not be empty".into(),
            ));
        }
        if self.manifest_poll_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "manifest_poll_interval_secs must be positive".into(),
            ));
        }
        Ok(())
    }

    /// With API base URL
    #[inline]
    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// With UI version
    #[inline]
    #[must_use]
    pub fn with_ui_version(mut self, version: impl Into<String>) -> Self {
        self.ui_version = version.into();
        self
    }

    /// With model hint
    #[inline]
    #[must_use]
    pub fn with_model_hint(mut self, hint: Option<String>) -> Self {
        self.model_hint = hint;
        self
    }

    /// With recorder timers
    #[inline]
    #[must_use]
    pub fn with_recorder(mut self, recorder: RecorderConfig) -> Self {
        self.recorder = recorder;
        self
    }

    /// With polled playground
    #[inline]
    #[must_use]
    pub fn with_playground(mut self, tenant: impl Into<String>, name: impl Into<String>) -> Self {
        self.playground_tenant = tenant.into();
        self.playground_name = name.into();
        self
    }

    /// Request timeout as a [`Duration`]
    #[inline]
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Manifest auto-refresh period as a [`Duration`]
    #[inline]
    #[must_use]
    pub fn manifest_poll_interval(&self) -> Duration {
        Duration::from_secs(self.manifest_poll_interval_secs)
    }
}

impl Default for DataLabConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            ui_version: DEFAULT_UI_VERSION.to_string(),
            model_hint: None,
            request_timeout_secs: 30,
            recorder: RecorderConfig::default(),
            playground_tenant: DEFAULT_PLAYGROUND_TENANT.to_string(),
            playground_name: DEFAULT_PLAYGROUND_NAME.to_string(),
            manifest_poll_interval_secs: DEFAULT_MANIFEST_POLL_INTERVAL.as_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let config = DataLabConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.ui_version, "web-0.1");
        assert_eq!(config.recorder.inactivity_threshold_ms, 700);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = DataLabConfig::from_toml_str(
            r#"
            api_base_url = "https://lab.example.com/"

            [recorder]
            inactivity_threshold_ms = 500
            "#,
        )
        .unwrap();
        assert_eq!(config.api_base_url, "https://lab.example.com/");
        assert_eq!(config.recorder.inactivity_threshold_ms, 500);
        assert_eq!(config.recorder.snapshot_interval_ms, 1500);
        assert_eq!(config.ui_version, DEFAULT_UI_VERSION);
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn partial_recorder_table_keeps_other_timer() {
        let config = DataLabConfig::from_toml_str("[recorder]\nsnapshot_interval_ms = 2000\n").unwrap();
        assert_eq!(
            config.recorder,
            RecorderConfig::default().with_snapshot_interval_ms(2000)
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        assert!(matches!(
            DataLabConfig::from_toml_str("api_base_url = "),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn env_overrides_file_values() {
        let config = DataLabConfig::new()
            .with_model_hint(Some("gpt-4o".into()))
            .apply_env_with(env(&[
                (ENV_API_BASE_URL, "http://10.0.0.5:9000"),
                (ENV_UI_VERSION, "cli-0.1"),
            ]));
        assert_eq!(config.api_base_url, "http://10.0.0.5:9000");
        assert_eq!(config.ui_version, "cli-0.1");
        assert_eq!(config.model_hint.as_deref(), Some("gpt-4o"));
    }

    #[test]
    fn empty_model_hint_env_clears_hint() {
        let config = DataLabConfig::new()
            .with_model_hint(Some("gpt-4o".into()))
            .apply_env_with(env(&[(ENV_MODEL_HINT, "")]));
        assert_eq!(config.model_hint, None);
    }

    #[test]
    fn playground_from_toml_and_env() {
        let config = DataLabConfig::from_toml_str("playground_name = \"ops-board\"\nmanifest_poll_interval_secs = 15\n")
            .unwrap()
            .apply_env_with(env(&[(ENV_PLAYGROUND_TENANT, "acme")]));
        assert_eq!(config.playground_tenant, "acme");
        assert_eq!(config.playground_name, "ops-board");
        assert_eq!(config.manifest_poll_interval(), Duration::from_secs(15));
        assert_eq!(DataLabConfig::default().playground_tenant, "demo-tenant");
    }

    #[test]
    fn zero_poll_interval_rejected() {
        let mut config = DataLabConfig::new().with_playground("acme", "board");
        config.manifest_poll_interval_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn zero_timer_rejected() {
        let config = DataLabConfig::new()
            .with_recorder(RecorderConfig::new().with_snapshot_interval_ms(0));
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "ui_version = \"desk-2.0\"\nrequest_timeout_secs = 5").unwrap();

        let config = DataLabConfig::from_path(file.path()).unwrap();
        assert_eq!(config.ui_version, "desk-2.0");
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DataLabConfig::from_path(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
