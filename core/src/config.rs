//! Layered client configuration.
//!
//! Precedence, later layers winning:
//! 1. Built-in defaults
//! 2. `config.toml` in the helpdesk home (`$HELPDESK_HOME`, else `~/.helpdesk`)
//! 3. `HELPDESK_*` environment variables
//!
//! ```toml
//! api_url = "https://support.example.com/api"
//! request_timeout_secs = 30
//! message_poll_interval_secs = 10
//! search_debounce_ms = 500
//! session_cookie = "token"
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_SESSION_COOKIE: &str = "token";
pub const DEFAULT_MESSAGE_POLL_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_KEEP_UNUSED_FOR: Duration = Duration::from_secs(60);

const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("I/O error loading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("invalid value for ${var}: '{value}' (expected: {expected})")]
    InvalidEnvValue {
        var: String,
        value: String,
        expected: String,
    },

    #[error("config validation error: {0}")]
    Validation(String),
}

/// Resolved settings for the remote data client and the views on top of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL every endpoint path is appended to.
    pub api_url: String,
    pub request_timeout: Duration,
    /// How often a mounted ticket detail view refetches its thread.
    pub message_poll_interval: Duration,
    /// Quiet period before a search draft is committed to the URL.
    pub search_debounce: Duration,
    /// How long a cached query outlives its last subscriber.
    pub keep_unused_for: Duration,
    /// Name of the cookie carrying the session marker.
    pub session_cookie: String,
    /// Marker to seed the cookie jar with, e.g. from a previous login.
    pub session_token: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            message_poll_interval: DEFAULT_MESSAGE_POLL_INTERVAL,
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
            keep_unused_for: DEFAULT_KEEP_UNUSED_FOR,
            session_cookie: DEFAULT_SESSION_COOKIE.to_string(),
            session_token: None,
        }
    }
}

/// On-disk shape of `config.toml`. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    api_url: Option<String>,
    request_timeout_secs: Option<u64>,
    message_poll_interval_secs: Option<u64>,
    search_debounce_ms: Option<u64>,
    keep_unused_secs: Option<u64>,
    session_cookie: Option<String>,
    session_token: Option<String>,
}

impl FileConfig {
    fn merge_into(self, config: &mut ClientConfig) {
        if let Some(url) = self.api_url {
            config.api_url = url;
        }
        if let Some(secs) = self.request_timeout_secs {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.message_poll_interval_secs {
            config.message_poll_interval = Duration::from_secs(secs);
        }
        if let Some(ms) = self.search_debounce_ms {
            config.search_debounce = Duration::from_millis(ms);
        }
        if let Some(secs) = self.keep_unused_secs {
            config.keep_unused_for = Duration::from_secs(secs);
        }
        if let Some(cookie) = self.session_cookie {
            config.session_cookie = cookie;
        }
        if self.session_token.is_some() {
            config.session_token = self.session_token;
        }
    }
}

/// Builder for layered configuration loading.
pub struct ConfigLoader {
    home: Option<PathBuf>,
    env_prefix: String,
    env: Option<HashMap<String, String>>,
    skip_file: bool,
    skip_env: bool,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            home: None,
            env_prefix: "HELPDESK".to_string(),
            env: None,
            skip_file: false,
            skip_env: false,
        }
    }

    /// Use `path` as the helpdesk home instead of resolving it.
    pub fn with_home(mut self, path: PathBuf) -> Self {
        self.home = Some(path);
        self
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Read overrides from `vars` instead of the process environment.
    pub fn with_env_vars(mut self, vars: HashMap<String, String>) -> Self {
        self.env = Some(vars);
        self
    }

    pub fn skip_file_layer(mut self) -> Self {
        self.skip_file = true;
        self
    }

    pub fn skip_env_layer(mut self) -> Self {
        self.skip_env = true;
        self
    }

    pub fn load(self) -> Result<ClientConfig, ConfigLoadError> {
        let mut config = ClientConfig::default();

        if !self.skip_file {
            let home = self.resolve_home()?;
            Self::load_from_file(&home)?.merge_into(&mut config);
        }

        if !self.skip_env {
            self.apply_env_overrides(&mut config)?;
        }

        validate(&config)?;
        Ok(config)
    }

    fn var(&self, name: &str) -> Option<String> {
        match &self.env {
            Some(vars) => vars.get(name).cloned(),
            None => std::env::var(name).ok(),
        }
    }

    /// Explicit home, then `$<PREFIX>_HOME`, then `~/.helpdesk`.
    fn resolve_home(&self) -> Result<PathBuf, ConfigLoadError> {
        if let Some(path) = &self.home {
            return Ok(path.clone());
        }
        if let Some(path) = self.var(&format!("{}_HOME", self.env_prefix))
            && !path.trim().is_empty()
        {
            return Ok(PathBuf::from(path));
        }
        dirs::home_dir()
            .map(|home| home.join(".helpdesk"))
            .ok_or_else(|| ConfigLoadError::Validation("cannot determine home directory".to_string()))
    }

    /// A missing file yields an empty layer.
    fn load_from_file(home: &Path) -> Result<FileConfig, ConfigLoadError> {
        let path = home.join(CONFIG_FILE);
        let contents = match std::fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("{} not found, using defaults", path.display());
                return Ok(FileConfig::default());
            }
            Err(e) => return Err(e.into()),
        };
        Ok(toml::from_str(&contents)?)
    }

    fn apply_env_overrides(&self, config: &mut ClientConfig) -> Result<(), ConfigLoadError> {
        let prefix = &self.env_prefix;

        if let Some(value) = self.non_empty(&format!("{prefix}_API_URL")) {
            tracing::debug!("applying env override {prefix}_API_URL={value}");
            config.api_url = value;
        }
        if let Some(secs) = self.number(&format!("{prefix}_TIMEOUT_SECS"))? {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.number(&format!("{prefix}_POLL_INTERVAL_SECS"))? {
            config.message_poll_interval = Duration::from_secs(secs);
        }
        if let Some(ms) = self.number(&format!("{prefix}_SEARCH_DEBOUNCE_MS"))? {
            config.search_debounce = Duration::from_millis(ms);
        }
        if let Some(secs) = self.number(&format!("{prefix}_KEEP_UNUSED_SECS"))? {
            config.keep_unused_for = Duration::from_secs(secs);
        }
        if let Some(token) = self.non_empty(&format!("{prefix}_TOKEN")) {
            config.session_token = Some(token);
        }
        Ok(())
    }

    fn non_empty(&self, name: &str) -> Option<String> {
        self.var(name).filter(|v| !v.trim().is_empty())
    }

    fn number(&self, name: &str) -> Result<Option<u64>, ConfigLoadError> {
        let Some(value) = self.non_empty(name) else {
            return Ok(None);
        };
        match value.trim().parse::<u64>() {
            Ok(n) if n > 0 => {
                tracing::debug!("applying env override {name}={n}");
                Ok(Some(n))
            }
            _ => Err(ConfigLoadError::InvalidEnvValue {
                var: name.to_string(),
                value,
                expected: "positive integer".to_string(),
            }),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn validate(config: &ClientConfig) -> Result<(), ConfigLoadError> {
    if url::Url::parse(&config.api_url).is_err() {
        return Err(ConfigLoadError::Validation(format!(
            "api_url is not a valid URL: {}",
            config.api_url
        )));
    }
    if config.session_cookie.trim().is_empty() {
        return Err(ConfigLoadError::Validation(
            "session_cookie must not be empty".to_string(),
        ));
    }
    if config.message_poll_interval.is_zero() {
        return Err(ConfigLoadError::Validation(
            "message_poll_interval must be positive".to_string(),
        ));
    }
    Ok(())
}
