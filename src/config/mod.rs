use crate::connection::ReconnectPolicy;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Env var naming an optional TOML config file
pub const CONFIG_PATH_VAR: &str = "MK_STREAM_CONFIG";

/// Stream connection configuration
#[derive(Clone)]
pub struct StreamConfig {
    /// Bare hostname of the instance (no scheme, no path)
    pub host: String,
    /// Access token, used for both the stream and the notes API
    pub token: String,
    pub reconnect: ReconnectPolicy,
}

impl fmt::Debug for StreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamConfig")
            .field("host", &self.host)
            .field("token", &"<redacted>")
            .field("reconnect", &self.reconnect)
            .finish()
    }
}

/// Sections of the TOML file read by this crate
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub reconnect: ReconnectPolicy,
}

/// Configuration errors (fatal at startup)
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    MissingVar(&'static str),
    InvalidHost(String),
    File { path: PathBuf, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingVar(key) => {
                write!(f, "required environment variable is not set: {}", key)
            }
            ConfigError::InvalidHost(host) => {
                write!(f, "HOST must be a bare hostname without scheme or path, got '{}'", host)
            }
            ConfigError::File { path, reason } => {
                write!(f, "failed to load config file {}: {}", path.display(), reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl StreamConfig {
    /// Build from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup.
    ///
    /// Layering: defaults, then the TOML file named by `MK_STREAM_CONFIG`,
    /// then `RECONNECT_*` variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let reconnect = match lookup(CONFIG_PATH_VAR) {
            Some(path) => load_file::<FileConfig>(Path::new(&path))?.reconnect,
            None => ReconnectPolicy::default(),
        };
        Self::with_reconnect(lookup, reconnect)
    }

    /// Build from a lookup and a `[reconnect]` section the caller already
    /// loaded; `RECONNECT_*` variables still take precedence.
    pub fn with_reconnect<F>(lookup: F, mut reconnect: ReconnectPolicy) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = required(&lookup, "HOST")?;
        let token = required(&lookup, "TOKEN")?;

        if host.contains("://") || host.contains('/') {
            return Err(ConfigError::InvalidHost(host));
        }

        reconnect.apply_overrides(&lookup);

        Ok(Self {
            host,
            token,
            reconnect,
        })
    }

    /// `wss://<host>/streaming?i=<token>`
    pub fn streaming_url(&self) -> String {
        format!(
            "wss://{}/streaming?i={}",
            self.host,
            urlencoding::encode(&self.token)
        )
    }

    /// `https://<host>/api/notes/create`
    pub fn notes_endpoint(&self) -> String {
        format!("https://{}/api/notes/create", self.host)
    }
}

fn required<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::MissingVar(key))
}

/// Load a TOML config file into any section struct
pub fn load_file<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let file_error = |reason: String| ConfigError::File {
        path: path.to_path_buf(),
        reason,
    };
    let contents = std::fs::read_to_string(path).map_err(|e| file_error(e.to_string()))?;
    toml::from_str(&contents).map_err(|e| file_error(e.to_string()))
}

/// Load `.env` from the working directory if there is one
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => info!(path = %path.display(), "Loaded .env file"),
        Err(e) if e.not_found() => warn!("Not using .env file"),
        Err(e) => warn!(error = %e, "Failed to load .env file"),
    }
}
