//! Runtime configuration.
//!
//! Everything except the API key comes from an optional TOML file. The key
//! is only ever taken from `RAPID_API_KEY` so it never ends up in a config
//! file checked into version control.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Environment variable holding the upstream API key.
pub const API_KEY_ENV: &str = "RAPID_API_KEY";

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "COVID_PROXY_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "/etc/covid-proxy/config.toml";

/// Host value the covid-193 API expects in `X-RapidAPI-Host`.
pub const DEFAULT_API_HOST: &str = "covid-193.p.rapidapi.com";

/// Errors raised while loading configuration at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for [`Config`].
    #[error("invalid config file {}: {source}", path.display())]
    Parse {
        /// File that failed.
        path: PathBuf,
        /// Parser error with location.
        #[source]
        source: toml::de::Error,
    },

    /// `RAPID_API_KEY` is unset or blank.
    #[error("environment variable RAPID_API_KEY is not set or empty")]
    MissingApiKey,

    /// A credential header value cannot be sent over HTTP.
    #[error("value for header {0} contains invalid characters")]
    InvalidHeader(&'static str),

    /// reqwest rejected the client settings (e.g. a bad proxy URL).
    #[error("failed to build upstream HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Complete service configuration, immutable after startup.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// `[proxy]` table.
    #[serde(default)]
    pub proxy: ProxyConfig,
    /// `[upstream]` table.
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// Filled in from the environment, never from the file.
    #[serde(skip)]
    pub api_key: String,
}

/// Where the proxy listens.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listen host.
    pub host: String,
    /// Listen port.
    pub port: u16,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// How to reach the upstream statistics API.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL; endpoint paths are appended to it.
    pub endpoint: String,
    /// Value sent as `X-RapidAPI-Host`.
    pub api_host: String,
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Optional outbound proxies keyed by scheme (`http`, `https`).
    pub proxies: Option<HashMap<String, String>>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            endpoint: format!("https://{DEFAULT_API_HOST}"),
            api_host: DEFAULT_API_HOST.to_string(),
            timeout: 10,
            proxies: None,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("proxy", &self.proxy)
            .field("upstream", &self.upstream)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl Config {
    /// Build a configuration with default settings and the given key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            proxy: ProxyConfig::default(),
            upstream: UpstreamConfig::default(),
            api_key: api_key.into(),
        }
    }

    /// Parse the TOML document and attach the API key.
    pub fn from_toml_str(
        contents: &str,
        path: &Path,
        api_key: Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.api_key = validate_api_key(api_key)?;
        config.upstream.endpoint = config.upstream.endpoint.trim_end_matches('/').to_string();
        Ok(config)
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn from_file(path: &Path, api_key: Option<String>) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_toml_str(&contents, path, api_key),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config file at {}, using defaults", path.display());
                Ok(Self::new(validate_api_key(api_key)?))
            }
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Load using the process environment for the path and the API key.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::from_file(&path, std::env::var(API_KEY_ENV).ok())
    }

    /// Address string the listener binds to.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.proxy.host, self.proxy.port)
    }
}

/// Load variables from a dotenv file without overriding ones already set.
///
/// Returns `Ok(false)` when the file does not exist; a file that exists but
/// cannot be parsed is an error.
pub fn load_dotenv_from(path: &Path) -> Result<bool, dotenvy::Error> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(true),
        Err(e) if e.not_found() => Ok(false),
        Err(e) => Err(e),
    }
}

fn validate_api_key(api_key: Option<String>) -> Result<String, ConfigError> {
    match api_key {
        Some(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(ConfigError::MissingApiKey),
    }
}
