//! Client configuration
//!
//! Values come from (in order) explicit overrides, environment variables
//! and built-in defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

/// Default server when nothing else is configured
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";

/// Path prefix of every API endpoint
pub const API_PREFIX: &str = "/api";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENV_SERVER_URL: &str = "CASSETTE_SERVER_URL";
pub const ENV_TIMEOUT_SECS: &str = "CASSETTE_TIMEOUT_SECS";
pub const ENV_CREDENTIALS_PATH: &str = "CASSETTE_CREDENTIALS_PATH";

/// Where a configuration value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    Flag,
    Env,
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Flag => write!(f, "flag"),
            ConfigSource::Env => write!(f, "env"),
            ConfigSource::Default => write!(f, "default"),
        }
    }
}

/// Effective client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server origin, without trailing slash and without the API prefix
    pub server_url: String,
    pub timeout: Duration,
    pub credentials_path: PathBuf,
    pub server_url_source: ConfigSource,
    pub credentials_path_source: ConfigSource,
}

impl ClientConfig {
    /// Build the configuration from environment variables and defaults
    pub fn from_env() -> Result<Self> {
        Self::resolve(None, None)
    }

    /// Build the configuration, letting explicit values win over the environment
    pub fn resolve(server_url: Option<&str>, credentials_path: Option<&str>) -> Result<Self> {
        let (server_url, server_url_source) = match server_url {
            Some(url) => (url.to_string(), ConfigSource::Flag),
            None => match std::env::var(ENV_SERVER_URL) {
                Ok(url) if !url.trim().is_empty() => (url, ConfigSource::Env),
                _ => (DEFAULT_SERVER_URL.to_string(), ConfigSource::Default),
            },
        };

        let (credentials_path, credentials_path_source) = match credentials_path {
            Some(path) => (expand_path(path)?, ConfigSource::Flag),
            None => match std::env::var(ENV_CREDENTIALS_PATH) {
                Ok(path) if !path.trim().is_empty() => (expand_path(&path)?, ConfigSource::Env),
                _ => (default_credentials_path()?, ConfigSource::Default),
            },
        };

        let timeout_secs = match std::env::var(ENV_TIMEOUT_SECS) {
            Ok(raw) => raw.trim().parse::<u64>().map_err(|_| {
                Error::config(format!("{} must be a number of seconds, got {:?}", ENV_TIMEOUT_SECS, raw))
            })?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            server_url: normalize_server_url(&server_url)?,
            timeout: Duration::from_secs(timeout_secs.max(1)),
            credentials_path,
            server_url_source,
            credentials_path_source,
        })
    }

    /// Base URL every endpoint path is appended to
    pub fn api_base_url(&self) -> String {
        format!("{}{}", self.server_url, API_PREFIX)
    }
}

/// Trim trailing slashes and reject anything that is not an http(s) URL
fn normalize_server_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = url::Url::parse(trimmed)
        .map_err(|e| Error::config(format!("Invalid server URL {:?}: {}", raw, e)))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(Error::config(format!(
            "Server URL must use http or https, got {:?}",
            raw
        )));
    }
    Ok(trimmed.to_string())
}

fn expand_path(raw: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(raw)
        .map_err(|e| Error::config(format!("Cannot expand path {:?}: {}", raw, e)))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Default location of the credentials file in the platform data directory
pub fn default_credentials_path() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("com", "cassette", "Cassette")
        .ok_or_else(|| Error::config("Could not determine project directories"))?;

    Ok(dirs.data_dir().join("credentials.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to ensure env var tests don't run in parallel
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn test_explicit_values_win() {
        let _lock = ENV_MUTEX.lock().unwrap();
        std::env::set_var(ENV_SERVER_URL, "http://env.example:9000");
        let config = ClientConfig::resolve(Some("https://music.example/"), Some("/tmp/creds.json")).unwrap();
        std::env::remove_var(ENV_SERVER_URL);

        assert_eq!(config.server_url, "https://music.example");
        assert_eq!(config.server_url_source, ConfigSource::Flag);
        assert_eq!(config.credentials_path, PathBuf::from("/tmp/creds.json"));
        assert_eq!(config.api_base_url(), "https://music.example/api");
    }

    #[test]
    fn test_env_then_default() {
        let _lock = ENV_MUTEX.lock().unwrap();
        std::env::set_var(ENV_SERVER_URL, "http://env.example:9000//");
        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.server_url, "http://env.example:9000");
        assert_eq!(config.server_url_source, ConfigSource::Env);

        std::env::remove_var(ENV_SERVER_URL);
        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        assert_eq!(config.server_url_source, ConfigSource::Default);
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_invalid_timeout_is_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        std::env::set_var(ENV_TIMEOUT_SECS, "soon");
        let result = ClientConfig::resolve(Some(DEFAULT_SERVER_URL), Some("/tmp/c.json"));
        std::env::remove_var(ENV_TIMEOUT_SECS);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_non_http_server() {
        assert!(normalize_server_url("ftp://example.com").is_err());
        assert!(normalize_server_url("not a url").is_err());
    }

    #[test]
    fn test_default_credentials_path() {
        let path = default_credentials_path().unwrap();
        assert!(path.to_string_lossy().ends_with("credentials.json"));
    }
}
