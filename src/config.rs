use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Longest idle time a session may be configured to live (30 days).
pub const MAX_SESSION_TTL_SECS: u64 = 30 * 24 * 60 * 60;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub progress: ProgressConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5173
}

fn default_max_upload_mb() -> usize {
    50
}

/// Where the translation service lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

/// Simulated progress: starts at `start`, climbs by `step` every
/// `interval_ms` and holds at `ceiling` until the response arrives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressConfig {
    #[serde(default = "default_progress_start")]
    pub start: u8,
    #[serde(default = "default_progress_step")]
    pub step: u8,
    #[serde(default = "default_progress_ceiling")]
    pub ceiling: u8,
    #[serde(default = "default_progress_interval_ms")]
    pub interval_ms: u64,
}

fn default_progress_start() -> u8 {
    10
}

fn default_progress_step() -> u8 {
    10
}

fn default_progress_ceiling() -> u8 {
    90
}

fn default_progress_interval_ms() -> u64 {
    500
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_session_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

fn default_session_ttl_secs() -> u64 {
    3600
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_max_sessions() -> usize {
    1000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_mb: default_max_upload_mb(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            start: default_progress_start(),
            step: default_progress_step(),
            ceiling: default_progress_ceiling(),
            interval_ms: default_progress_interval_ms(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_session_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            max_sessions: default_max_sessions(),
        }
    }
}

impl Config {
    /// Load from `CONFIG_PATH` (or `translator.{yaml,json,toml}` if present),
    /// then `TRANSLATOR__*` variables, then `API_URL`.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("CONFIG_PATH").ok();
        let api_url = std::env::var("API_URL").ok();
        Self::load_from(path.as_deref().map(Path::new), api_url)
    }

    pub fn load_from(path: Option<&Path>, api_url: Option<String>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => ::config::File::from(path).required(true),
            None => ::config::File::with_name("translator").required(false),
        };

        let mut config: Config = ::config::Config::builder()
            .add_source(file)
            .add_source(
                ::config::Environment::with_prefix("TRANSLATOR")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        if let Some(url) = api_url.filter(|url| !url.trim().is_empty()) {
            config.api.api_url = url;
        }
        config.api.api_url = config.api.api_url.trim().trim_end_matches('/').to_string();

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = &self.api.api_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "api_url must be an http(s) URL, got {:?}",
                url
            )));
        }
        let p = &self.progress;
        if p.step == 0 || p.interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "progress step and interval must be positive".to_string(),
            ));
        }
        if p.start > p.ceiling || p.ceiling >= 100 {
            return Err(ConfigError::Invalid(format!(
                "progress start ({}) must not exceed ceiling ({}), which must stay below 100",
                p.start, p.ceiling
            )));
        }
        if self.server.max_upload_mb == 0 {
            return Err(ConfigError::Invalid("max_upload_mb must be positive".to_string()));
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::Invalid("api timeout_secs must be positive".to_string()));
        }
        let s = &self.session;
        if s.ttl_secs == 0 || s.ttl_secs > MAX_SESSION_TTL_SECS {
            return Err(ConfigError::Invalid(format!(
                "session ttl_secs must be between 1 and {}, got {}",
                MAX_SESSION_TTL_SECS, s.ttl_secs
            )));
        }
        if s.max_sessions == 0 {
            return Err(ConfigError::Invalid("max_sessions must be positive".to_string()));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("bad listen address: {}", e)))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    /// Idle lifetime of a session, clamped to [`MAX_SESSION_TTL_SECS`].
    pub fn session_ttl(&self) -> chrono::Duration {
        let secs = self.session.ttl_secs.min(MAX_SESSION_TTL_SECS);
        chrono::Duration::seconds(secs as i64)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.server.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_config(ext: &str, body: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("translator-{}.{}", uuid::Uuid::new_v4(), ext));
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn defaults_match_service_contract() {
        let config = Config::default();
        assert_eq!(config.api.api_url, "http://localhost:8000");
        assert_eq!(config.progress.start, 10);
        assert_eq!(config.progress.step, 10);
        assert_eq!(config.progress.ceiling, 90);
        assert_eq!(config.progress.interval_ms, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn loads_yaml_file_with_api_url_override() {
        let path = temp_config(
            "yaml",
            "server:\n  port: 9000\napi:\n  api_url: http://translator.internal:8000/\n",
        );
        let config = Config::load_from(Some(path.as_path()), None).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.api.api_url, "http://translator.internal:8000");

        let config = Config::load_from(Some(path.as_path()), Some("https://api.example.com/".into())).unwrap();
        assert_eq!(config.api.api_url, "https://api.example.com");
        fs::remove_file(path).ok();
    }

    #[test]
    fn loads_json_file() {
        let path = temp_config("json", r#"{"progress": {"interval_ms": 250}}"#);
        let config = Config::load_from(Some(path.as_path()), None).unwrap();
        assert_eq!(config.progress.interval_ms, 250);
        assert_eq!(config.progress.ceiling, 90);
        fs::remove_file(path).ok();
    }

    #[test]
    fn rejects_bad_values() {
        let mut config = Config::default();
        config.api.api_url = "localhost:8000".into();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.progress.ceiling = 100;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.progress.start = 95;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.api.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.session.ttl_secs = u64::MAX / 2;
        assert!(config.validate().is_err());
        assert_eq!(
            config.session_ttl(),
            chrono::Duration::seconds(MAX_SESSION_TTL_SECS as i64)
        );

        let mut config = Config::default();
        config.session.ttl_secs = MAX_SESSION_TTL_SECS;
        assert!(config.validate().is_ok());

        let mut config = Config::default();
        config.session.max_sessions = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let path = std::env::temp_dir().join("translator-does-not-exist.yaml");
        assert!(Config::load_from(Some(path.as_path()), None).is_err());
    }

    #[test]
    fn socket_addr_from_host_and_port() {
        let config = Config::default();
        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:5173");
        assert_eq!(config.max_upload_bytes(), 50 * 1024 * 1024);
    }
}
