//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file if present).

use serde::Deserialize;
use std::env;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub server: ServerConfig,
    pub credential: CredentialConfig,
    pub worker: UpstreamConfig,
    pub profiles: UpstreamConfig,
    pub chat: ChatConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

/// HTTP/WebSocket listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Credential signing configuration
#[derive(Clone, Deserialize)]
pub struct CredentialConfig {
    pub secret: String,
    #[serde(default = "default_credential_ttl_secs")]
    pub ttl_secs: u64,
}

impl CredentialConfig {
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl std::fmt::Debug for CredentialConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialConfig")
            .field("secret", &"<redacted>")
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}

/// Base URL and timeout of a backend service
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    pub url: String,
    #[serde(default)]
    pub prefix: String,
    #[serde(default = "default_upstream_timeout_secs")]
    pub timeout_secs: u64,
}

impl UpstreamConfig {
    /// Join the base URL, prefix, and a path
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}{}", self.url.trim_end_matches('/'), self.prefix, path)
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Where chat history is read from and appended to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HistoryBackend {
    /// The matchmaking worker service over HTTP
    #[default]
    Worker,
    /// Process-local store, lost on restart
    Memory,
}

/// Real-time chat tuning
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    #[serde(default)]
    pub history_backend: HistoryBackend,
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

impl ChatConfig {
    #[must_use]
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }

    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_backend: HistoryBackend::default(),
            outbound_buffer: default_outbound_buffer(),
            ping_interval_secs: default_ping_interval_secs(),
            idle_timeout_secs: default_idle_timeout_secs(),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "lingualink-gateway".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_credential_ttl_secs() -> u64 {
    900 // 15 minutes
}

fn default_worker_prefix() -> String {
    "/api/v0".to_string()
}

fn default_upstream_timeout_secs() -> u64 {
    10
}

fn default_outbound_buffer() -> usize {
    256
}

fn default_ping_interval_secs() -> u64 {
    30
}

fn default_idle_timeout_secs() -> u64 {
    90
}

/// Parse an optional numeric variable, failing on garbage
fn parse_var<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(name, raw)),
        Err(_) => Ok(None),
    }
}

/// Resolve `<PREFIX>_URL`, falling back to `http://<PREFIX>_HOST:<PREFIX>_PORT`
fn service_url(
    url_var: &'static str,
    host_var: &'static str,
    port_var: &'static str,
) -> Result<String, ConfigError> {
    if let Ok(url) = env::var(url_var) {
        return Ok(url);
    }

    let host = env::var(host_var).map_err(|_| ConfigError::MissingVar(url_var))?;
    let port: u16 = parse_var(port_var)?.ok_or(ConfigError::MissingVar(port_var))?;
    Ok(format!("http://{host}:{port}"))
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or malformed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            app: AppSettings {
                name: env::var("APP_NAME").unwrap_or_else(|_| default_app_name()),
                env: env::var("APP_ENV")
                    .ok()
                    .and_then(|s| match s.to_lowercase().as_str() {
                        "production" => Some(Environment::Production),
                        "staging" => Some(Environment::Staging),
                        "development" => Some(Environment::Development),
                        _ => None,
                    })
                    .unwrap_or_default(),
            },
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| default_host()),
                port: parse_var("SERVER_PORT")?.ok_or(ConfigError::MissingVar("SERVER_PORT"))?,
            },
            credential: CredentialConfig {
                secret: env::var("SECRET_KEY")
                    .ok()
                    .filter(|s| !s.is_empty())
                    .ok_or(ConfigError::MissingVar("SECRET_KEY"))?,
                ttl_secs: parse_var("CREDENTIAL_TTL_SECS")?
                    .unwrap_or_else(default_credential_ttl_secs),
            },
            worker: UpstreamConfig {
                url: service_url("WORKER_URL", "WORKER_HOST", "WORKER_PORT")?,
                prefix: env::var("WORKER_PREFIX").unwrap_or_else(|_| default_worker_prefix()),
                timeout_secs: parse_var("WORKER_TIMEOUT_SECS")?
                    .unwrap_or_else(default_upstream_timeout_secs),
            },
            profiles: UpstreamConfig {
                url: service_url(
                    "PROFILE_SERVICE_URL",
                    "PROFILE_SERVICE_HOST",
                    "PROFILE_SERVICE_PORT",
                )?,
                prefix: String::new(),
                timeout_secs: parse_var("PROFILE_SERVICE_TIMEOUT_SECS")?
                    .unwrap_or_else(default_upstream_timeout_secs),
            },
            chat: ChatConfig {
                history_backend: match env::var("HISTORY_BACKEND") {
                    Ok(raw) => match raw.to_lowercase().as_str() {
                        "worker" => HistoryBackend::Worker,
                        "memory" => HistoryBackend::Memory,
                        _ => return Err(ConfigError::InvalidValue("HISTORY_BACKEND", raw)),
                    },
                    Err(_) => HistoryBackend::default(),
                },
                outbound_buffer: parse_var("CHAT_OUTBOUND_BUFFER")?
                    .unwrap_or_else(default_outbound_buffer),
                ping_interval_secs: parse_var("CHAT_PING_INTERVAL_SECS")?
                    .unwrap_or_else(default_ping_interval_secs),
                idle_timeout_secs: parse_var("CHAT_IDLE_TIMEOUT_SECS")?
                    .unwrap_or_else(default_idle_timeout_secs),
            },
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
