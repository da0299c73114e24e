//! # lingua-common
//!
//! Shared utilities including configuration, error handling, room credentials, and telemetry.

pub mod auth;
pub mod config;
pub mod error;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use auth::{CredentialAuthority, RoomClaims, DEFAULT_CREDENTIAL_TTL};
pub use config::{
    AppConfig, AppSettings, ChatConfig, ConfigError, CredentialConfig, Environment,
    HistoryBackend, ServerConfig, UpstreamConfig,
};
pub use error::{AppError, AppResult, ErrorResponse};
pub use telemetry::{
    init_tracing, init_tracing_with_config, try_init_tracing, try_init_tracing_with_config,
    TracingConfig, TracingError,
};
