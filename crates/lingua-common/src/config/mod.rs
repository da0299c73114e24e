//! Configuration structs

mod app_config;

pub use app_config::{
    AppConfig, AppSettings, ChatConfig, ConfigError, CredentialConfig, Environment,
    HistoryBackend, ServerConfig, UpstreamConfig,
};
