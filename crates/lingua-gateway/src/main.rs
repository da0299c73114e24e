//! Lingua chat gateway entry point
//!
//! Run with:
//! ```bash
//! cargo run -p lingua-gateway
//! ```
//!
//! Configuration is loaded from environment variables (and `.env`).

use lingua_common::{try_init_tracing_with_config, AppConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Tracing format depends on APP_ENV, so configuration comes first
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    info!(
        app = %config.app.name,
        env = ?config.app.env,
        address = %config.server.address(),
        history_backend = ?config.chat.history_backend,
        "Configuration loaded"
    );

    if let Err(e) = lingua_gateway::run(config).await {
        error!(error = %e, "Gateway failed");
        std::process::exit(1);
    }
}
