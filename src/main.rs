//! OCPP 1.6 Central System
//!
//! Reads configuration from a TOML file (`~/.config/ocpp16-min/config.toml`,
//! or the path in `OCPP_CONFIG`).

use std::path::PathBuf;

use tracing::{error, info};

use ocpp16_min::config::AppConfig;
use ocpp16_min::default_config_path;
use ocpp16_min::server::{init_tracing, install_metrics, ServerHandle};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Load configuration ─────────────────────────────────────
    let config_path = std::env::var("OCPP_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| default_config_path());

    let (mut config, load_error) = match AppConfig::load(&config_path) {
        Ok(cfg) => (cfg, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };
    config.apply_env_overrides()?;

    init_tracing(&config.logging);
    match load_error {
        None => info!("Configuration loaded from {}", config_path.display()),
        Some(e) => {
            error!("Failed to load config from {}: {}", config_path.display(), e);
            error!("Using default configuration.");
        }
    }

    install_metrics(&config.metrics)?;

    // ── Start server ───────────────────────────────────────────
    info!(
        service = config.logging.service_name.as_str(),
        heartbeat_interval = config.server.heartbeat_interval,
        "Starting OCPP 1.6 central system"
    );
    let handle = ServerHandle::start(&config).await?;
    handle.install_signal_handler();

    info!("Press Ctrl+C to shutdown gracefully.");

    handle.shutdown_signal().wait().await;
    handle.wait().await;

    Ok(())
}
