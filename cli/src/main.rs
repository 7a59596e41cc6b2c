//! OCPP 1.6 charge point simulator
//!
//! Connects to a central system, boots, reports Available, runs one
//! transaction with heartbeats and exits with 0 on success or 1 on the
//! first rejected step.
//!
//! ```sh
//! # Run with default config (~/.config/ocpp16-min/config.toml)
//! ocpp16-charge-point
//!
//! # Point at another central system
//! ocpp16-charge-point --url ws://10.0.0.5:9000 --charge-point-id CP_7
//!
//! # Validate config without connecting
//! ocpp16-charge-point --check
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};

use ocpp16_min::config::AppConfig;
use ocpp16_min::server::init_tracing;
use ocpp16_min::session::ChargePoint;

/// OCPP 1.6 charge point simulator.
#[derive(Parser, Debug)]
#[command(
    name = "ocpp16-charge-point",
    version,
    about = "Run one OCPP 1.6 charging session against a central system",
    long_about = "Boots, reports Available, starts a transaction, sends heartbeats \
                  and stops the transaction.\n\n\
                  Default config: ~/.config/ocpp16-min/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "OCPP_CONFIG")]
    config: Option<PathBuf>,

    /// Override the central system URL (without the charge point ID).
    #[arg(long)]
    url: Option<String>,

    /// Override the charge point ID appended to the URL.
    #[arg(long)]
    charge_point_id: Option<String>,

    /// Request a WebSocket subprotocol, e.g. ocpp1.6. The server must echo it.
    #[arg(long)]
    subprotocol: Option<String>,

    /// Override the number of heartbeats sent during the session.
    #[arg(long)]
    heartbeats: Option<u32>,

    /// Override the seconds between StartTransaction and StopTransaction.
    #[arg(long)]
    session_secs: Option<u64>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration file and exit without connecting.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(ocpp16_min::default_config_path);

    let mut config = match AppConfig::load(&config_path) {
        Ok(mut cfg) => {
            if let Some(ref level) = cli.log_level {
                cfg.logging.level = level.clone();
            }
            init_tracing(&cfg.logging);
            info!("Configuration loaded from {}", config_path.display());
            cfg
        }
        Err(e) => {
            let level = cli.log_level.as_deref().unwrap_or("info");
            tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::new(level))
                .init();
            warn!("Failed to load config from {}: {}", config_path.display(), e);
            warn!("Using default configuration.");
            AppConfig::default()
        }
    };

    if let Err(e) = config.apply_env_overrides() {
        error!("{}", e);
        return ExitCode::FAILURE;
    }

    // ── Apply CLI overrides ────────────────────────────────────
    let cp = &mut config.charge_point;
    if let Some(url) = cli.url {
        info!("CLI override: server_url = {}", url);
        cp.server_url = url;
    }
    if let Some(id) = cli.charge_point_id {
        info!("CLI override: charge_point_id = {}", id);
        cp.charge_point_id = id;
    }
    if let Some(protocol) = cli.subprotocol {
        info!("CLI override: subprotocol = {}", protocol);
        cp.subprotocol = Some(protocol);
    }
    if let Some(count) = cli.heartbeats {
        info!("CLI override: heartbeat_count = {}", count);
        cp.heartbeat_count = count;
    }
    if let Some(secs) = cli.session_secs {
        info!("CLI override: session_secs = {}", secs);
        cp.session_secs = secs;
    }

    if cli.check {
        println!("Configuration is valid");
        println!("   Config file : {}", config_path.display());
        println!("   Endpoint    : {}", cp.endpoint());
        println!("   Heartbeats  : {}", cp.heartbeat_count);
        println!("   Session     : {}s", cp.session_secs);
        return ExitCode::SUCCESS;
    }

    // ── Run the session ────────────────────────────────────────
    let mut charge_point = match ChargePoint::connect(config.charge_point.clone()).await {
        Ok(cp) => cp,
        Err(e) => {
            error!("Connection failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match charge_point.run().await {
        Ok(report) => {
            info!(
                transaction_id = report.transaction_id,
                heartbeats = report.heartbeats_completed,
                requested = report.heartbeats_requested,
                "Session complete"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Session failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn config_path_flag_parses() {
        let cli = Cli::try_parse_from([
            "ocpp16-charge-point",
            "--config",
            "/tmp/cp.toml",
            "--heartbeats",
            "5",
            "--subprotocol",
            "ocpp1.6",
            "--check",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/cp.toml")));
        assert_eq!(cli.heartbeats, Some(5));
        assert_eq!(cli.subprotocol.as_deref(), Some("ocpp1.6"));
        assert!(cli.check);
    }
}
