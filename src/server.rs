//! Reusable central-system runtime.
//!
//! Provides [`ServerHandle`] that owns the OCPP WebSocket server task and
//! its shutdown signal, plus the process-wide tracing and metrics setup
//! used by the binaries.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::application::{SharedTransactionRegistry, TransactionRegistry};
use crate::config::{AppConfig, LoggingConfig, MetricsConfig};
use crate::infrastructure::OcppServer;
use crate::support::shutdown::{listen_for_shutdown_signals, ShutdownSignal};

/// Handle to a running central system.
pub struct ServerHandle {
    /// Open transactions shared by all connections.
    pub registry: SharedTransactionRegistry,
    /// Address the WebSocket listener is bound to.
    pub local_addr: SocketAddr,

    shutdown: ShutdownSignal,
    shutdown_timeout: Duration,
    ws_task: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    /// Bind `[server] host:port` and start accepting charge points.
    pub async fn start(config: &AppConfig) -> std::io::Result<Self> {
        let listener = TcpListener::bind(config.server.address()).await?;
        Self::from_listener(listener, config)
    }

    /// Start serving on an already bound listener.
    pub fn from_listener(listener: TcpListener, config: &AppConfig) -> std::io::Result<Self> {
        let local_addr = listener.local_addr()?;
        let registry = TransactionRegistry::shared();
        let shutdown = ShutdownSignal::new();

        let server = OcppServer::new(config.server.clone(), registry.clone())
            .with_shutdown(shutdown.clone());

        let ws_task = tokio::spawn(async move {
            if let Err(e) = server.serve(listener).await {
                error!(error = %e, "WebSocket server error");
            }
        });

        Ok(Self {
            registry,
            local_addr,
            shutdown,
            shutdown_timeout: Duration::from_secs(config.server.shutdown_timeout),
            ws_task,
        })
    }

    /// Get a cloneable shutdown signal.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Trigger shutdown on SIGTERM / SIGINT.
    pub fn install_signal_handler(&self) {
        tokio::spawn(listen_for_shutdown_signals(self.shutdown.clone()));
    }

    /// Wait for the server task to stop after shutdown has been triggered.
    pub async fn wait(self) {
        match tokio::time::timeout(self.shutdown_timeout, self.ws_task).await {
            Ok(Ok(())) => info!("WebSocket server stopped"),
            Ok(Err(e)) => error!(error = %e, "WebSocket server task panicked"),
            Err(_) => warn!(
                timeout_secs = self.shutdown_timeout.as_secs(),
                "WebSocket server did not stop in time"
            ),
        }
        info!(
            open_transactions = self.registry.len(),
            "Central system shutdown complete"
        );
    }

    /// Trigger shutdown and wait for completion.
    pub async fn shutdown(self) {
        info!("Shutting down central system");
        self.shutdown.trigger();
        self.wait().await;
    }
}

/// Initialize tracing (logging) from the logging config.
///
/// `RUST_LOG` wins over the configured level. Call once per process.
pub fn init_tracing(config: &LoggingConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.level));

    match config.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}

/// Install the Prometheus exporter when metrics are enabled.
pub fn install_metrics(config: &MetricsConfig) -> Result<(), Box<dyn std::error::Error>> {
    if !config.enabled {
        return Ok(());
    }

    let listen: SocketAddr = config.listen.parse()?;
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(listen)
        .install()?;

    metrics::describe_counter!(
        "ocpp_messages_received_total",
        "Supported CALLs received, by action"
    );
    metrics::describe_counter!(
        "ocpp_protocol_errors_total",
        "Connections closed for a protocol violation"
    );
    metrics::describe_counter!(
        "ocpp_unsupported_actions_total",
        "CALLs answered with NotSupported"
    );
    metrics::describe_gauge!("ocpp_active_transactions", "Open transactions");

    info!(%listen, "Prometheus exporter listening");
    Ok(())
}
