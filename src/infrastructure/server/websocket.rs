//! WebSocket server for OCPP connections

use std::io;
use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tracing::{error, info, warn, Instrument};

use crate::application::{OcppHandler, SharedTransactionRegistry};
use crate::config::ServerConfig;
use crate::domain::OCPP16_SUBPROTOCOL;
use crate::infrastructure::transport::{Transport, WsTransport};
use crate::support::errors::TransportError;
use crate::support::shutdown::ShutdownSignal;

use super::connection::serve_connection;

/// Close code sent to connected charge points on server shutdown
const CLOSE_GOING_AWAY: u16 = 1001;

/// OCPP WebSocket server
pub struct OcppServer {
    config: ServerConfig,
    registry: SharedTransactionRegistry,
    shutdown_signal: Option<ShutdownSignal>,
}

impl OcppServer {
    pub fn new(config: ServerConfig, registry: SharedTransactionRegistry) -> Self {
        Self {
            config,
            registry,
            shutdown_signal: None,
        }
    }

    /// Set the shutdown signal for graceful shutdown
    pub fn with_shutdown(mut self, signal: ShutdownSignal) -> Self {
        self.shutdown_signal = Some(signal);
        self
    }

    /// Accept connections on `listener` until the shutdown signal fires.
    pub async fn serve(&self, listener: TcpListener) -> io::Result<()> {
        let addr = listener.local_addr()?;
        info!(%addr, "OCPP 1.6 central system listening");
        info!("Charge points should connect to: ws://{addr}/{{charge_point_id}}");

        let shutdown = self.shutdown_signal.clone().unwrap_or_default();
        loop {
            tokio::select! {
                result = listener.accept() => match result {
                    Ok((stream, peer)) => self.spawn_connection(stream, peer),
                    Err(e) => error!(error = %e, "Failed to accept connection"),
                },
                _ = shutdown.wait() => {
                    info!(
                        open_transactions = self.registry.len(),
                        "WebSocket server received shutdown signal"
                    );
                    return Ok(());
                }
            }
        }
    }

    fn spawn_connection(&self, stream: TcpStream, peer: SocketAddr) {
        let registry = self.registry.clone();
        let heartbeat_interval = self.config.heartbeat_interval;
        let shutdown = self.shutdown_signal.clone();

        tokio::spawn(async move {
            if let Err(e) =
                handle_connection(stream, peer, registry, heartbeat_interval, shutdown).await
            {
                warn!(%peer, error = %e, "Connection ended with error");
            }
        });
    }
}

/// Charge point ID from the request path: everything after the leading
/// slashes, so `/ocpp/CP_1` identifies as `ocpp/CP_1`. An empty path maps
/// to `unknown`.
pub fn extract_charge_point_id(path: &str) -> String {
    let id = path.trim_start_matches('/');

    if id.is_empty() {
        "unknown".to_string()
    } else {
        id.to_string()
    }
}

fn offers_ocpp16(requested: &str) -> bool {
    requested
        .split(',')
        .map(str::trim)
        .any(|p| p == OCPP16_SUBPROTOCOL)
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    registry: SharedTransactionRegistry,
    heartbeat_interval: u32,
    shutdown: Option<ShutdownSignal>,
) -> Result<(), TransportError> {
    let mut charge_point_id = String::new();

    let ws_stream = tokio_tungstenite::accept_hdr_async(stream, |req: &Request, mut response: Response| {
        charge_point_id = extract_charge_point_id(req.uri().path());

        let requested = req
            .headers()
            .get("Sec-WebSocket-Protocol")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if offers_ocpp16(requested) {
            response.headers_mut().insert(
                "Sec-WebSocket-Protocol",
                HeaderValue::from_static(OCPP16_SUBPROTOCOL),
            );
        } else if !requested.is_empty() {
            warn!(%peer, requested, "Client does not offer ocpp1.6, accepting anyway");
        }
        Ok(response)
    })
    .await
    .map_err(|e| TransportError::WebSocket(e.to_string()))?;

    let span = tracing::info_span!("ws.connection", charge_point_id = charge_point_id.as_str(), %peer);
    async move {
        info!("Charge point connected");
        let handler = OcppHandler::new(charge_point_id, registry, heartbeat_interval);
        let mut transport = WsTransport::new(ws_stream);
        let shutdown = shutdown.unwrap_or_default();

        let result = tokio::select! {
            result = serve_connection(&mut transport, &handler) => result,
            _ = shutdown.wait() => {
                info!("Closing connection due to server shutdown");
                transport.close(CLOSE_GOING_AWAY, "server shutdown").await
            }
        };

        let open = handler.registry.active_for(&handler.charge_point_id);
        if !open.is_empty() {
            warn!(open_transactions = ?open, "Charge point left with open transactions");
        }

        match result {
            Ok(()) | Err(TransportError::ConnectionClosed) => {
                info!("Charge point disconnected");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charge_point_id_from_path() {
        assert_eq!(extract_charge_point_id("/CP_1"), "CP_1");
        assert_eq!(extract_charge_point_id("/ocpp/CP_1"), "ocpp/CP_1");
        assert_eq!(extract_charge_point_id("//CP_1"), "CP_1");
        assert_eq!(extract_charge_point_id("/CP_1/"), "CP_1/");
        assert_eq!(extract_charge_point_id("/"), "unknown");
        assert_eq!(extract_charge_point_id(""), "unknown");
    }

    #[test]
    fn subprotocol_negotiation() {
        assert!(offers_ocpp16("ocpp1.6"));
        assert!(offers_ocpp16("ocpp2.0.1, ocpp1.6"));
        assert!(!offers_ocpp16("ocpp2.0.1"));
        assert!(!offers_ocpp16(""));
    }
}
