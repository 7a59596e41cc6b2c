//! Background keep-alive

use std::time::Duration;

use serde_json::Map;
use tracing::{debug, warn};

use super::connection::SerializedConnection;
use crate::domain::Action;

/// Send up to `max_count` Heartbeats, sleeping `interval` before each one.
///
/// Stops at the first failed round-trip and returns how many completed;
/// the caller decides what a short count means.
pub async fn heartbeat_loop(conn: SerializedConnection, interval: Duration, max_count: u32) -> u32 {
    let mut completed = 0;
    while completed < max_count {
        tokio::time::sleep(interval).await;
        match conn.call(Action::Heartbeat, Map::new()).await {
            Ok(_) => {
                completed += 1;
                debug!(completed, max_count, "Heartbeat acknowledged");
            }
            Err(e) => {
                warn!(error = %e, completed, max_count, "Heartbeat loop stopped early");
                break;
            }
        }
    }
    completed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::transport::{MemoryTransport, Transport};
    use serde_json::{json, Value};
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn runs_requested_iterations_at_interval() {
        let (client, mut server) = MemoryTransport::pair();
        let conn = SerializedConnection::new(Box::new(client));
        let started = Instant::now();

        let peer = tokio::spawn(async move {
            let mut arrivals = Vec::new();
            while let Ok(text) = server.receive().await {
                arrivals.push(started.elapsed());
                let request: Value = serde_json::from_str(&text).unwrap();
                assert_eq!(request[2], "Heartbeat");
                let reply = json!([3, request[1], {"currentTime": "2024-01-17T12:00:00Z"}]);
                server.send(reply.to_string()).await.unwrap();
            }
            arrivals
        });

        let completed = heartbeat_loop(conn.clone(), Duration::from_secs(10), 3).await;
        assert_eq!(completed, 3);
        assert_eq!(started.elapsed(), Duration::from_secs(30));

        drop(conn);
        let arrivals = peer.await.unwrap();
        let secs: Vec<u64> = arrivals.iter().map(|d| d.as_secs()).collect();
        assert_eq!(secs, vec![10, 20, 30]);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_early_on_mismatch() {
        let (client, mut server) = MemoryTransport::pair();
        let conn = SerializedConnection::new(Box::new(client));

        tokio::spawn(async move {
            let first: Value = serde_json::from_str(&server.receive().await.unwrap()).unwrap();
            server.send(json!([3, first[1], {}]).to_string()).await.unwrap();
            server.receive().await.unwrap();
            server.send(json!([3, "wrong", {}]).to_string()).await.unwrap();
            // Keep the peer open; the loop must not try again.
            let _ = server.receive().await;
        });

        assert_eq!(heartbeat_loop(conn, Duration::from_secs(1), 5).await, 1);
    }

    /// Acknowledge the first Heartbeat, answer the second with `bad`, then
    /// report how many more requests arrive before the client hangs up.
    async fn answer_then_fail(mut server: MemoryTransport, bad: fn(&Value) -> String) -> usize {
        let first: Value = serde_json::from_str(&server.receive().await.unwrap()).unwrap();
        server.send(json!([3, first[1], {}]).to_string()).await.unwrap();
        let second: Value = serde_json::from_str(&server.receive().await.unwrap()).unwrap();
        server.send(bad(&second)).await.unwrap();

        let mut extra = 0;
        while server.receive().await.is_ok() {
            extra += 1;
        }
        extra
    }

    #[tokio::test(start_paused = true)]
    async fn stops_early_on_invalid_json() {
        let (client, server) = MemoryTransport::pair();
        let conn = SerializedConnection::new(Box::new(client));
        let peer = tokio::spawn(answer_then_fail(server, |_| "{not json".to_string()));

        assert_eq!(heartbeat_loop(conn, Duration::from_secs(1), 5).await, 1);
        assert_eq!(peer.await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_early_on_call_error() {
        let (client, server) = MemoryTransport::pair();
        let conn = SerializedConnection::new(Box::new(client));
        let peer = tokio::spawn(answer_then_fail(server, |request| {
            json!([4, request[1], "InternalError", "heartbeat failed", {}]).to_string()
        }));

        assert_eq!(heartbeat_loop(conn, Duration::from_secs(1), 5).await, 1);
        assert_eq!(peer.await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_when_peer_gone() {
        let (client, server) = MemoryTransport::pair();
        drop(server);
        let conn = SerializedConnection::new(Box::new(client));
        assert_eq!(heartbeat_loop(conn, Duration::from_secs(1), 3).await, 0);
    }
}
