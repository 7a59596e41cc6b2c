//! Per-connection message loop

use tracing::{info, info_span};

use crate::application::{HandlerOutcome, OcppHandler};
use crate::infrastructure::transport::{Transport, CLOSE_PROTOCOL_ERROR};
use crate::support::errors::TransportError;

/// Process messages from one charge point until it disconnects or breaks
/// protocol.
///
/// Strictly sequential: each message is handled and answered before the
/// next one is read. A protocol violation sends `ERROR: <reason>` as plain
/// text and closes with code 1002.
pub async fn serve_connection<T>(transport: &mut T, handler: &OcppHandler) -> Result<(), TransportError>
where
    T: Transport + ?Sized,
{
    let charge_point_id = handler.charge_point_id.as_str();

    loop {
        let text = match transport.receive().await {
            Ok(text) => text,
            Err(TransportError::ConnectionClosed) => return Ok(()),
            Err(e) => return Err(e),
        };

        let outcome = {
            let span = info_span!("ws.message", charge_point_id, message_length = text.len());
            let _guard = span.enter();
            info!(raw = text.as_str(), "Received");
            handler.handle(&text)
        };

        match outcome {
            HandlerOutcome::Reply(reply) => {
                info!(charge_point_id, raw = reply.as_str(), "Sent");
                transport.send(reply).await?;
            }
            HandlerOutcome::Close(reason) => {
                transport.send(reason.clone()).await?;
                transport.close(CLOSE_PROTOCOL_ERROR, &reason).await?;
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::TransactionRegistry;
    use crate::infrastructure::transport::MemoryTransport;
    use serde_json::{json, Value};

    fn spawn_server() -> (MemoryTransport, tokio::task::JoinHandle<Result<(), TransportError>>) {
        let (client, mut server) = MemoryTransport::pair();
        let handler = OcppHandler::new("CP_1", TransactionRegistry::shared(), 10);
        let task = tokio::spawn(async move { serve_connection(&mut server, &handler).await });
        (client, task)
    }

    #[tokio::test]
    async fn replies_and_keeps_connection_open() {
        let (mut client, task) = spawn_server();

        client.send(json!([2, "h1", "Heartbeat", {}]).to_string()).await.unwrap();
        let reply: Value = serde_json::from_str(&client.receive().await.unwrap()).unwrap();
        assert_eq!(reply[0], 3);
        assert_eq!(reply[1], "h1");

        client.send(json!([2, "m1", "Authorize", {"idTag": "TEST"}]).to_string()).await.unwrap();
        let reply: Value = serde_json::from_str(&client.receive().await.unwrap()).unwrap();
        assert_eq!(reply[0], 4);
        assert_eq!(reply[2], "NotSupported");

        client.send(json!([2, "h2", "Heartbeat", {}]).to_string()).await.unwrap();
        assert!(client.receive().await.is_ok());

        drop(client);
        assert!(task.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn malformed_json_gets_error_text_then_close() {
        let (mut client, task) = spawn_server();

        client.send("[2, \"u\", ".into()).await.unwrap();
        let text = client.receive().await.unwrap();
        assert!(text.starts_with("ERROR: invalid JSON ("), "{text}");
        assert!(matches!(client.receive().await, Err(TransportError::ConnectionClosed)));
        assert_eq!(client.peer_close().map(|(code, _)| code), Some(CLOSE_PROTOCOL_ERROR));
        assert!(task.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn payload_violation_closes_with_reason() {
        let (mut client, task) = spawn_server();

        client
            .send(json!([2, "s", "StatusNotification", {"connectorId": 0, "status": "Faulted", "errorCode": "NoError"}]).to_string())
            .await
            .unwrap();
        assert_eq!(client.receive().await.unwrap(), "ERROR: status must be Available");
        assert!(client.receive().await.is_err());
        assert_eq!(
            client.peer_close(),
            Some((CLOSE_PROTOCOL_ERROR, "ERROR: status must be Available"))
        );
        assert!(task.await.unwrap().is_ok());
    }
}
