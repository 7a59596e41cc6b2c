//! Central system over a real WebSocket listener on 127.0.0.1.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;

use ocpp16_min::config::{AppConfig, ChargePointConfig};
use ocpp16_min::infrastructure::transport::ClientTransport;
use ocpp16_min::server::ServerHandle;
use ocpp16_min::session::ChargePoint;
use ocpp16_min::support::errors::TransportError;
use ocpp16_min::Transport;

async fn start_server(heartbeat_interval: u32) -> ServerHandle {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let mut config = AppConfig::default();
    config.server.heartbeat_interval = heartbeat_interval;
    ServerHandle::from_listener(listener, &config).unwrap()
}

#[tokio::test]
async fn echoes_ocpp16_subprotocol() {
    let server = start_server(10).await;

    let mut request = format!("ws://{}/CP_1", server.local_addr)
        .into_client_request()
        .unwrap();
    request
        .headers_mut()
        .insert("Sec-WebSocket-Protocol", HeaderValue::from_static("ocpp1.6"));
    let (_stream, response) = tokio_tungstenite::connect_async(request).await.unwrap();
    assert_eq!(
        response.headers().get("Sec-WebSocket-Protocol").unwrap(),
        "ocpp1.6"
    );

    server.shutdown().await;
}

#[tokio::test]
async fn client_requested_subprotocol_is_accepted() {
    let server = start_server(10).await;
    let options = ChargePointConfig {
        server_url: format!("ws://{}", server.local_addr),
        subprotocol: Some("ocpp1.6".to_string()),
        ..ChargePointConfig::default()
    };
    assert!(ChargePoint::connect(options).await.is_ok());

    server.shutdown().await;
}

#[tokio::test]
async fn charge_point_connects_to_server_without_subprotocol() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let plain = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        let text = ws.next().await.unwrap().unwrap().into_text().unwrap();
        let request: Value = serde_json::from_str(&text).unwrap();
        request[2].as_str().unwrap().to_string()
    });

    let options = ChargePointConfig {
        server_url: format!("ws://{addr}"),
        ..ChargePointConfig::default()
    };
    let mut cp = ChargePoint::connect(options).await.unwrap();
    // The plain server never answers; only the first CALL matters here.
    let run = tokio::spawn(async move { cp.run().await });
    assert_eq!(plain.await.unwrap(), "BootNotification");
    assert!(run.await.unwrap().is_err());
}

#[tokio::test]
async fn path_after_leading_slash_is_the_identity() {
    let server = start_server(10).await;
    let mut ws = ClientTransport::connect(&format!("ws://{}/ocpp/CP_1", server.local_addr), None)
        .await
        .unwrap();

    ws.send(
        json!([2, "t1", "StartTransaction", {"connectorId": 1, "idTag": "TEST", "meterStart": 3_000_000_000_i64, "timestamp": "t"}])
            .to_string(),
    )
    .await
    .unwrap();
    let reply: Value = serde_json::from_str(&ws.receive().await.unwrap()).unwrap();
    assert_eq!(reply[2]["transactionId"], 1);
    assert_eq!(server.registry.active_for("ocpp/CP_1"), vec![1]);
    assert!(server.registry.active_for("CP_1").is_empty());

    // Open transactions outlive the connection.
    ws.close(1000, "bye").await.unwrap();
    drop(ws);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(server.registry.contains(1));

    server.shutdown().await;
}

#[tokio::test]
async fn binary_frames_are_handled_like_text() {
    let server = start_server(10).await;
    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{}/CP_1", server.local_addr))
        .await
        .unwrap();

    let frame = json!([2, "h1", "Heartbeat", {}]).to_string().into_bytes();
    ws.send(Message::Binary(frame)).await.unwrap();
    let text = ws.next().await.unwrap().unwrap().into_text().unwrap();
    let reply: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(reply[0], 3);
    assert_eq!(reply[1], "h1");

    server.shutdown().await;
}

#[tokio::test]
async fn malformed_json_gets_error_text_and_close() {
    let server = start_server(10).await;
    let mut ws = ClientTransport::connect(&format!("ws://{}/CP_1", server.local_addr), None)
        .await
        .unwrap();

    ws.send("this is not json".into()).await.unwrap();
    let text = ws.receive().await.unwrap();
    assert!(text.starts_with("ERROR: invalid JSON ("), "{text}");
    assert!(matches!(
        ws.receive().await,
        Err(TransportError::ConnectionClosed)
    ));

    server.shutdown().await;
}

#[tokio::test]
async fn unsupported_action_keeps_connection_open() {
    let server = start_server(10).await;
    let mut ws = ClientTransport::connect(&format!("ws://{}/CP_1", server.local_addr), None)
        .await
        .unwrap();

    ws.send(json!([2, "m1", "Authorize", {"idTag": "TEST"}]).to_string())
        .await
        .unwrap();
    let reply: Value = serde_json::from_str(&ws.receive().await.unwrap()).unwrap();
    assert_eq!(reply[0], 4);
    assert_eq!(reply[1], "m1");
    assert_eq!(reply[2], "NotSupported");
    assert!(reply[3].as_str().unwrap().contains("BootNotification"));

    ws.send(json!([2, "h1", "Heartbeat", {}]).to_string())
        .await
        .unwrap();
    let reply: Value = serde_json::from_str(&ws.receive().await.unwrap()).unwrap();
    assert_eq!(reply[0], 3);
    assert_eq!(reply[1], "h1");

    server.shutdown().await;
}

#[tokio::test]
async fn out_of_range_connector_closes_without_mutation() {
    let server = start_server(10).await;
    let mut ws = ClientTransport::connect(&format!("ws://{}/CP_1", server.local_addr), None)
        .await
        .unwrap();

    ws.send(
        json!([2, "s1", "StatusNotification", {"connectorId": 2, "status": "Available", "errorCode": "NoError"}])
            .to_string(),
    )
    .await
    .unwrap();
    assert_eq!(
        ws.receive().await.unwrap(),
        "ERROR: connectorId must be 0 or 1"
    );
    assert!(ws.receive().await.is_err());
    assert!(server.registry.is_empty());

    server.shutdown().await;
}

#[tokio::test]
async fn short_end_to_end_run() {
    let server = start_server(1).await;
    let options = ChargePointConfig {
        server_url: format!("ws://{}", server.local_addr),
        heartbeat_count: 2,
        session_secs: 1,
        ..ChargePointConfig::default()
    };

    let mut cp = ChargePoint::connect(options).await.unwrap();
    let report = tokio::time::timeout(Duration::from_secs(10), cp.run())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(report.transaction_id, 1);
    assert_eq!(report.heartbeat_interval, 1);
    assert_eq!(report.heartbeats_completed, 2);
    assert!(server.registry.is_empty());

    server.shutdown().await;
}

#[tokio::test]
async fn connection_refused_is_reported() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let options = ChargePointConfig {
        server_url: format!("ws://{addr}"),
        ..ChargePointConfig::default()
    };
    assert!(ChargePoint::connect(options).await.is_err());
}
