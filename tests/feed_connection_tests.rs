use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;

use lightning_trade::event::ConnectionState;
use lightning_trade::kraken::ws::{FeedConnection, FeedEvent, FeedEventKind, FeedLink};

const TRADE_FRAME: &str = r#"[0,[["5541.2","0.15","1534614057.321"]],"trade","XBT/USD"]"#;

async fn next_event(rx: &mut mpsc::Receiver<FeedEvent>) -> FeedEvent {
    timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for feed event")
        .expect("event channel closed")
}

#[tokio::test]
async fn connects_sends_receives_and_reports_close() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        let first = ws.next().await.unwrap().unwrap();
        ws.send(Message::Text(TRADE_FRAME.to_string())).await.unwrap();
        ws.close(None).await.unwrap();
        first.into_text().unwrap()
    });

    let (tx, mut rx) = mpsc::channel(16);
    let mut feed = FeedConnection::new(tx);
    feed.connect(&format!("ws://{}", addr));
    assert_eq!(feed.state(), ConnectionState::Connecting);

    // Nothing goes out before the handshake completes.
    feed.send("dropped");

    let ev = next_event(&mut rx).await;
    assert_eq!(ev.kind, FeedEventKind::Connected);
    assert!(feed.accept(&ev));
    assert_eq!(feed.state(), ConnectionState::Connected);

    feed.send(r#"{"event":"subscribe"}"#);
    let ev = next_event(&mut rx).await;
    assert_eq!(ev.kind, FeedEventKind::Text(TRADE_FRAME.to_string()));
    assert!(feed.accept(&ev));

    let ev = next_event(&mut rx).await;
    assert_eq!(ev.kind, FeedEventKind::Disconnected);
    assert!(feed.accept(&ev));
    assert_eq!(feed.state(), ConnectionState::Disconnected);

    assert_eq!(server.await.unwrap(), r#"{"event":"subscribe"}"#);
}

#[tokio::test]
async fn refused_connection_reports_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (tx, mut rx) = mpsc::channel(16);
    let mut feed = FeedConnection::new(tx);
    feed.connect(&format!("ws://{}", addr));

    let ev = next_event(&mut rx).await;
    assert!(matches!(ev.kind, FeedEventKind::Error(_)));
    assert!(feed.accept(&ev));
    assert_eq!(feed.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn disconnect_is_idempotent_and_retires_old_events() {
    let (tx, _rx) = mpsc::channel(16);
    let mut feed = FeedConnection::new(tx);
    feed.disconnect();
    assert_eq!(feed.state(), ConnectionState::Disconnected);
    assert_eq!(feed.generation(), 0);

    feed.connect("ws://127.0.0.1:9");
    let old = feed.generation();
    feed.disconnect();
    feed.disconnect();
    assert_eq!(feed.state(), ConnectionState::Disconnected);

    let late = FeedEvent {
        generation: old,
        kind: FeedEventKind::Connected,
    };
    assert!(!feed.accept(&late));
    assert_eq!(feed.state(), ConnectionState::Disconnected);
}
