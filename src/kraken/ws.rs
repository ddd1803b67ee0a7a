use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite;

use crate::event::ConnectionState;

pub const DEFAULT_ENDPOINT: &str = "wss://ws.kraken.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEventKind {
    Connected,
    Disconnected,
    Error(String),
    Text(String),
}

/// Event from one connection attempt. `generation` identifies the attempt so
/// that events from a torn-down connection can be ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEvent {
    pub generation: u64,
    pub kind: FeedEventKind,
}

/// Duplex transport to the exchange as seen by the router.
pub trait FeedLink {
    /// Starts connecting; completion arrives later as a `Connected` or an
    /// `Error` event.
    fn connect(&mut self, url: &str);
    /// Only delivered while connected; dropped otherwise.
    fn send(&mut self, payload: &str);
    /// Idempotent. Leaves the link `Disconnected` from any state.
    fn disconnect(&mut self);
    fn state(&self) -> ConnectionState;
    /// Applies an event to the local state. Returns `false` for events that
    /// belong to an older connection and must be ignored.
    fn accept(&mut self, event: &FeedEvent) -> bool;
}

/// Kraken WebSocket transport. Each `connect` spawns one task that owns the
/// socket and reports through the shared event channel.
pub struct FeedConnection {
    events_tx: mpsc::Sender<FeedEvent>,
    state: ConnectionState,
    generation: u64,
    outbound: Option<mpsc::UnboundedSender<String>>,
    stop: Option<watch::Sender<bool>>,
}

impl FeedConnection {
    pub fn new(events_tx: mpsc::Sender<FeedEvent>) -> Self {
        Self {
            events_tx,
            state: ConnectionState::Disconnected,
            generation: 0,
            outbound: None,
            stop: None,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl FeedLink for FeedConnection {
    fn connect(&mut self, url: &str) {
        if self.state != ConnectionState::Disconnected {
            self.disconnect();
        }
        self.generation += 1;
        self.state = ConnectionState::Connecting;

        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = watch::channel(false);
        self.outbound = Some(out_tx);
        self.stop = Some(stop_tx);

        tracing::info!(url, generation = self.generation, "connecting feed");
        tokio::spawn(run_connection(
            url.to_string(),
            self.generation,
            self.events_tx.clone(),
            out_rx,
            stop_rx,
        ));
    }

    fn send(&mut self, payload: &str) {
        if self.state != ConnectionState::Connected {
            tracing::debug!(state = %self.state, "dropping outbound frame while not connected");
            return;
        }
        if let Some(tx) = &self.outbound {
            if tx.send(payload.to_string()).is_err() {
                tracing::warn!("feed writer has gone away, outbound frame dropped");
            }
        }
    }

    fn disconnect(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(true);
        }
        self.outbound = None;
        if self.state != ConnectionState::Disconnected {
            tracing::info!(generation = self.generation, "feed disconnected by caller");
            // Anything the old task still reports is now stale.
            self.generation += 1;
        }
        self.state = ConnectionState::Disconnected;
    }

    fn state(&self) -> ConnectionState {
        self.state
    }

    fn accept(&mut self, event: &FeedEvent) -> bool {
        if event.generation != self.generation {
            return false;
        }
        match &event.kind {
            FeedEventKind::Connected => self.state = ConnectionState::Connected,
            FeedEventKind::Disconnected | FeedEventKind::Error(_) => {
                self.state = ConnectionState::Disconnected;
                self.outbound = None;
                self.stop = None;
            }
            FeedEventKind::Text(_) => {}
        }
        true
    }
}

impl Drop for FeedConnection {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(true);
        }
    }
}

async fn run_connection(
    url: String,
    generation: u64,
    events: mpsc::Sender<FeedEvent>,
    mut outbound: mpsc::UnboundedReceiver<String>,
    mut stop: watch::Receiver<bool>,
) {
    let emit = |kind: FeedEventKind| FeedEvent { generation, kind };

    let connect = tokio_tungstenite::connect_async(url.as_str());
    let ws_stream = tokio::select! {
        res = connect => match res {
            Ok((ws_stream, _resp)) => ws_stream,
            Err(e) => {
                tracing::warn!(error = %e, url = %url, "feed connect failed");
                let _ = events.send(emit(FeedEventKind::Error(e.to_string()))).await;
                return;
            }
        },
        _ = stop.changed() => return,
    };

    if events.send(emit(FeedEventKind::Connected)).await.is_err() {
        return;
    }
    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        if events.send(emit(FeedEventKind::Text(text))).await.is_err() {
                            return;
                        }
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        tracing::info!(?frame, "feed closed by server");
                        let _ = events.send(emit(FeedEventKind::Disconnected)).await;
                        return;
                    }
                    Some(Ok(_)) => {
                        // tokio-tungstenite queues pongs for pings itself
                    }
                    Some(Err(e)) => {
                        let _ = events.send(emit(FeedEventKind::Error(format!("read error: {}", e)))).await;
                        return;
                    }
                    None => {
                        let _ = events.send(emit(FeedEventKind::Disconnected)).await;
                        return;
                    }
                }
            }
            payload = outbound.recv() => {
                match payload {
                    Some(text) => {
                        if let Err(e) = write.send(tungstenite::Message::Text(text)).await {
                            let _ = events.send(emit(FeedEventKind::Error(format!("send error: {}", e)))).await;
                            return;
                        }
                    }
                    // Sender dropped: the owner disconnected.
                    None => {
                        let _ = write.close().await;
                        return;
                    }
                }
            }
            _ = stop.changed() => {
                let _ = write.close().await;
                return;
            }
        }
    }
}
