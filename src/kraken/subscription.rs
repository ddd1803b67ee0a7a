use serde_json::Value;
use tracing::{debug, info, warn};

use super::types::{decode_trade_frame, ControlFrame, ControlMessage};
use crate::event::ConnectionState;
use crate::model::session::SessionTracker;
use crate::model::tick::Tick;
use crate::symbol::{from_wire_symbol, normalize, to_wire_symbol};

/// What one inbound frame turned into.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    Trades {
        ticks: Vec<Tick>,
        /// Trades for a symbol other than the active one.
        stale: usize,
        /// Records skipped for missing or non-numeric fields.
        rejected: usize,
    },
    Heartbeat,
    Control {
        event: String,
        pair: Option<String>,
        status: Option<String>,
        error: Option<String>,
    },
    Dropped(String),
}

/// Kraken subscription protocol without I/O: decides which control messages
/// to send and turns inbound text frames into ticks. The caller owns the
/// transport and reports state changes through
/// [`SubscriptionManager::on_connection_state`].
#[derive(Debug, Clone)]
pub struct SubscriptionManager {
    /// Last symbol a subscribe was sent for on the current connection.
    previous_symbol: Option<String>,
    current_symbol: Option<String>,
    connection_state: ConnectionState,
    sessions: SessionTracker,
}

impl Default for SubscriptionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SubscriptionManager {
    pub fn new() -> Self {
        Self {
            previous_symbol: None,
            current_symbol: None,
            connection_state: ConnectionState::Disconnected,
            sessions: SessionTracker::new(),
        }
    }

    pub fn current_symbol(&self) -> Option<&str> {
        self.current_symbol.as_deref()
    }

    pub fn previous_symbol(&self) -> Option<&str> {
        self.previous_symbol.as_deref()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection_state
    }

    /// Returns the control messages to send, in order. Nothing is returned
    /// unless connected; the subscribe is then issued on connect.
    pub fn set_active_symbol(&mut self, symbol: &str) -> Vec<ControlMessage> {
        let symbol = normalize(symbol);
        if self.current_symbol.as_deref() == Some(symbol.as_str()) {
            return Vec::new();
        }
        self.current_symbol = Some(symbol.clone());
        self.sessions.restart(&symbol);
        if self.connection_state != ConnectionState::Connected {
            debug!(symbol = %symbol, state = %self.connection_state, "subscription deferred until connected");
            return Vec::new();
        }

        let mut out = Vec::with_capacity(2);
        if let Some(prev) = self.previous_symbol.take() {
            if prev != symbol {
                out.push(ControlMessage::unsubscribe(&to_wire_symbol(&prev)));
            }
        }
        out.push(ControlMessage::subscribe(&to_wire_symbol(&symbol)));
        self.previous_symbol = Some(symbol);
        out
    }

    /// Subscriptions do not survive a reconnect: on `Connected` the active
    /// symbol is subscribed again, on `Disconnected` the server-side state is
    /// forgotten.
    pub fn on_connection_state(&mut self, state: ConnectionState) -> Vec<ControlMessage> {
        self.connection_state = state;
        match state {
            ConnectionState::Connected => match self.current_symbol.clone() {
                Some(symbol) => {
                    info!(symbol = %symbol, "subscribing active symbol after connect");
                    self.sessions.restart(&symbol);
                    self.previous_symbol = Some(symbol.clone());
                    vec![ControlMessage::subscribe(&to_wire_symbol(&symbol))]
                }
                None => Vec::new(),
            },
            ConnectionState::Disconnected | ConnectionState::Connecting => {
                self.previous_symbol = None;
                Vec::new()
            }
        }
    }

    pub fn handle_frame(&mut self, text: &str) -> FrameOutcome {
        let value: Value = match serde_json::from_str(text) {
            Ok(v) => v,
            Err(e) => return FrameOutcome::Dropped(format!("malformed JSON: {}", e)),
        };
        match value {
            Value::Object(_) => match serde_json::from_value::<ControlFrame>(value) {
                Ok(frame) if frame.event == "heartbeat" => FrameOutcome::Heartbeat,
                Ok(frame) => FrameOutcome::Control {
                    event: frame.event,
                    pair: frame.pair,
                    status: frame.status,
                    error: frame.error_message,
                },
                Err(e) => FrameOutcome::Dropped(format!("unrecognised object frame: {}", e)),
            },
            Value::Array(items) => self.handle_trade_frame(&items),
            _ => FrameOutcome::Dropped("frame is neither an object nor an array".to_string()),
        }
    }

    fn handle_trade_frame(&mut self, items: &[Value]) -> FrameOutcome {
        let batch = match decode_trade_frame(items) {
            Ok(b) => b,
            Err(e) => return FrameOutcome::Dropped(e.to_string()),
        };
        let symbol = from_wire_symbol(&batch.wire_pair);
        let active = self.current_symbol.as_deref() == Some(symbol.as_str());
        if !active {
            warn!(
                symbol = %symbol,
                active = ?self.current_symbol,
                trades = batch.trades.len(),
                "discarding trades for inactive symbol"
            );
            return FrameOutcome::Trades {
                ticks: Vec::new(),
                stale: batch.trades.len(),
                rejected: batch.rejected,
            };
        }

        let ticks = batch
            .trades
            .iter()
            .map(|trade| {
                let session = self.sessions.observe(&symbol, trade.price);
                Tick {
                    symbol: symbol.clone(),
                    price: trade.price,
                    bid: trade.price,
                    ask: trade.price,
                    high: session.high,
                    low: session.low,
                    open: session.open,
                    volume: trade.volume.round() as i64,
                    timestamp_ms: trade.time_ms,
                }
            })
            .collect();
        FrameOutcome::Trades {
            ticks,
            stale: 0,
            rejected: batch.rejected,
        }
    }
}
