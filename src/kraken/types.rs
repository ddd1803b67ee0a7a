use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppError;

pub const TRADE_CHANNEL: &str = "trade";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionAction {
    Subscribe,
    Unsubscribe,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionChannel {
    pub name: String,
}

/// Outbound subscribe/unsubscribe request:
/// `{"event":"subscribe","pair":["XBT/USD"],"subscription":{"name":"trade"}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlMessage {
    pub event: SubscriptionAction,
    pub pair: Vec<String>,
    pub subscription: SubscriptionChannel,
}

impl ControlMessage {
    pub fn subscribe(wire_pair: &str) -> Self {
        Self::trade(SubscriptionAction::Subscribe, wire_pair)
    }

    pub fn unsubscribe(wire_pair: &str) -> Self {
        Self::trade(SubscriptionAction::Unsubscribe, wire_pair)
    }

    fn trade(event: SubscriptionAction, wire_pair: &str) -> Self {
        Self {
            event,
            pair: vec![wire_pair.to_string()],
            subscription: SubscriptionChannel {
                name: TRADE_CHANNEL.to_string(),
            },
        }
    }

    pub fn to_json(&self) -> Result<String, AppError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Inbound object-shaped frame (`heartbeat`, `systemStatus`,
/// `subscriptionStatus`, ...).
#[derive(Debug, Clone, Deserialize)]
pub struct ControlFrame {
    pub event: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub pair: Option<String>,
    #[serde(default, rename = "errorMessage")]
    pub error_message: Option<String>,
}

/// One trade from the `trade` channel, numbers already parsed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeRecord {
    pub price: f64,
    pub volume: f64,
    pub time_ms: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradeBatch {
    pub wire_pair: String,
    pub trades: Vec<TradeRecord>,
    /// Records skipped because a field was missing or not numeric.
    pub rejected: usize,
}

/// Kraken sends numbers as strings; accept both encodings.
fn value_to_f64(v: &Value) -> Option<f64> {
    let parsed = match v {
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    };
    parsed.filter(|x| x.is_finite())
}

fn decode_trade(record: &Value) -> Option<TradeRecord> {
    let fields = record.as_array()?;
    let price = value_to_f64(fields.first()?)?;
    let time_secs = value_to_f64(fields.get(2)?)?;
    let volume = fields.get(1).and_then(value_to_f64).unwrap_or(0.0);
    Some(TradeRecord {
        price,
        volume,
        time_ms: (time_secs * 1000.0).round() as i64,
    })
}

/// Decodes `[channelId, [[price, volume, time, ...], ...], "trade", pair]`.
///
/// Shape errors reject the whole frame; a bad record only skips itself.
pub fn decode_trade_frame(frame: &[Value]) -> Result<TradeBatch, AppError> {
    if frame.len() < 4 {
        return Err(AppError::Decode(format!(
            "trade frame has {} elements, expected 4",
            frame.len()
        )));
    }
    let channel = frame[frame.len() - 2]
        .as_str()
        .ok_or_else(|| AppError::Decode("channel name is not a string".to_string()))?;
    if channel != TRADE_CHANNEL {
        return Err(AppError::Decode(format!("unexpected channel '{}'", channel)));
    }
    let wire_pair = frame[frame.len() - 1]
        .as_str()
        .ok_or_else(|| AppError::Decode("pair is not a string".to_string()))?
        .to_string();
    let records = frame[1]
        .as_array()
        .ok_or_else(|| AppError::Decode("trade payload is not an array".to_string()))?;

    let mut trades = Vec::with_capacity(records.len());
    let mut rejected = 0;
    for record in records {
        match decode_trade(record) {
            Some(t) => trades.push(t),
            None => rejected += 1,
        }
    }
    Ok(TradeBatch {
        wire_pair,
        trades,
        rejected,
    })
}
