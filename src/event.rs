use std::fmt;

use crate::model::tick::Tick;
use crate::window::{AxisRange, SeriesId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "DISCONNECTED"),
            Self::Connecting => write!(f, "CONNECTING"),
            Self::Connected => write!(f, "CONNECTED"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceMode {
    Mock,
    Live,
}

impl fmt::Display for SourceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mock => write!(f, "MOCK"),
            Self::Live => write!(f, "LIVE"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
    pub timestamp_ms: i64,
}

impl LogRecord {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Everything the core reports upward to the rendering layer.
#[derive(Debug, Clone, PartialEq)]
pub enum RouterEvent {
    Tick(Tick),
    RangeUpdated {
        series: SeriesId,
        range: AxisRange,
        points: Vec<(i64, f64)>,
    },
    /// The window was emptied (clear, symbol change or source switch).
    WindowCleared,
    ConnectionStateChanged(ConnectionState),
    ConnectionError(String),
    SourceChanged(SourceMode),
    SymbolChanged(String),
    Log(LogRecord),
}

pub type Listener = Box<dyn FnMut(&RouterEvent) + Send>;

/// Synchronous fan-out of [`RouterEvent`]s. Listeners run in registration
/// order on the emitting task.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Listener>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Listener) {
        self.listeners.push(listener);
    }

    pub fn emit(&mut self, event: RouterEvent) {
        for listener in &mut self.listeners {
            listener(&event);
        }
    }

    pub fn log(&mut self, level: LogLevel, message: impl Into<String>) {
        self.emit(RouterEvent::Log(LogRecord::new(level, message)));
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
