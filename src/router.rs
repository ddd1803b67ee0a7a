use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::event::{ConnectionState, EventBus, Listener, LogLevel, RouterEvent, SourceMode};
use crate::kraken::subscription::{FrameOutcome, SubscriptionManager};
use crate::kraken::types::ControlMessage;
use crate::kraken::ws::{FeedEvent, FeedEventKind, FeedLink, DEFAULT_ENDPOINT};
use crate::metrics::RouterMetrics;
use crate::mock::MockGenerator;
use crate::model::tick::Tick;
use crate::symbol::normalize;
use crate::window::{
    SeriesId, WindowBuffer, WindowSnapshot, DEFAULT_MAX_POINTS, MAX_MAX_POINTS, MIN_MAX_POINTS,
};

pub const MIN_UPDATE_INTERVAL_MS: u64 = 100;
pub const MAX_UPDATE_INTERVAL_MS: u64 = 5_000;
pub const BATCH_SPACING_MS: i64 = 1_000;

#[derive(Debug, Clone, PartialEq)]
pub struct RouterSettings {
    pub endpoint_url: String,
    pub symbol: String,
    pub mode: SourceMode,
    pub update_interval: Duration,
    pub max_points: usize,
    pub batch_size: usize,
    pub performance_logging: bool,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            endpoint_url: DEFAULT_ENDPOINT.to_string(),
            symbol: "BTCUSD".to_string(),
            mode: SourceMode::Mock,
            update_interval: Duration::from_millis(1_000),
            max_points: DEFAULT_MAX_POINTS,
            batch_size: 20,
            performance_logging: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RouterCommand {
    SwitchSource(SourceMode),
    SetSymbol(String),
    SetMaxPoints(usize),
    SetUpdateInterval(u64),
    SetVolatility(f64),
    ClearWindow,
    GenerateBatch,
    Start,
    Stop,
    Reconnect,
}

/// Owns the active tick source and routes its output into the chart window.
///
/// Exactly one source is active at a time. Mock ticks are pulled by the
/// caller's timer through [`DataSourceRouter::on_mock_timer`]; live ticks are
/// pushed through [`DataSourceRouter::on_feed_event`]. Both end up in the same
/// accept path, so listeners never see which source produced a tick.
pub struct DataSourceRouter<L: FeedLink> {
    mode: SourceMode,
    symbol: String,
    running: bool,
    endpoint_url: String,
    update_interval: Duration,
    batch_size: usize,
    performance_logging: bool,
    generator: MockGenerator,
    feed: L,
    subscriptions: SubscriptionManager,
    window: WindowBuffer,
    metrics: RouterMetrics,
    bus: EventBus,
}

impl<L: FeedLink> DataSourceRouter<L> {
    /// Nothing is produced until [`start`](Self::start) is called.
    pub fn new(settings: RouterSettings, mut generator: MockGenerator, feed: L) -> Self {
        let max_points = settings.max_points.clamp(MIN_MAX_POINTS, MAX_MAX_POINTS);
        let interval_ms = (settings.update_interval.as_millis() as u64)
            .clamp(MIN_UPDATE_INTERVAL_MS, MAX_UPDATE_INTERVAL_MS);
        let symbol = normalize(&settings.symbol);
        generator.set_symbol(&symbol);
        Self {
            mode: settings.mode,
            symbol,
            running: false,
            endpoint_url: settings.endpoint_url,
            update_interval: Duration::from_millis(interval_ms),
            batch_size: settings.batch_size,
            performance_logging: settings.performance_logging,
            generator,
            feed,
            subscriptions: SubscriptionManager::new(),
            window: WindowBuffer::new(max_points),
            metrics: RouterMetrics::default(),
            bus: EventBus::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Listener) {
        self.bus.subscribe(listener);
    }

    pub fn mode(&self) -> SourceMode {
        self.mode
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// True while the caller's mock timer should be producing ticks.
    pub fn mock_timer_active(&self) -> bool {
        self.running && self.mode == SourceMode::Mock
    }

    pub fn update_interval(&self) -> Duration {
        self.update_interval
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.feed.state()
    }

    /// Live mode is meant to be running but the link is down.
    pub fn needs_reconnect(&self) -> bool {
        self.running
            && self.mode == SourceMode::Live
            && self.feed.state() == ConnectionState::Disconnected
    }

    pub fn window(&self) -> &WindowBuffer {
        &self.window
    }

    pub fn snapshot(&self) -> WindowSnapshot {
        self.window.snapshot()
    }

    pub fn metrics(&self) -> &RouterMetrics {
        &self.metrics
    }

    pub fn generator(&self) -> &MockGenerator {
        &self.generator
    }

    pub fn subscriptions(&self) -> &SubscriptionManager {
        &self.subscriptions
    }

    pub fn feed(&self) -> &L {
        &self.feed
    }

    /// Emits a log record on behalf of the caller (e.g. its reconnect policy).
    pub fn log(&mut self, level: LogLevel, message: impl Into<String>) {
        self.bus.log(level, message);
    }

    pub fn apply(&mut self, command: RouterCommand) {
        debug!(?command, "router command");
        match command {
            RouterCommand::SwitchSource(mode) => self.switch_to(mode),
            RouterCommand::SetSymbol(symbol) => self.set_symbol(&symbol),
            RouterCommand::SetMaxPoints(n) => {
                let _ = self.set_max_points(n);
            }
            RouterCommand::SetUpdateInterval(ms) => {
                let _ = self.set_update_interval(ms);
            }
            RouterCommand::SetVolatility(v) => self.set_volatility(v),
            RouterCommand::ClearWindow => self.clear(),
            RouterCommand::GenerateBatch => {
                self.generate_batch();
            }
            RouterCommand::Start => self.start(),
            RouterCommand::Stop => self.stop(),
            RouterCommand::Reconnect => self.reconnect(),
        }
    }

    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        match self.mode {
            SourceMode::Mock => {
                info!(symbol = %self.symbol, interval_ms = self.update_interval.as_millis() as u64, "mock feed started");
                self.bus.log(
                    LogLevel::Info,
                    format!(
                        "Started mock feed for {} (interval: {}ms)",
                        self.symbol,
                        self.update_interval.as_millis()
                    ),
                );
            }
            SourceMode::Live => self.connect_live(),
        }
    }

    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        match self.mode {
            SourceMode::Mock => {
                info!("mock feed stopped");
                self.bus.log(LogLevel::Info, "Stopped mock feed");
            }
            SourceMode::Live => self.disconnect_live(),
        }
    }

    /// Stops the current source, empties the window and starts `mode`.
    pub fn switch_to(&mut self, mode: SourceMode) {
        if mode == self.mode {
            return;
        }
        self.stop();
        self.clear_window();
        self.metrics.reset();
        self.mode = mode;
        info!(mode = %mode, symbol = %self.symbol, "switched data source");
        self.bus.emit(RouterEvent::SourceChanged(mode));
        self.bus
            .log(LogLevel::Info, format!("Data source switched to {}", mode));
        self.start();
    }

    pub fn set_symbol(&mut self, symbol: &str) {
        let symbol = normalize(symbol);
        if symbol.is_empty() || symbol == self.symbol {
            return;
        }
        self.symbol = symbol.clone();
        self.clear_window();
        info!(symbol = %symbol, mode = %self.mode, "active symbol changed");
        self.bus.emit(RouterEvent::SymbolChanged(symbol.clone()));
        self.bus
            .log(LogLevel::Info, format!("Switched to symbol: {}", symbol));

        match self.mode {
            SourceMode::Mock => self.generator.set_symbol(&symbol),
            SourceMode::Live => {
                let messages = self.subscriptions.set_active_symbol(&symbol);
                self.send_control(messages);
            }
        }
    }

    /// Rejects values outside 50..=500 and keeps the previous capacity.
    pub fn set_max_points(&mut self, max_points: usize) -> Result<(), AppError> {
        if !(MIN_MAX_POINTS..=MAX_MAX_POINTS).contains(&max_points) {
            let err = AppError::InvalidCapacity {
                requested: max_points,
                min: MIN_MAX_POINTS,
                max: MAX_MAX_POINTS,
            };
            warn!(error = %err, kept = self.window.max_points(), "window capacity rejected");
            self.bus.log(LogLevel::Warn, err.to_string());
            return Err(err);
        }
        self.window.set_max_points(max_points)?;
        self.bus.log(
            LogLevel::Info,
            format!("Max data points changed to {}", max_points),
        );
        Ok(())
    }

    pub fn set_update_interval(&mut self, interval_ms: u64) -> Result<(), AppError> {
        if !(MIN_UPDATE_INTERVAL_MS..=MAX_UPDATE_INTERVAL_MS).contains(&interval_ms) {
            let err = AppError::Config(format!(
                "update interval {}ms outside {}..={}ms",
                interval_ms, MIN_UPDATE_INTERVAL_MS, MAX_UPDATE_INTERVAL_MS
            ));
            warn!(error = %err, "update interval rejected");
            self.bus.log(LogLevel::Warn, err.to_string());
            return Err(err);
        }
        self.update_interval = Duration::from_millis(interval_ms);
        self.bus.log(
            LogLevel::Info,
            format!("Update interval changed to {}ms", interval_ms),
        );
        Ok(())
    }

    pub fn set_volatility(&mut self, volatility: f64) {
        self.generator.set_volatility(volatility);
        self.bus.log(
            LogLevel::Info,
            format!("Volatility set to {:.2}", self.generator.volatility()),
        );
    }

    pub fn clear(&mut self) {
        self.clear_window();
        self.metrics.reset();
        self.bus.log(LogLevel::Info, "Chart data cleared");
    }

    /// Fills the window with mock history ending now. Mock mode only.
    pub fn generate_batch(&mut self) -> usize {
        let now_ms = chrono::Utc::now().timestamp_millis();
        self.generate_batch_at(now_ms)
    }

    pub fn generate_batch_at(&mut self, end_ts_ms: i64) -> usize {
        if self.mode != SourceMode::Mock {
            self.bus
                .log(LogLevel::Warn, "Batch generation is only available in mock mode");
            return 0;
        }
        let symbol = self.symbol.clone();
        let batch =
            self.generator
                .generate_batch(&symbol, self.batch_size, end_ts_ms, BATCH_SPACING_MS);
        let count = batch.len();
        for tick in batch {
            self.accept_tick(tick);
        }
        self.bus.log(
            LogLevel::Info,
            format!("Generated {} historical data points", count),
        );
        count
    }

    /// Tears down and reopens the live link. A stopped feed stays stopped.
    pub fn reconnect(&mut self) {
        if self.mode != SourceMode::Live {
            return;
        }
        if !self.running {
            debug!("reconnect ignored while the live feed is stopped");
            self.bus
                .log(LogLevel::Warn, "Live feed is stopped; start it to connect");
            return;
        }
        self.feed.disconnect();
        self.subscriptions
            .on_connection_state(ConnectionState::Disconnected);
        self.connect_live();
    }

    /// Produces one mock tick if the mock source is active. Late timer ticks
    /// after a stop or switch are ignored.
    pub fn on_mock_timer(&mut self) -> bool {
        let now_ms = chrono::Utc::now().timestamp_millis();
        self.on_mock_timer_at(now_ms)
    }

    pub fn on_mock_timer_at(&mut self, timestamp_ms: i64) -> bool {
        if !self.mock_timer_active() {
            return false;
        }
        let symbol = self.symbol.clone();
        let tick = self.generator.generate_tick_at(&symbol, timestamp_ms);
        self.accept_tick(tick)
    }

    pub fn on_feed_event(&mut self, event: FeedEvent) {
        if !self.feed.accept(&event) {
            debug!(generation = event.generation, "ignoring event from stale connection");
            return;
        }
        match event.kind {
            FeedEventKind::Connected => {
                info!(url = %self.endpoint_url, "feed connected");
                self.bus
                    .emit(RouterEvent::ConnectionStateChanged(ConnectionState::Connected));
                self.bus.log(LogLevel::Info, "WebSocket connected");
                let messages = self
                    .subscriptions
                    .on_connection_state(ConnectionState::Connected);
                self.send_control(messages);
            }
            FeedEventKind::Disconnected => {
                warn!("feed disconnected");
                self.subscriptions
                    .on_connection_state(ConnectionState::Disconnected);
                self.bus.emit(RouterEvent::ConnectionStateChanged(
                    ConnectionState::Disconnected,
                ));
                self.bus.log(LogLevel::Warn, "WebSocket disconnected");
            }
            FeedEventKind::Error(description) => {
                warn!(error = %description, "feed error");
                self.subscriptions
                    .on_connection_state(ConnectionState::Disconnected);
                self.bus
                    .emit(RouterEvent::ConnectionError(description.clone()));
                self.bus.emit(RouterEvent::ConnectionStateChanged(
                    ConnectionState::Disconnected,
                ));
                self.bus
                    .log(LogLevel::Error, format!("WebSocket error: {}", description));
            }
            FeedEventKind::Text(text) => self.handle_frame(&text),
        }
    }

    fn handle_frame(&mut self, text: &str) {
        match self.subscriptions.handle_frame(text) {
            FrameOutcome::Trades {
                ticks,
                stale,
                rejected,
            } => {
                if stale > 0 {
                    self.metrics.stale_discarded += stale as u64;
                }
                if rejected > 0 {
                    self.metrics.records_dropped += rejected as u64;
                    warn!(rejected, "skipped malformed trade records");
                    self.bus.log(
                        LogLevel::Warn,
                        format!("Skipped {} malformed trade record(s)", rejected),
                    );
                }
                for tick in ticks {
                    self.accept_tick(tick);
                }
            }
            FrameOutcome::Heartbeat => debug!("heartbeat"),
            FrameOutcome::Control {
                event,
                pair,
                status,
                error,
            } => {
                let subject = match &pair {
                    Some(pair) => format!("{} {}", event, pair),
                    None => event.clone(),
                };
                match error {
                    Some(message) => {
                        warn!(event = %event, pair = ?pair, error = %message, "feed reported an error");
                        self.bus
                            .log(LogLevel::Warn, format!("{}: {}", subject, message));
                    }
                    None => {
                        info!(event = %event, pair = ?pair, status = ?status, "feed control message");
                        let line = match status {
                            Some(status) => format!("{}: {}", subject, status),
                            None => subject,
                        };
                        self.bus.log(LogLevel::Info, line);
                    }
                }
            }
            FrameOutcome::Dropped(reason) => {
                self.metrics.frames_dropped += 1;
                warn!(reason = %reason, "dropped inbound frame");
                self.bus
                    .log(LogLevel::Warn, format!("Dropped frame: {}", reason));
            }
        }
    }

    /// Single entry point for ticks from either source.
    fn accept_tick(&mut self, tick: Tick) -> bool {
        if tick.symbol != self.symbol {
            self.metrics.stale_discarded += 1;
            debug!(symbol = %tick.symbol, active = %self.symbol, "discarding tick for inactive symbol");
            return false;
        }
        let started = Instant::now();
        self.window.push_tick(&tick);
        self.bus.emit(RouterEvent::Tick(tick));
        if let Some(range) = self.window.range() {
            for series in SeriesId::ALL {
                let points = self.window.series(series).to_vec();
                self.bus.emit(RouterEvent::RangeUpdated {
                    series,
                    range,
                    points,
                });
            }
        }
        self.metrics.record_update(started.elapsed());

        if self.performance_logging && self.metrics.summary_due() {
            let avg = self.metrics.average_update_micros().unwrap_or(0.0);
            info!(updates = self.metrics.updates, avg_micros = avg, "router performance");
            self.bus.log(
                LogLevel::Info,
                format!(
                    "Performance: {} updates, avg {:.1} µs",
                    self.metrics.updates, avg
                ),
            );
        }
        true
    }

    fn connect_live(&mut self) {
        let symbol = self.symbol.clone();
        self.subscriptions
            .on_connection_state(ConnectionState::Connecting);
        // Only records the symbol; the subscribe goes out on Connected.
        let pending = self.subscriptions.set_active_symbol(&symbol);
        self.send_control(pending);

        self.feed.connect(&self.endpoint_url);
        self.bus
            .emit(RouterEvent::ConnectionStateChanged(ConnectionState::Connecting));
        self.bus.log(
            LogLevel::Info,
            format!("Connecting to {} for {}", self.endpoint_url, symbol),
        );
    }

    fn disconnect_live(&mut self) {
        let was = self.feed.state();
        self.feed.disconnect();
        self.subscriptions
            .on_connection_state(ConnectionState::Disconnected);
        if was != ConnectionState::Disconnected {
            self.bus.emit(RouterEvent::ConnectionStateChanged(
                ConnectionState::Disconnected,
            ));
            self.bus.log(LogLevel::Info, "Live feed disconnected");
        }
    }

    fn send_control(&mut self, messages: Vec<ControlMessage>) {
        for message in messages {
            match message.to_json() {
                Ok(json) => {
                    info!(event = ?message.event, pair = ?message.pair, "sending control message");
                    self.feed.send(&json);
                    self.bus.log(
                        LogLevel::Info,
                        format!("{:?} {}", message.event, message.pair.join(",")),
                    );
                }
                Err(e) => {
                    warn!(error = %e, "failed to encode control message");
                    self.bus
                        .log(LogLevel::Error, format!("Control message not sent: {}", e));
                }
            }
        }
    }

    fn clear_window(&mut self) {
        self.window.clear();
        self.bus.emit(RouterEvent::WindowCleared);
    }
}
