pub mod chart;
pub mod dashboard;

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::Frame;

use crate::event::{ConnectionState, LogLevel, LogRecord, RouterEvent, SourceMode};
use crate::model::tick::Tick;
use crate::router::{MAX_UPDATE_INTERVAL_MS, MIN_UPDATE_INTERVAL_MS};
use crate::window::{AxisRange, SeriesId, MAX_MAX_POINTS, MIN_MAX_POINTS};

use chart::PriceChart;
use dashboard::{KeybindBar, LogPanel, MarketPanel, StatusBar};

const MAX_LOG_MESSAGES: usize = 200;
pub const INTERVAL_STEP_MS: u64 = 100;
pub const POINTS_STEP: usize = 50;
pub const VOLATILITY_STEP: f64 = 0.1;

/// Render-side mirror of the router, rebuilt purely from [`RouterEvent`]s.
pub struct AppState {
    pub symbol: String,
    pub symbols: Vec<String>,
    pub mode: SourceMode,
    pub connection: ConnectionState,
    pub running: bool,
    pub price: Vec<(i64, f64)>,
    pub bid: Vec<(i64, f64)>,
    pub ask: Vec<(i64, f64)>,
    pub range: Option<AxisRange>,
    pub last_tick: Option<Tick>,
    pub tick_count: u64,
    pub connection_errors: u64,
    pub update_interval_ms: u64,
    pub max_points: usize,
    pub volatility: f64,
    pub log_messages: Vec<LogRecord>,
}

impl AppState {
    pub fn new(symbol: &str, symbols: Vec<String>, mode: SourceMode) -> Self {
        Self {
            symbol: symbol.to_string(),
            symbols,
            mode,
            connection: ConnectionState::Disconnected,
            running: false,
            price: Vec::new(),
            bid: Vec::new(),
            ask: Vec::new(),
            range: None,
            last_tick: None,
            tick_count: 0,
            connection_errors: 0,
            update_interval_ms: 1_000,
            max_points: 100,
            volatility: 0.5,
            log_messages: Vec::new(),
        }
    }

    pub fn push_log(&mut self, record: LogRecord) {
        self.log_messages.push(record);
        if self.log_messages.len() > MAX_LOG_MESSAGES {
            self.log_messages.remove(0);
        }
    }

    pub fn apply(&mut self, event: RouterEvent) {
        match event {
            RouterEvent::Tick(tick) => {
                self.tick_count += 1;
                self.last_tick = Some(tick);
            }
            RouterEvent::RangeUpdated {
                series,
                range,
                points,
            } => {
                self.range = Some(range);
                match series {
                    SeriesId::Price => self.price = points,
                    SeriesId::Bid => self.bid = points,
                    SeriesId::Ask => self.ask = points,
                }
            }
            RouterEvent::WindowCleared => {
                self.price.clear();
                self.bid.clear();
                self.ask.clear();
                self.range = None;
                self.last_tick = None;
            }
            RouterEvent::ConnectionStateChanged(state) => self.connection = state,
            RouterEvent::ConnectionError(message) => {
                self.connection_errors += 1;
                self.push_log(LogRecord::new(
                    LogLevel::Error,
                    format!("Connection error: {}", message),
                ));
            }
            RouterEvent::SourceChanged(mode) => {
                self.mode = mode;
                self.running = true;
                self.tick_count = 0;
                if mode == SourceMode::Mock {
                    self.connection = ConnectionState::Disconnected;
                }
            }
            RouterEvent::SymbolChanged(symbol) => self.symbol = symbol,
            RouterEvent::Log(record) => self.push_log(record),
        }
    }

    /// Cycles through the configured symbols, wrapping at the end.
    pub fn next_symbol(&self) -> Option<String> {
        if self.symbols.is_empty() {
            return None;
        }
        let next = match self.symbols.iter().position(|s| s == &self.symbol) {
            Some(i) => (i + 1) % self.symbols.len(),
            None => 0,
        };
        Some(self.symbols[next].clone())
    }

    pub fn faster_interval(&self) -> u64 {
        self.update_interval_ms
            .saturating_sub(INTERVAL_STEP_MS)
            .max(MIN_UPDATE_INTERVAL_MS)
    }

    pub fn slower_interval(&self) -> u64 {
        (self.update_interval_ms + INTERVAL_STEP_MS).min(MAX_UPDATE_INTERVAL_MS)
    }

    pub fn more_points(&self) -> usize {
        (self.max_points + POINTS_STEP).min(MAX_MAX_POINTS)
    }

    pub fn fewer_points(&self) -> usize {
        self.max_points
            .saturating_sub(POINTS_STEP)
            .max(MIN_MAX_POINTS)
    }

    pub fn adjusted_volatility(&self, delta: f64) -> f64 {
        ((self.volatility + delta) * 10.0).round() / 10.0
    }
}

pub fn render(frame: &mut Frame, state: &AppState) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // status bar
            Constraint::Min(10),   // chart + market panel
            Constraint::Length(8), // activity log
            Constraint::Length(1), // keybinds
        ])
        .split(frame.area());

    frame.render_widget(
        StatusBar {
            symbol: &state.symbol,
            mode: state.mode,
            connection: state.connection,
            running: state.running,
            tick_count: state.tick_count,
            connection_errors: state.connection_errors,
            update_interval_ms: state.update_interval_ms,
            max_points: state.max_points,
        },
        outer[0],
    );

    let main_area = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(40), Constraint::Length(34)])
        .split(outer[1]);

    frame.render_widget(
        PriceChart::new(&state.symbol, &state.price)
            .bid(&state.bid)
            .ask(&state.ask)
            .range(state.range),
        main_area[0],
    );
    frame.render_widget(
        MarketPanel::new(state.last_tick.as_ref(), state.price.len()),
        main_area[1],
    );
    frame.render_widget(LogPanel::new(&state.log_messages), outer[2]);
    frame.render_widget(KeybindBar, outer[3]);
}
