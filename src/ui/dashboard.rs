use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::event::{ConnectionState, LogLevel, LogRecord, SourceMode};
use crate::model::tick::Tick;

pub struct MarketPanel<'a> {
    last_tick: Option<&'a Tick>,
    window_len: usize,
}

impl<'a> MarketPanel<'a> {
    pub fn new(last_tick: Option<&'a Tick>, window_len: usize) -> Self {
        Self {
            last_tick,
            window_len,
        }
    }
}

impl Widget for MarketPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let dim = Style::default().fg(Color::DarkGray);
        let mut lines = match self.last_tick {
            Some(tick) => {
                let updated = chrono::DateTime::from_timestamp_millis(tick.timestamp_ms)
                    .map(|t| t.format("%H:%M:%S%.3f").to_string())
                    .unwrap_or_else(|| "--".to_string());
                vec![
                    Line::from(vec![
                        Span::styled("Price: ", dim),
                        Span::styled(
                            format!("${:.2}", tick.price),
                            Style::default()
                                .fg(Color::Cyan)
                                .add_modifier(Modifier::BOLD),
                        ),
                    ]),
                    Line::from(vec![
                        Span::styled("Volume: ", dim),
                        Span::styled(tick.volume.to_string(), Style::default().fg(Color::Green)),
                    ]),
                    Line::from(vec![
                        Span::styled("Bid/Ask: ", dim),
                        Span::styled(
                            format!(
                                "${:.2} / ${:.2} (Δ{:.4})",
                                tick.bid,
                                tick.ask,
                                tick.spread()
                            ),
                            Style::default().fg(Color::Yellow),
                        ),
                    ]),
                    Line::from(vec![
                        Span::styled("O/H/L: ", dim),
                        Span::styled(
                            format!("{:.2} / {:.2} / {:.2}", tick.open, tick.high, tick.low),
                            Style::default().fg(Color::White),
                        ),
                    ]),
                    Line::from(vec![
                        Span::styled("Last Update: ", dim),
                        Span::styled(updated, Style::default().fg(Color::White)),
                    ]),
                ]
            }
            None => vec![Line::from(Span::styled("Price: --", dim))],
        };
        lines.push(Line::from(vec![
            Span::styled("Window: ", dim),
            Span::styled(
                format!("{} pts", self.window_len),
                Style::default().fg(Color::Magenta),
            ),
        ]));

        let block = Block::default()
            .title(" Market ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        Paragraph::new(lines).block(block).render(area, buf);
    }
}

pub struct LogPanel<'a> {
    records: &'a [LogRecord],
}

impl<'a> LogPanel<'a> {
    pub fn new(records: &'a [LogRecord]) -> Self {
        Self { records }
    }
}

impl Widget for LogPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(" Activity Log ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        let inner_height = block.inner(area).height as usize;
        let start = self.records.len().saturating_sub(inner_height);
        let lines: Vec<Line> = self.records[start..]
            .iter()
            .map(|r| {
                let color = match r.level {
                    LogLevel::Info => Color::Gray,
                    LogLevel::Warn => Color::Yellow,
                    LogLevel::Error => Color::Red,
                };
                let ts = chrono::DateTime::from_timestamp_millis(r.timestamp_ms)
                    .map(|t| t.format("%H:%M:%S%.3f").to_string())
                    .unwrap_or_default();
                Line::from(vec![
                    Span::styled(format!("[{}] ", ts), Style::default().fg(Color::DarkGray)),
                    Span::styled(r.message.as_str(), Style::default().fg(color)),
                ])
            })
            .collect();
        Paragraph::new(lines).block(block).render(area, buf);
    }
}

pub struct StatusBar<'a> {
    pub symbol: &'a str,
    pub mode: SourceMode,
    pub connection: ConnectionState,
    pub running: bool,
    pub tick_count: u64,
    pub connection_errors: u64,
    pub update_interval_ms: u64,
    pub max_points: usize,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let sep = Span::styled(" | ", Style::default().fg(Color::DarkGray));
        let conn = match (self.mode, self.connection) {
            (SourceMode::Mock, _) => Span::styled("SIMULATED", Style::default().fg(Color::Blue)),
            (SourceMode::Live, ConnectionState::Connected) => {
                Span::styled("CONNECTED", Style::default().fg(Color::Green))
            }
            (SourceMode::Live, ConnectionState::Connecting) => {
                Span::styled("CONNECTING", Style::default().fg(Color::Yellow))
            }
            (SourceMode::Live, ConnectionState::Disconnected) => {
                Span::styled("DISCONNECTED", Style::default().fg(Color::Red))
            }
        };
        let run = if self.running {
            Span::styled(" RUNNING ", Style::default().fg(Color::Green))
        } else {
            Span::styled(
                " STOPPED ",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        };

        let line = Line::from(vec![
            Span::styled(
                " lightning-trade ",
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
            sep.clone(),
            Span::styled(self.symbol, Style::default().fg(Color::Cyan)),
            sep.clone(),
            Span::styled(self.mode.to_string(), Style::default().fg(Color::White)),
            sep.clone(),
            conn,
            sep.clone(),
            run,
            sep.clone(),
            Span::styled(
                format!(
                    "ticks: {} errors: {}",
                    self.tick_count, self.connection_errors
                ),
                Style::default().fg(Color::DarkGray),
            ),
            sep,
            Span::styled(
                format!("{}ms / {} pts", self.update_interval_ms, self.max_points),
                Style::default().fg(Color::DarkGray),
            ),
        ]);

        buf.set_line(area.x, area.y, &line, area.width);
    }
}

pub struct KeybindBar;

impl Widget for KeybindBar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let key = Style::default().fg(Color::Yellow);
        let text = Style::default().fg(Color::DarkGray);
        let pairs = [
            ("q", "quit"),
            ("m/l", "mock/live"),
            ("s", "symbol"),
            ("p", "start/stop"),
            ("c", "clear"),
            ("b", "batch"),
            ("+/-", "interval"),
            ("[/]", "points"),
            ("v/V", "volatility"),
            ("r", "reconnect"),
        ];
        let mut spans = Vec::with_capacity(pairs.len() * 2);
        for (k, label) in pairs {
            spans.push(Span::styled(format!(" {} ", k), key));
            spans.push(Span::styled(format!("{} ", label), text));
        }
        buf.set_line(area.x, area.y, &Line::from(spans), area.width);
    }
}
