use lightning_trade::event::{ConnectionState, LogLevel, LogRecord, RouterEvent, SourceMode};
use lightning_trade::model::tick::Tick;
use lightning_trade::ui::AppState;
use lightning_trade::window::{AxisRange, SeriesId};

fn state() -> AppState {
    AppState::new(
        "BTCUSD",
        vec!["BTCUSD".to_string(), "ETHUSD".to_string()],
        SourceMode::Mock,
    )
}

fn tick(price: f64) -> Tick {
    Tick {
        symbol: "BTCUSD".to_string(),
        price,
        bid: price,
        ask: price,
        high: price,
        low: price,
        open: price,
        volume: 1,
        timestamp_ms: 1,
    }
}

#[test]
fn tick_and_range_events_update_chart_state() {
    let mut s = state();
    s.apply(RouterEvent::Tick(tick(10.0)));
    s.apply(RouterEvent::RangeUpdated {
        series: SeriesId::Bid,
        range: AxisRange { min: 9.0, max: 11.0 },
        points: vec![(1, 10.0)],
    });
    assert_eq!(s.tick_count, 1);
    assert_eq!(s.last_tick.as_ref().map(|t| t.price), Some(10.0));
    assert_eq!(s.bid, vec![(1, 10.0)]);
    assert!(s.price.is_empty());
    assert_eq!(s.range, Some(AxisRange { min: 9.0, max: 11.0 }));

    s.apply(RouterEvent::WindowCleared);
    assert!(s.bid.is_empty());
    assert!(s.range.is_none());
    assert!(s.last_tick.is_none());
}

#[test]
fn connection_and_source_events_update_status() {
    let mut s = state();
    s.apply(RouterEvent::SourceChanged(SourceMode::Live));
    assert_eq!(s.mode, SourceMode::Live);
    assert!(s.running);
    s.apply(RouterEvent::ConnectionStateChanged(ConnectionState::Connected));
    assert_eq!(s.connection, ConnectionState::Connected);
    s.apply(RouterEvent::ConnectionError("reset".to_string()));
    assert_eq!(s.connection_errors, 1);
    assert_eq!(s.log_messages.last().map(|r| r.level), Some(LogLevel::Error));
    s.apply(RouterEvent::SymbolChanged("ETHUSD".to_string()));
    assert_eq!(s.symbol, "ETHUSD");
}

#[test]
fn log_is_capped() {
    let mut s = state();
    for i in 0..250 {
        s.apply(RouterEvent::Log(LogRecord::new(LogLevel::Info, format!("m{}", i))));
    }
    assert_eq!(s.log_messages.len(), 200);
    assert_eq!(s.log_messages[0].message, "m50");
}

#[test]
fn adjustments_stay_within_router_bounds() {
    let mut s = state();
    assert_eq!(s.next_symbol().as_deref(), Some("ETHUSD"));
    s.symbol = "ETHUSD".to_string();
    assert_eq!(s.next_symbol().as_deref(), Some("BTCUSD"));

    s.update_interval_ms = 100;
    assert_eq!(s.faster_interval(), 100);
    s.update_interval_ms = 5_000;
    assert_eq!(s.slower_interval(), 5_000);

    s.max_points = 500;
    assert_eq!(s.more_points(), 500);
    s.max_points = 50;
    assert_eq!(s.fewer_points(), 50);

    s.volatility = 0.5;
    assert_eq!(s.adjusted_volatility(0.1), 0.6);
}
