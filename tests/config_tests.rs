use std::time::Duration;

use lightning_trade::config::{Config, SourceKind};
use lightning_trade::event::SourceMode;

fn sample(endpoint: &str, interval_ms: u64, max_points: usize) -> String {
    format!(
        r#"
[feed]
endpoint_url = "{endpoint}"
symbol = "BTCUSD"
symbols = ["ETHUSD", "SOLUSD"]
source = "live"

[mock]
update_interval_ms = {interval_ms}
volatility = 0.3
spread_pct_low = 0.01
spread_pct_high = 0.2
volume_min = 100
volume_max = 1000
batch_size = 30

[window]
max_points = {max_points}

[ui]
refresh_rate_ms = 100
performance_logging = false

[logging]
level = "debug"
file = "test.log"
"#
    )
}

#[test]
fn parse_full_config() {
    let config = Config::from_toml_str(&sample("wss://ws.kraken.com", 500, 200)).unwrap();
    config.validate().unwrap();
    assert_eq!(config.feed.source, SourceKind::Live);
    assert_eq!(config.mock.batch_size, 30);
    assert_eq!(config.logging.file, "test.log");

    let settings = config.router_settings();
    assert_eq!(settings.mode, SourceMode::Live);
    assert_eq!(settings.update_interval, Duration::from_millis(500));
    assert_eq!(settings.max_points, 200);
    assert_eq!(settings.batch_size, 30);
    assert!(!settings.performance_logging);

    let params = config.mock.generator_params();
    assert_eq!(params.volatility, 0.3);
    assert_eq!(params.spread_pct_high, 0.2);
}

#[test]
fn shipped_default_config_is_valid() {
    let s = std::fs::read_to_string(concat!(env!("CARGO_MANIFEST_DIR"), "/config/default.toml"))
        .unwrap();
    let config = Config::from_toml_str(&s).unwrap();
    config.validate().unwrap();
    assert_eq!(config.feed.endpoint_url, "wss://ws.kraken.com");
    assert_eq!(config.window.max_points, 100);
}

#[test]
fn rejects_non_websocket_endpoint() {
    let config = Config::from_toml_str(&sample("https://ws.kraken.com", 500, 200)).unwrap();
    assert!(config.validate().is_err());
    let config = Config::from_toml_str(&sample("not a url", 500, 200)).unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn rejects_out_of_range_interval_and_capacity() {
    let config = Config::from_toml_str(&sample("wss://ws.kraken.com", 50, 200)).unwrap();
    assert!(config.validate().is_err());
    let config = Config::from_toml_str(&sample("wss://ws.kraken.com", 500, 20)).unwrap();
    assert!(config.validate().is_err());
    let config = Config::from_toml_str(&sample("wss://ws.kraken.com", 500, 501)).unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn malformed_toml_is_an_error() {
    assert!(Config::from_toml_str("[feed\nendpoint_url = 1").is_err());
}

#[test]
fn rejects_non_finite_spread_bounds() {
    let toml = sample("wss://ws.kraken.com", 500, 200)
        .replace("spread_pct_low = 0.01", "spread_pct_low = nan");
    let config = Config::from_toml_str(&toml).unwrap();
    assert!(config.validate().is_err());

    let toml = sample("wss://ws.kraken.com", 500, 200)
        .replace("spread_pct_high = 0.2", "spread_pct_high = inf");
    let config = Config::from_toml_str(&toml).unwrap();
    assert!(config.validate().is_err());
}
