use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::event::SourceMode;
use crate::mock::GeneratorParams;
use crate::router::{RouterSettings, MAX_UPDATE_INTERVAL_MS, MIN_UPDATE_INTERVAL_MS};
use crate::symbol::normalize;
use crate::window::{MAX_MAX_POINTS, MIN_MAX_POINTS};

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
pub const FEED_URL_ENV: &str = "LIGHTNING_FEED_URL";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub feed: FeedConfig,
    pub mock: MockConfig,
    pub window: WindowConfig,
    pub ui: UiConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Mock,
    Live,
}

impl From<SourceKind> for SourceMode {
    fn from(kind: SourceKind) -> Self {
        match kind {
            SourceKind::Mock => SourceMode::Mock,
            SourceKind::Live => SourceMode::Live,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    pub endpoint_url: String,
    pub symbol: String,
    #[serde(default)]
    pub symbols: Vec<String>,
    #[serde(default = "default_source")]
    pub source: SourceKind,
}

fn default_source() -> SourceKind {
    SourceKind::Mock
}

#[derive(Debug, Clone, Deserialize)]
pub struct MockConfig {
    pub update_interval_ms: u64,
    pub volatility: f64,
    pub spread_pct_low: f64,
    pub spread_pct_high: f64,
    pub volume_min: i64,
    pub volume_max: i64,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_batch_size() -> usize {
    20
}

#[derive(Debug, Clone, Deserialize)]
pub struct WindowConfig {
    pub max_points: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UiConfig {
    pub refresh_rate_ms: u64,
    #[serde(default = "default_true")]
    pub performance_logging: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_file() -> String {
    "lightning-trade.log".to_string()
}

impl FeedConfig {
    /// Primary symbol first, then the rest, normalized and de-duplicated.
    pub fn selectable_symbols(&self) -> Vec<String> {
        let mut out = Vec::new();
        let primary = normalize(&self.symbol);
        if !primary.is_empty() {
            out.push(primary);
        }
        for sym in &self.symbols {
            let s = normalize(sym);
            if !s.is_empty() && !out.iter().any(|v| v == &s) {
                out.push(s);
            }
        }
        out
    }
}

impl MockConfig {
    pub fn generator_params(&self) -> GeneratorParams {
        GeneratorParams {
            volatility: self.volatility,
            spread_pct_low: self.spread_pct_low,
            spread_pct_high: self.spread_pct_high,
            volume_min: self.volume_min,
            volume_max: self.volume_max,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(DEFAULT_CONFIG_PATH))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        dotenvy::dotenv().ok();

        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut config = Self::from_toml_str(&config_str)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        if let Ok(url) = std::env::var(FEED_URL_ENV) {
            if !url.trim().is_empty() {
                config.feed.endpoint_url = url.trim().to_string();
            }
        }

        config.validate().context("invalid configuration")?;
        Ok(config)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("malformed TOML")
    }

    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.feed.endpoint_url)
            .with_context(|| format!("feed.endpoint_url '{}' is not a URL", self.feed.endpoint_url))?;
        if !matches!(url.scheme(), "ws" | "wss") {
            bail!(
                "feed.endpoint_url must use ws:// or wss://, got '{}'",
                url.scheme()
            );
        }
        if normalize(&self.feed.symbol).is_empty() {
            bail!("feed.symbol must not be empty");
        }

        let interval = self.mock.update_interval_ms;
        if !(MIN_UPDATE_INTERVAL_MS..=MAX_UPDATE_INTERVAL_MS).contains(&interval) {
            bail!(
                "mock.update_interval_ms {} outside {}..={}",
                interval,
                MIN_UPDATE_INTERVAL_MS,
                MAX_UPDATE_INTERVAL_MS
            );
        }
        if !(0.0..=1.0).contains(&self.mock.volatility) {
            bail!("mock.volatility {} outside 0..=1", self.mock.volatility);
        }
        if !self.mock.spread_pct_low.is_finite()
            || !self.mock.spread_pct_high.is_finite()
            || self.mock.spread_pct_low < 0.0
            || self.mock.spread_pct_low > self.mock.spread_pct_high
        {
            bail!(
                "mock spread range [{}, {}] is invalid",
                self.mock.spread_pct_low,
                self.mock.spread_pct_high
            );
        }
        if self.mock.volume_min < 0 || self.mock.volume_min > self.mock.volume_max {
            bail!(
                "mock volume range [{}, {}] is invalid",
                self.mock.volume_min,
                self.mock.volume_max
            );
        }

        let points = self.window.max_points;
        if !(MIN_MAX_POINTS..=MAX_MAX_POINTS).contains(&points) {
            bail!(
                "window.max_points {} outside {}..={}",
                points,
                MIN_MAX_POINTS,
                MAX_MAX_POINTS
            );
        }
        if self.ui.refresh_rate_ms == 0 {
            bail!("ui.refresh_rate_ms must be > 0");
        }
        Ok(())
    }

    pub fn router_settings(&self) -> RouterSettings {
        RouterSettings {
            endpoint_url: self.feed.endpoint_url.clone(),
            symbol: normalize(&self.feed.symbol),
            mode: self.feed.source.into(),
            update_interval: Duration::from_millis(self.mock.update_interval_ms),
            max_points: self.window.max_points,
            batch_size: self.mock.batch_size,
            performance_logging: self.ui.performance_logging,
        }
    }
}
