use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::model::session::SessionTracker;
use crate::model::tick::Tick;

const DEFAULT_SYMBOL: &str = "BTCUSD";
const RESET_BASE_PRICE: f64 = 50_000.0;
pub const DEFAULT_VOLATILITY: f64 = 0.5;

/// Lowest and highest price reachable from the base price.
const BAND_LOW: f64 = 0.8;
const BAND_HIGH: f64 = 1.2;

/// `(symbol, floor, jitter)`: base price is `floor + U(0, jitter)`.
const BASE_PRICES: &[(&str, f64, f64)] = &[
    ("BTCUSD", 45_000.0, 10_000.0),
    ("ETHUSD", 2_500.0, 1_000.0),
    ("AAPL", 150.0, 50.0),
    ("MSFT", 300.0, 100.0),
    ("GOOGL", 2_500.0, 500.0),
];
const FALLBACK_BASE: (f64, f64) = (100.0, 900.0);

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorParams {
    pub volatility: f64,
    /// Bid/ask spread bounds, in percent of price.
    pub spread_pct_low: f64,
    pub spread_pct_high: f64,
    pub volume_min: i64,
    pub volume_max: i64,
}

impl Default for GeneratorParams {
    fn default() -> Self {
        Self {
            volatility: DEFAULT_VOLATILITY,
            spread_pct_low: 0.01,
            spread_pct_high: 0.05,
            volume_min: 100,
            volume_max: 1_000,
        }
    }
}

/// Bounded random walk producing synthetic ticks.
///
/// Each symbol gets a base price from [`BASE_PRICES`] (with jitter). The last
/// price never leaves `[0.8 * base, 1.2 * base]`.
#[derive(Debug, Clone)]
pub struct MockGenerator {
    rng: StdRng,
    params: GeneratorParams,
    base_price: f64,
    last_price: f64,
    current_symbol: String,
    volatility: f64,
    /// Half-width of the per-tick movement distribution.
    movement_half_width: f64,
    sessions: SessionTracker,
}

impl MockGenerator {
    pub fn new(params: GeneratorParams) -> Self {
        Self::from_rng(StdRng::from_entropy(), params)
    }

    pub fn with_seed(seed: u64, params: GeneratorParams) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed), params)
    }

    fn from_rng(rng: StdRng, params: GeneratorParams) -> Self {
        let volatility = params.volatility;
        let mut gen = Self {
            rng,
            params,
            base_price: RESET_BASE_PRICE,
            last_price: RESET_BASE_PRICE,
            current_symbol: DEFAULT_SYMBOL.to_string(),
            volatility: DEFAULT_VOLATILITY,
            movement_half_width: 1.0,
            sessions: SessionTracker::new(),
        };
        gen.set_volatility(volatility);
        gen
    }

    pub fn base_price(&self) -> f64 {
        self.base_price
    }

    pub fn last_price(&self) -> f64 {
        self.last_price
    }

    pub fn current_symbol(&self) -> &str {
        &self.current_symbol
    }

    pub fn volatility(&self) -> f64 {
        self.volatility
    }

    /// Clamps to `[0, 1]`; the movement half-width scales linearly (0.5 maps
    /// to the default half-width of 1.0).
    pub fn set_volatility(&mut self, volatility: f64) {
        let v = if volatility.is_nan() {
            DEFAULT_VOLATILITY
        } else {
            volatility.clamp(0.0, 1.0)
        };
        self.volatility = v;
        self.movement_half_width = 2.0 * v;
    }

    /// Always reseeds, even when `symbol` is already current.
    pub fn set_symbol(&mut self, symbol: &str) {
        self.reseed(symbol);
    }

    pub fn reset(&mut self) {
        self.base_price = RESET_BASE_PRICE;
        self.last_price = RESET_BASE_PRICE;
        self.current_symbol = DEFAULT_SYMBOL.to_string();
        self.sessions.clear();
    }

    pub fn generate_tick(&mut self, symbol: &str) -> Tick {
        let now_ms = chrono::Utc::now().timestamp_millis();
        self.generate_tick_at(symbol, now_ms)
    }

    pub fn generate_tick_at(&mut self, symbol: &str, timestamp_ms: i64) -> Tick {
        if symbol != self.current_symbol {
            self.reseed(symbol);
        }

        let price = self.advance_price();

        let spread_pct = self.uniform(self.params.spread_pct_low, self.params.spread_pct_high);
        let spread = price * spread_pct / 100.0;
        let bid = price - spread / 2.0;
        let ask = price + spread / 2.0;

        let (vmin, vmax) = (self.params.volume_min, self.params.volume_max);
        let volume = if vmax > vmin {
            self.rng.gen_range(vmin..=vmax)
        } else {
            vmin
        };

        let session = self.sessions.observe(symbol, price);

        Tick {
            symbol: symbol.to_string(),
            price,
            bid,
            ask,
            high: session.high,
            low: session.low,
            open: session.open,
            volume,
            timestamp_ms,
        }
    }

    /// `count` ticks spaced `spacing_ms` apart, the last one at `end_ts_ms`.
    pub fn generate_batch(
        &mut self,
        symbol: &str,
        count: usize,
        end_ts_ms: i64,
        spacing_ms: i64,
    ) -> Vec<Tick> {
        let mut batch = Vec::with_capacity(count);
        for i in 0..count {
            let back = (count - 1 - i) as i64;
            let ts = end_ts_ms.saturating_sub(back.saturating_mul(spacing_ms));
            batch.push(self.generate_tick_at(symbol, ts));
        }
        batch
    }

    /// One random-walk step: noise scaled to 0.1% of base, plus an upward
    /// leaning trend term, then clamped into the band.
    pub fn advance_price(&mut self) -> f64 {
        let half = self.movement_half_width;
        let noise = if half > 0.0 {
            self.rng.gen_range(-half..=half)
        } else {
            0.0
        };
        let mut change = noise * self.base_price * 0.001;
        let trend: f64 = self.rng.gen_range(-0.1..0.2);
        change += trend * self.base_price * 0.0005;

        self.last_price = (self.last_price + change)
            .clamp(self.base_price * BAND_LOW, self.base_price * BAND_HIGH);
        self.last_price
    }

    fn reseed(&mut self, symbol: &str) {
        let (floor, jitter) = BASE_PRICES
            .iter()
            .find(|(s, _, _)| *s == symbol)
            .map(|(_, floor, jitter)| (*floor, *jitter))
            .unwrap_or(FALLBACK_BASE);
        self.base_price = floor + self.rng.gen_range(0.0..jitter);
        self.last_price = self.base_price;
        self.current_symbol = symbol.to_string();
        self.sessions.restart(symbol);
        tracing::debug!(symbol, base_price = self.base_price, "mock generator reseeded");
    }

    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if high > low {
            self.rng.gen_range(low..high)
        } else {
            low
        }
    }
}
