/// One normalized market observation. Built once by a tick source and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub symbol: String,
    pub price: f64,
    pub bid: f64,
    pub ask: f64,
    pub high: f64,
    pub low: f64,
    pub open: f64,
    pub volume: i64,
    pub timestamp_ms: i64,
}

impl Tick {
    pub fn spread(&self) -> f64 {
        self.ask - self.bid
    }
}
