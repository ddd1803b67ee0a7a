use std::collections::HashMap;

/// Running open/high/low for one symbol since its session started.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionExtremes {
    pub open: f64,
    pub high: f64,
    pub low: f64,
}

/// Per-symbol session extremes. A session starts on the first observed price
/// and lasts until [`SessionTracker::restart`] or [`SessionTracker::clear`].
#[derive(Debug, Clone, Default)]
pub struct SessionTracker {
    by_symbol: HashMap<String, SessionExtremes>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, symbol: &str, price: f64) -> SessionExtremes {
        let slot = self
            .by_symbol
            .entry(symbol.to_string())
            .or_insert(SessionExtremes {
                open: price,
                high: price,
                low: price,
            });
        slot.high = slot.high.max(price);
        slot.low = slot.low.min(price);
        *slot
    }

    pub fn get(&self, symbol: &str) -> Option<SessionExtremes> {
        self.by_symbol.get(symbol).copied()
    }

    pub fn restart(&mut self, symbol: &str) {
        self.by_symbol.remove(symbol);
    }

    pub fn clear(&mut self) {
        self.by_symbol.clear();
    }
}
