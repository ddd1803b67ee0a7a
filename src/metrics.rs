use std::time::Duration;

/// How often a performance summary is logged, in accepted ticks.
pub const PERFORMANCE_LOG_EVERY: u64 = 100;

/// Counters owned by one router. Reset explicitly on clear and source switch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouterMetrics {
    pub updates: u64,
    pub total_update_micros: f64,
    pub stale_discarded: u64,
    pub frames_dropped: u64,
    pub records_dropped: u64,
}

impl RouterMetrics {
    pub fn record_update(&mut self, elapsed: Duration) {
        self.updates += 1;
        self.total_update_micros += elapsed.as_secs_f64() * 1_000_000.0;
    }

    pub fn average_update_micros(&self) -> Option<f64> {
        if self.updates == 0 {
            None
        } else {
            Some(self.total_update_micros / self.updates as f64)
        }
    }

    pub fn summary_due(&self) -> bool {
        self.updates > 0 && self.updates % PERFORMANCE_LOG_EVERY == 0
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
