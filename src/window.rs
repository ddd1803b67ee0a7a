use std::collections::VecDeque;

use crate::error::AppError;
use crate::model::tick::Tick;

pub const DEFAULT_MAX_POINTS: usize = 100;
pub const MIN_MAX_POINTS: usize = 50;
pub const MAX_MAX_POINTS: usize = 500;

/// Fraction of the raw range added on each side of the value axis.
const RANGE_PADDING_RATIO: f64 = 0.05;
/// Padding used when every stored value is identical.
const FLAT_RANGE_PADDING: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeriesId {
    Price,
    Bid,
    Ask,
}

impl SeriesId {
    pub const ALL: [SeriesId; 3] = [SeriesId::Price, SeriesId::Bid, SeriesId::Ask];

    pub fn label(self) -> &'static str {
        match self {
            Self::Price => "Price",
            Self::Bid => "Bid",
            Self::Ask => "Ask",
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Price => 0,
            Self::Bid => 1,
            Self::Ask => 2,
        }
    }
}

/// Inclusive value range exposed to the chart axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    fn padded(raw: AxisRange) -> AxisRange {
        let width = raw.width();
        let pad = if width > 0.0 {
            width * RANGE_PADDING_RATIO
        } else {
            FLAT_RANGE_PADDING
        };
        AxisRange {
            min: raw.min - pad,
            max: raw.max + pad,
        }
    }
}

/// Bounded, oldest-first series of `(timestamp_ms, value)` points.
#[derive(Debug, Clone)]
pub struct SeriesBuffer {
    points: VecDeque<(i64, f64)>,
}

impl SeriesBuffer {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(capacity + 1),
        }
    }

    /// Appends, then evicts from the front until `len() <= max_points`.
    /// Returns how many points were evicted.
    fn push(&mut self, timestamp_ms: i64, value: f64, max_points: usize) -> usize {
        self.points.push_back((timestamp_ms, value));
        let mut evicted = 0;
        while self.points.len() > max_points {
            self.points.pop_front();
            evicted += 1;
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = &(i64, f64)> {
        self.points.iter()
    }

    pub fn to_vec(&self) -> Vec<(i64, f64)> {
        self.points.iter().copied().collect()
    }

    fn clear(&mut self) {
        self.points.clear();
    }
}

/// Point-in-time copy of the window handed to the rendering side.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSnapshot {
    pub price: Vec<(i64, f64)>,
    pub bid: Vec<(i64, f64)>,
    pub ask: Vec<(i64, f64)>,
    /// Padded range shared by all three series; `None` when empty.
    pub range: Option<AxisRange>,
    pub time_span: Option<(i64, i64)>,
}

impl WindowSnapshot {
    pub fn series(&self, id: SeriesId) -> &[(i64, f64)] {
        match id {
            SeriesId::Price => &self.price,
            SeriesId::Bid => &self.bid,
            SeriesId::Ask => &self.ask,
        }
    }
}

/// The chart window: price, bid and ask series sharing one value axis.
///
/// Every mutation rescans the stored points to rebuild the raw and padded
/// ranges. The window is small and bounded, so the scan stays cheap.
#[derive(Debug, Clone)]
pub struct WindowBuffer {
    series: [SeriesBuffer; 3],
    max_points: usize,
    raw_range: Option<AxisRange>,
    range: Option<AxisRange>,
}

impl Default for WindowBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_POINTS)
    }
}

impl WindowBuffer {
    /// A zero capacity falls back to [`DEFAULT_MAX_POINTS`].
    pub fn new(max_points: usize) -> Self {
        let max_points = if max_points == 0 {
            DEFAULT_MAX_POINTS
        } else {
            max_points
        };
        Self {
            series: [
                SeriesBuffer::with_capacity(max_points),
                SeriesBuffer::with_capacity(max_points),
                SeriesBuffer::with_capacity(max_points),
            ],
            max_points,
            raw_range: None,
            range: None,
        }
    }

    pub fn max_points(&self) -> usize {
        self.max_points
    }

    /// Takes effect on the next push; stored points are not evicted here.
    pub fn set_max_points(&mut self, max_points: usize) -> Result<(), AppError> {
        if max_points == 0 {
            return Err(AppError::InvalidCapacity {
                requested: max_points,
                min: 1,
                max: usize::MAX,
            });
        }
        self.max_points = max_points;
        Ok(())
    }

    pub fn push(&mut self, series: SeriesId, timestamp_ms: i64, value: f64) {
        let max_points = self.max_points;
        self.series[series.index()].push(timestamp_ms, value, max_points);
        self.recompute_range();
    }

    /// Pushes price, bid and ask of one tick, rescanning the range once.
    pub fn push_tick(&mut self, tick: &Tick) {
        let max_points = self.max_points;
        for (id, value) in [
            (SeriesId::Price, tick.price),
            (SeriesId::Bid, tick.bid),
            (SeriesId::Ask, tick.ask),
        ] {
            self.series[id.index()].push(tick.timestamp_ms, value, max_points);
        }
        self.recompute_range();
    }

    pub fn clear(&mut self) {
        for s in &mut self.series {
            s.clear();
        }
        self.raw_range = None;
        self.range = None;
    }

    pub fn series(&self, id: SeriesId) -> &SeriesBuffer {
        &self.series[id.index()]
    }

    pub fn len(&self) -> usize {
        self.series(SeriesId::Price).len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.iter().all(SeriesBuffer::is_empty)
    }

    /// Min/max over every stored value, before padding.
    pub fn raw_range(&self) -> Option<AxisRange> {
        self.raw_range
    }

    /// Range exposed to the axis: raw range widened by 5% of its width on each
    /// side, or by a fixed 1.0 when the raw range is flat.
    pub fn range(&self) -> Option<AxisRange> {
        self.range
    }

    pub fn time_span(&self) -> Option<(i64, i64)> {
        let mut span: Option<(i64, i64)> = None;
        for s in &self.series {
            for &(ts, _) in s.points() {
                span = Some(match span {
                    Some((lo, hi)) => (lo.min(ts), hi.max(ts)),
                    None => (ts, ts),
                });
            }
        }
        span
    }

    pub fn snapshot(&self) -> WindowSnapshot {
        WindowSnapshot {
            price: self.series(SeriesId::Price).to_vec(),
            bid: self.series(SeriesId::Bid).to_vec(),
            ask: self.series(SeriesId::Ask).to_vec(),
            range: self.range,
            time_span: self.time_span(),
        }
    }

    fn recompute_range(&mut self) {
        let mut raw: Option<AxisRange> = None;
        for s in &self.series {
            for &(_, v) in s.points() {
                if !v.is_finite() {
                    continue;
                }
                raw = Some(match raw {
                    Some(r) => AxisRange {
                        min: r.min.min(v),
                        max: r.max.max(v),
                    },
                    None => AxisRange { min: v, max: v },
                });
            }
        }
        self.raw_range = raw;
        self.range = raw.map(AxisRange::padded);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_point_uses_flat_padding() {
        let mut w = WindowBuffer::new(10);
        w.push(SeriesId::Price, 1, 100.0);
        let r = w.range().unwrap();
        assert!((r.min - 99.0).abs() < 1e-9);
        assert!((r.max - 101.0).abs() < 1e-9);
    }

    #[test]
    fn padding_is_five_percent_of_width() {
        let mut w = WindowBuffer::new(10);
        w.push(SeriesId::Price, 1, 100.0);
        w.push(SeriesId::Price, 2, 120.0);
        let r = w.range().unwrap();
        assert!((r.min - 99.0).abs() < 1e-9);
        assert!((r.max - 121.0).abs() < 1e-9);
    }

    #[test]
    fn zero_capacity_is_rejected_and_previous_kept() {
        let mut w = WindowBuffer::new(100);
        assert!(w.set_max_points(0).is_err());
        assert_eq!(w.max_points(), 100);
        assert_eq!(WindowBuffer::new(0).max_points(), DEFAULT_MAX_POINTS);
    }

    #[test]
    fn clear_resets_range() {
        let mut w = WindowBuffer::new(10);
        w.push(SeriesId::Bid, 1, 5.0);
        w.clear();
        assert!(w.is_empty());
        assert!(w.range().is_none());
        assert!(w.time_span().is_none());
    }
}
