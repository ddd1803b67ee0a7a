use lightning_trade::model::tick::Tick;
use lightning_trade::window::{SeriesId, WindowBuffer};

fn tick(ts: i64, price: f64) -> Tick {
    Tick {
        symbol: "BTCUSD".to_string(),
        price,
        bid: price - 0.5,
        ask: price + 0.5,
        high: price,
        low: price,
        open: price,
        volume: 1,
        timestamp_ms: ts,
    }
}

#[test]
fn pushing_150_ticks_keeps_the_latest_100() {
    let mut w = WindowBuffer::new(100);
    for t in 0..150 {
        w.push_tick(&tick(t, 1000.0 + t as f64));
    }
    assert_eq!(w.len(), 100);
    for id in SeriesId::ALL {
        let pts = w.series(id).to_vec();
        assert_eq!(pts.len(), 100);
        assert_eq!(pts.first().map(|p| p.0), Some(50));
        assert_eq!(pts.last().map(|p| p.0), Some(149));
    }
    assert_eq!(w.time_span(), Some((50, 149)));
}

#[test]
fn size_never_exceeds_capacity_and_order_is_oldest_first() {
    let mut w = WindowBuffer::new(7);
    for t in 0..40 {
        w.push(SeriesId::Price, t, (t % 5) as f64);
        assert!(w.series(SeriesId::Price).len() <= 7);
        let ts: Vec<i64> = w.series(SeriesId::Price).points().map(|p| p.0).collect();
        let expected: Vec<i64> = ((t - ts.len() as i64 + 1)..=t).collect();
        assert_eq!(ts, expected);
    }
}

#[test]
fn range_contains_every_stored_value_after_evictions() {
    let mut w = WindowBuffer::new(10);
    let values = [5.0, 90.0, -3.0, 12.0, 40.0, 7.5, 7.5, 1.0, 60.0, 2.0, 3.0, 4.0, 8.0];
    for (i, v) in values.iter().enumerate() {
        w.push_tick(&tick(i as i64, *v));
        let raw = w.raw_range().unwrap();
        let padded = w.range().unwrap();
        let snap = w.snapshot();
        for id in SeriesId::ALL {
            for &(_, v) in snap.series(id) {
                assert!(raw.contains(v));
                assert!(padded.contains(v));
            }
        }
        assert!(padded.min < raw.min && padded.max > raw.max);
    }
    // 90.0 has been evicted, so the max follows the surviving window.
    let raw = w.raw_range().unwrap();
    assert!(raw.max < 90.0);
}

#[test]
fn flat_window_pads_by_one() {
    let mut w = WindowBuffer::new(10);
    for t in 0..3 {
        w.push(SeriesId::Price, t, 42.0);
    }
    let r = w.range().unwrap();
    assert_eq!(r.min, 41.0);
    assert_eq!(r.max, 43.0);
}

#[test]
fn padding_is_five_percent_of_width() {
    let mut w = WindowBuffer::new(10);
    w.push(SeriesId::Price, 0, 100.0);
    w.push(SeriesId::Price, 1, 200.0);
    let r = w.range().unwrap();
    assert!((r.min - 95.0).abs() < 1e-9);
    assert!((r.max - 205.0).abs() < 1e-9);
}

#[test]
fn shrinking_capacity_applies_on_next_push() {
    let mut w = WindowBuffer::new(100);
    for t in 0..80 {
        w.push(SeriesId::Price, t, t as f64);
    }
    w.set_max_points(50).unwrap();
    assert_eq!(w.series(SeriesId::Price).len(), 80);
    w.push(SeriesId::Price, 80, 80.0);
    let pts = w.series(SeriesId::Price).to_vec();
    assert_eq!(pts.len(), 50);
    assert_eq!(pts[0].0, 31);
}

#[test]
fn zero_capacity_is_rejected_and_previous_kept() {
    let mut w = WindowBuffer::new(0);
    assert_eq!(w.max_points(), 100);
    assert!(w.set_max_points(0).is_err());
    assert_eq!(w.max_points(), 100);
}

#[test]
fn clear_empties_everything() {
    let mut w = WindowBuffer::new(10);
    w.push_tick(&tick(1, 10.0));
    w.clear();
    assert!(w.is_empty());
    assert!(w.range().is_none());
    assert!(w.snapshot().time_span.is_none());
}
