use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior};

use crate::event::{ConnectionState, LogLevel};
use crate::kraken::ws::{FeedEvent, FeedLink};
use crate::router::{DataSourceRouter, RouterCommand};

/// Exponential backoff for reconnection.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    current: Duration,
    initial: Duration,
    max: Duration,
    factor: f64,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(60), 2.0)
    }
}

impl ExponentialBackoff {
    pub fn new(initial: Duration, max: Duration, factor: f64) -> Self {
        Self {
            current: initial,
            initial,
            max,
            factor,
        }
    }

    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = Duration::from_secs_f64(
            (self.current.as_secs_f64() * self.factor).min(self.max.as_secs_f64()),
        );
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

fn mock_ticker(period: Duration) -> Interval {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

/// Single worker that serialises every router mutation. UI commands, feed
/// events, mock timer ticks and reconnect attempts all run on this task.
///
/// Starts the router and drives it until `commands` closes or `shutdown`
/// flips. Returns the router, stopped, so the caller can inspect it.
pub async fn run_router<L: FeedLink>(
    mut router: DataSourceRouter<L>,
    mut commands: mpsc::Receiver<RouterCommand>,
    mut feed_events: mpsc::Receiver<FeedEvent>,
    mut shutdown: watch::Receiver<bool>,
) -> DataSourceRouter<L> {
    let mut backoff = ExponentialBackoff::default();
    let mut period = router.update_interval();
    let mut ticker = mock_ticker(period);
    let mut reconnect_at: Option<Instant> = None;
    let mut attempt: u32 = 0;

    router.start();

    loop {
        tokio::select! {
            cmd = commands.recv() => match cmd {
                Some(RouterCommand::Reconnect) => {
                    backoff.reset();
                    reconnect_at = None;
                    router.apply(RouterCommand::Reconnect);
                }
                Some(cmd) => router.apply(cmd),
                None => break,
            },
            Some(event) = feed_events.recv() => router.on_feed_event(event),
            _ = ticker.tick(), if router.mock_timer_active() => {
                router.on_mock_timer();
            }
            _ = tokio::time::sleep_until(reconnect_at.unwrap_or_else(Instant::now)), if reconnect_at.is_some() => {
                reconnect_at = None;
                if router.needs_reconnect() {
                    attempt += 1;
                    tracing::info!(attempt, "reconnecting feed");
                    router.reconnect();
                }
            }
            _ = shutdown.changed() => break,
        }

        if router.update_interval() != period {
            period = router.update_interval();
            ticker = mock_ticker(period);
        }

        if router.connection_state() == ConnectionState::Connected {
            backoff.reset();
            attempt = 0;
        }

        if !router.needs_reconnect() {
            reconnect_at = None;
        } else if reconnect_at.is_none() {
            let delay = backoff.next_delay();
            router.log(
                LogLevel::Info,
                format!("Reconnecting in {}ms (attempt {})", delay.as_millis(), attempt + 1),
            );
            reconnect_at = Some(Instant::now() + delay);
        }
    }

    tracing::info!("router worker stopping");
    router.stop();
    router
}
