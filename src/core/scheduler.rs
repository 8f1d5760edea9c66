//! Periodic room shuffling

use std::time::{Duration, Instant};

use log::info;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, MissedTickBehavior};

use crate::core::server::SharedChatServer;

/// Tracks when the next shuffle is due
#[derive(Debug, Clone)]
pub struct ShuffleClock {
    interval: Duration,
    expected: Instant,
}

impl ShuffleClock {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            expected: Instant::now() + interval,
        }
    }

    /// Schedule the next shuffle one interval from now
    pub fn rearm(&mut self) {
        self.expected = Instant::now() + self.interval;
    }

    /// Milliseconds until the next shuffle, zero once it is overdue
    pub fn timeleft(&self) -> u64 {
        self.expected
            .saturating_duration_since(Instant::now())
            .as_millis() as u64
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

/// Spawn the shuffle loop. A late tick fires once and the next one is
/// scheduled a full interval later; missed ticks are not replayed.
pub fn start_shuffle_task(server: SharedChatServer) -> JoinHandle<()> {
    let period = server.config().shuffle_interval;
    info!("Shuffling rooms every {:?}", period);

    tokio::spawn(async move {
        let mut ticker = interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            server.shuffle().await;
        }
    })
}
