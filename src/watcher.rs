use std::time::{Duration, Instant};

/// Decides when the bus should be rescanned for attached or removed interfaces.
///
/// Polled once per UI frame. The first poll only arms the timer since the
/// listing was just built at startup.
///
/// The session compares interface counts on each due poll, so swapping one
/// interface for another within an interval goes unnoticed. The Refresh
/// button rebuilds the listing in that case.
#[derive(Debug)]
pub struct DeviceWatcher {
    interval: Option<Duration>, // None disables watching
    last_poll: Option<Instant>,
}

impl DeviceWatcher {
    /// Creates a watcher rescanning every `interval_ms`, or never when it is 0.
    pub fn new(interval_ms: u64) -> Self {
        let interval = (interval_ms > 0).then(|| Duration::from_millis(interval_ms));
        if interval.is_none() {
            log::info!("Device change watcher disabled.");
        }
        Self {
            interval,
            last_poll: None,
        }
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Returns true when a rescan is due at `now` and restarts the timer.
    pub fn is_due(&mut self, now: Instant) -> bool {
        let Some(interval) = self.interval else {
            return false;
        };
        match self.last_poll {
            Some(last) if now.saturating_duration_since(last) < interval => false,
            Some(_) => {
                self.last_poll = Some(now);
                true
            }
            None => {
                self.last_poll = Some(now);
                false
            }
        }
    }
}
