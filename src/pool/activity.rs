//! Pool acquire-activity tracking.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::time::Instant;

/// Records when a pool last handed out a connection (or last pinged).
///
/// A pool that served a connection moments ago has just proven it can reach
/// its backend, so probes consult the tracker and skip the ping.
#[derive(Debug)]
pub struct ActivityTracker {
    origin: Instant,
    /// Milliseconds since `origin`, plus one; zero means never.
    last: AtomicU64,
}

impl ActivityTracker {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            last: AtomicU64::new(0),
        }
    }

    /// Mark the pool as active now.
    pub fn touch(&self) {
        let offset = self.origin.elapsed().as_millis() as u64 + 1;
        self.last.fetch_max(offset, Ordering::Relaxed);
    }

    pub fn last_activity(&self) -> Option<Instant> {
        match self.last.load(Ordering::Relaxed) {
            0 => None,
            offset => Some(self.origin + Duration::from_millis(offset - 1)),
        }
    }

    /// True when the pool was touched less than `window` ago.
    pub fn recently_active(&self, window: Duration) -> bool {
        self.last_activity()
            .is_some_and(|last| last.elapsed() < window)
    }
}

impl Default for ActivityTracker {
    fn default() -> Self {
        Self::new()
    }
}
