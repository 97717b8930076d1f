//! Exponential backoff with jitter.

use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;

/// Jitter applied around each interval (±50%).
pub const DEFAULT_RANDOMIZATION_FACTOR: f64 = 0.5;
/// Growth factor between consecutive intervals.
pub const DEFAULT_MULTIPLIER: f64 = 1.5;

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Randomized exponential backoff schedule bounded by a total elapsed budget.
///
/// Every call to [`next_backoff`](Self::next_backoff) draws a delay uniformly
/// from `[interval * (1 - f), interval * (1 + f)]` and then grows the interval
/// by `multiplier`, capped at `max_interval`. The schedule stops once the
/// next delay would push the elapsed time past `max_elapsed_time`.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    pub initial_interval: Duration,
    pub randomization_factor: f64,
    pub multiplier: f64,
    pub max_interval: Duration,
    pub max_elapsed_time: Duration,
    current_interval: Duration,
    started: Instant,
}

impl ExponentialBackoff {
    pub fn new(
        initial_interval: Duration,
        max_interval: Duration,
        max_elapsed_time: Duration,
    ) -> Self {
        let initial_interval = initial_interval.max(MIN_INTERVAL);
        Self {
            initial_interval,
            randomization_factor: DEFAULT_RANDOMIZATION_FACTOR,
            multiplier: DEFAULT_MULTIPLIER,
            max_interval: max_interval.max(initial_interval),
            max_elapsed_time,
            current_interval: initial_interval,
            started: Instant::now(),
        }
    }

    /// Schedule for probes retried around a base ping interval: start at a
    /// quarter of it, never wait longer than half of it.
    pub fn from_base_interval(base_interval: Duration, max_elapsed_time: Duration) -> Self {
        Self::new(base_interval / 4, base_interval / 2, max_elapsed_time)
    }

    /// Restart the schedule and the elapsed clock.
    pub fn reset(&mut self) {
        self.current_interval = self.initial_interval;
        self.started = Instant::now();
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn current_interval(&self) -> Duration {
        self.current_interval
    }

    /// Next delay, or `None` when the elapsed budget is spent.
    pub fn next_backoff(&mut self) -> Option<Duration> {
        let elapsed = self.elapsed();
        let next = randomized_interval(
            self.current_interval,
            self.randomization_factor,
            rand::thread_rng().gen::<f64>(),
        );
        self.increment_interval();

        if elapsed + next > self.max_elapsed_time {
            None
        } else {
            Some(next)
        }
    }

    fn increment_interval(&mut self) {
        let grown = self.current_interval.as_secs_f64() * self.multiplier;
        if grown >= self.max_interval.as_secs_f64() {
            self.current_interval = self.max_interval;
        } else {
            self.current_interval = Duration::from_secs_f64(grown);
        }
    }
}

/// Pick a point in `[interval * (1 - factor), interval * (1 + factor)]`,
/// `random` being uniform in `[0, 1)`.
pub(crate) fn randomized_interval(interval: Duration, factor: f64, random: f64) -> Duration {
    if factor <= 0.0 {
        return interval;
    }
    let secs = interval.as_secs_f64();
    let delta = factor * secs;
    let min = (secs - delta).max(0.0);
    let max = secs + delta;
    Duration::from_secs_f64(min + random * (max - min))
}
