use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Monotonic millisecond clock the session machinery reads time from.
pub trait Timer: Clone + Send + Sync {
    /// Milliseconds since the timer's origin.
    fn now(&self) -> u64;

    fn elapsed(&self, since: u64) -> Duration {
        Duration::from_millis(self.now().saturating_sub(since))
    }
}

/// Wall-clock timer backed by `Instant`.
#[derive(Debug, Clone)]
pub struct MonotonicTimer {
    pub start: Instant,
}

impl Timer for MonotonicTimer {
    fn now(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

impl MonotonicTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for MonotonicTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// Timer that only moves when told to. Clones share the same time, so a
/// test can keep a handle while the machine owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualTimer {
    now_ms: Arc<AtomicU64>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: u64) {
        self.now_ms.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn set(&self, ms: u64) {
        self.now_ms.store(ms, Ordering::SeqCst);
    }
}

impl Timer for ManualTimer {
    fn now(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_timer_clones_share_time() {
        let timer = ManualTimer::new();
        let handle = timer.clone();
        handle.advance(250);
        assert_eq!(timer.now(), 250);
        assert_eq!(timer.elapsed(100), Duration::from_millis(150));
    }

    #[test]
    fn elapsed_saturates_for_future_timestamps() {
        let timer = ManualTimer::new();
        assert_eq!(timer.elapsed(1_000), Duration::ZERO);
    }

    #[test]
    fn monotonic_timer_never_goes_backwards() {
        let timer = MonotonicTimer::new();
        let a = timer.now();
        let b = timer.now();
        assert!(b >= a);
    }
}
