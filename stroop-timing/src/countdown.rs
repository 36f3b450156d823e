/// A pausable countdown measured in milliseconds.
///
/// Time is only subtracted while running. Pausing settles the time elapsed
/// so far and resuming restarts measurement from the resume instant, so a
/// pause of any length leaves the remaining duration untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    duration_ms: u64,
    remaining_ms: u64,
    last_tick_ms: u64,
    paused: bool,
}

impl Countdown {
    pub fn start(duration_ms: u64, now_ms: u64) -> Self {
        Self {
            duration_ms,
            remaining_ms: duration_ms,
            last_tick_ms: now_ms,
            paused: false,
        }
    }

    /// Subtracts the time since the last tick. Returns true once the
    /// countdown has run out; a paused countdown never reports expiry.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        if self.paused {
            return false;
        }
        self.settle(now_ms);
        self.remaining_ms == 0
    }

    pub fn pause(&mut self, now_ms: u64) {
        if self.paused {
            return;
        }
        self.settle(now_ms);
        self.paused = true;
    }

    pub fn resume(&mut self, now_ms: u64) {
        if !self.paused {
            return;
        }
        self.last_tick_ms = now_ms;
        self.paused = false;
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    /// Running time consumed so far.
    pub fn consumed_ms(&self) -> u64 {
        self.duration_ms - self.remaining_ms
    }

    fn settle(&mut self, now_ms: u64) {
        let elapsed = now_ms.saturating_sub(self.last_tick_ms);
        self.remaining_ms = self.remaining_ms.saturating_sub(elapsed);
        self.last_tick_ms = now_ms;
    }
}

/// Accumulates running time across pauses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stopwatch {
    accumulated_ms: u64,
    running_since: Option<u64>,
}

impl Stopwatch {
    pub fn start(now_ms: u64) -> Self {
        Self {
            accumulated_ms: 0,
            running_since: Some(now_ms),
        }
    }

    pub fn pause(&mut self, now_ms: u64) {
        if let Some(since) = self.running_since.take() {
            self.accumulated_ms += now_ms.saturating_sub(since);
        }
    }

    pub fn resume(&mut self, now_ms: u64) {
        if self.running_since.is_none() {
            self.running_since = Some(now_ms);
        }
    }

    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        self.accumulated_ms
            + self
                .running_since
                .map_or(0, |since| now_ms.saturating_sub(since))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expires_after_full_duration() {
        let mut countdown = Countdown::start(1000, 0);
        assert!(!countdown.tick(400));
        assert_eq!(countdown.remaining_ms(), 600);
        assert!(!countdown.tick(999));
        assert!(countdown.tick(1000));
    }

    #[test]
    fn pause_freezes_remaining_time() {
        let mut countdown = Countdown::start(5000, 0);
        countdown.pause(2000);
        assert!(!countdown.tick(12_000));
        assert_eq!(countdown.remaining_ms(), 3000);

        countdown.resume(12_000);
        assert!(!countdown.tick(14_999));
        assert!(countdown.tick(15_000));
        assert_eq!(countdown.consumed_ms(), 5000);
    }

    #[test]
    fn repeated_pause_and_resume_are_harmless() {
        let mut countdown = Countdown::start(1000, 0);
        countdown.pause(100);
        countdown.pause(900);
        assert_eq!(countdown.remaining_ms(), 900);
        countdown.resume(1000);
        countdown.resume(1500);
        assert!(!countdown.tick(1899));
        assert!(countdown.tick(1900));
    }

    #[test]
    fn stopwatch_skips_paused_time() {
        let mut watch = Stopwatch::start(100);
        watch.pause(600);
        watch.resume(10_600);
        assert_eq!(watch.elapsed_ms(10_900), 800);
    }
}
