use crate::countdown::{Countdown, Stopwatch};
use crate::timer::Timer;

/// Countdown that ran out since the last poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEvent {
    ResponseWindowElapsed,
    FeedbackElapsed,
    ItiElapsed,
}

/// Countdowns for one trial loop: the response deadline, the feedback delay
/// and the inter-trial interval, plus a stopwatch for reaction times.
///
/// The clock never calls back into its owner. The owner calls [`poll`] from
/// its event loop and receives each elapsed countdown exactly once.
///
/// [`poll`]: TrialClock::poll
#[derive(Debug, Clone)]
pub struct TrialClock<T: Timer> {
    timer: T,
    response: Option<Countdown>,
    feedback: Option<Countdown>,
    iti: Option<Countdown>,
    reaction: Option<Stopwatch>,
    paused: bool,
}

impl<T: Timer> TrialClock<T> {
    pub fn new(timer: T) -> Self {
        Self {
            timer,
            response: None,
            feedback: None,
            iti: None,
            reaction: None,
            paused: false,
        }
    }

    pub fn now(&self) -> u64 {
        self.timer.now()
    }

    /// Opens the response window. The reaction stopwatch always starts; the
    /// deadline is only armed for a non-zero duration. Returns whether a
    /// deadline was armed.
    pub fn start_response_window(&mut self, duration_ms: u64) -> bool {
        let now = self.timer.now();
        let mut watch = Stopwatch::start(now);
        if self.paused {
            watch.pause(now);
        }
        self.reaction = Some(watch);
        self.response = self.arm(duration_ms, now);
        self.response.is_some()
    }

    /// Settles the response deadline without waiting for the next poll.
    /// An expired deadline is consumed, so [`poll`] will not report it again.
    ///
    /// [`poll`]: TrialClock::poll
    pub fn response_expired(&mut self) -> bool {
        if self.paused {
            return false;
        }
        let now = self.timer.now();
        Self::expired(&mut self.response, now)
    }

    pub fn cancel_response_window(&mut self) {
        self.response = None;
    }

    pub fn start_feedback(&mut self, duration_ms: u64) -> bool {
        let now = self.timer.now();
        self.feedback = self.arm(duration_ms, now);
        self.feedback.is_some()
    }

    pub fn cancel_feedback(&mut self) {
        self.feedback = None;
    }

    pub fn start_iti(&mut self, duration_ms: u64) -> bool {
        let now = self.timer.now();
        self.iti = self.arm(duration_ms, now);
        self.iti.is_some()
    }

    pub fn cancel_iti(&mut self) {
        self.iti = None;
    }

    pub fn cancel_all(&mut self) {
        self.response = None;
        self.feedback = None;
        self.iti = None;
        self.reaction = None;
    }

    /// Unpaused time since the response window opened.
    pub fn reaction_time_ms(&self) -> Option<u64> {
        let now = self.timer.now();
        self.reaction.as_ref().map(|w| w.elapsed_ms(now))
    }

    pub fn response_remaining_ms(&self) -> Option<u64> {
        self.response.as_ref().map(Countdown::remaining_ms)
    }

    pub fn iti_remaining_ms(&self) -> Option<u64> {
        self.iti.as_ref().map(Countdown::remaining_ms)
    }

    pub fn feedback_remaining_ms(&self) -> Option<u64> {
        self.feedback.as_ref().map(Countdown::remaining_ms)
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        if self.paused == paused {
            return;
        }
        let now = self.timer.now();
        self.paused = paused;
        for countdown in [&mut self.response, &mut self.feedback, &mut self.iti]
            .into_iter()
            .flatten()
        {
            if paused {
                countdown.pause(now);
            } else {
                countdown.resume(now);
            }
        }
        if let Some(watch) = self.reaction.as_mut() {
            if paused {
                watch.pause(now);
            } else {
                watch.resume(now);
            }
        }
        tracing::debug!(paused, at_ms = now, "trial clock pause toggled");
    }

    /// Advances all running countdowns and reports those that ran out.
    pub fn poll(&mut self) -> Vec<ClockEvent> {
        let mut events = Vec::new();
        if self.paused {
            return events;
        }
        let now = self.timer.now();
        if Self::expired(&mut self.response, now) {
            events.push(ClockEvent::ResponseWindowElapsed);
        }
        if Self::expired(&mut self.feedback, now) {
            events.push(ClockEvent::FeedbackElapsed);
        }
        if Self::expired(&mut self.iti, now) {
            events.push(ClockEvent::ItiElapsed);
        }
        events
    }

    fn arm(&self, duration_ms: u64, now: u64) -> Option<Countdown> {
        if duration_ms == 0 {
            return None;
        }
        let mut countdown = Countdown::start(duration_ms, now);
        if self.paused {
            countdown.pause(now);
        }
        Some(countdown)
    }

    fn expired(slot: &mut Option<Countdown>, now: u64) -> bool {
        let fired = slot.as_mut().is_some_and(|c| c.tick(now));
        if fired {
            *slot = None;
        }
        fired
    }
}
