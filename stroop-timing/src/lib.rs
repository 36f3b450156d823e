pub mod clock;
pub mod countdown;
pub mod timer;

pub use clock::{ClockEvent, TrialClock};
pub use countdown::{Countdown, Stopwatch};
pub use timer::{ManualTimer, MonotonicTimer, Timer};
