pub mod phase;
pub mod stimulus;
pub mod trial;

pub use phase::SessionPhase;
pub use stimulus::{Condition, Instruction, StroopColor, StroopTrial};
pub use trial::{INACTIVE_ANSWER, SessionContext, SessionStats, TrialOutcome};
