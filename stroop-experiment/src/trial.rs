use stroop_core::StroopTrial;

/// The trial currently on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveTrial {
    pub number: u32,
    pub stimulus: StroopTrial,
    /// Set by whichever of response or timeout claims the trial first.
    pub resolved: bool,
}

impl ActiveTrial {
    pub fn new(number: u32, stimulus: StroopTrial) -> Self {
        Self {
            number,
            stimulus,
            resolved: false,
        }
    }

    /// Claims the trial for resolution. Only the first caller gets `true`.
    pub fn claim(&mut self) -> bool {
        !std::mem::replace(&mut self.resolved, true)
    }
}
