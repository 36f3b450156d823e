use serde::{Deserialize, Serialize};

/// Phases of a Stroop session
#[derive(Copy, Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    Idle,
    AwaitingResponse,
    Feedback,
    InterTrialInterval,
    Complete,
}

impl SessionPhase {
    pub fn allows_input(&self) -> bool {
        matches!(self, Self::AwaitingResponse)
    }

    /// Phases in which the pause modifier may be asserted.
    pub fn can_pause(&self) -> bool {
        matches!(
            self,
            Self::AwaitingResponse | Self::Feedback | Self::InterTrialInterval
        )
    }

    pub fn is_running(&self) -> bool {
        !matches!(self, Self::Idle | Self::Complete)
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}
