use crate::error::ConfigError;
use crate::generator::StimulusPolicy;
use serde::{Deserialize, Serialize};
use stroop_core::Instruction;

/// Static per-session settings. Durations are milliseconds; a zero ITI or
/// trial timer disables that phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub iti_ms: u64,
    pub trial_timer_ms: u64,
    pub instruction_switch_period: u32,
    pub feedback_ms: u64,
    pub initial_instruction: Instruction,
    pub stimulus_policy: StimulusPolicy,
    pub max_trials: Option<u32>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            iti_ms: 1000,
            trial_timer_ms: 5000,
            instruction_switch_period: 10,
            feedback_ms: 1000,
            initial_instruction: Instruction::Word,
            stimulus_policy: StimulusPolicy::Balanced,
            max_trials: None,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.instruction_switch_period == 0 {
            return Err(ConfigError::ZeroSwitchPeriod);
        }
        if self.max_trials == Some(0) {
            return Err(ConfigError::ZeroMaxTrials);
        }
        Ok(())
    }
}
