use crate::stimulus::{Condition, Instruction, StroopColor, StroopTrial};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Answer recorded on a trial flagged by inactivity detection.
pub const INACTIVE_ANSWER: &str = "inactive";

/// Identifies the participant session outcomes belong to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub user_id: String,
    pub session_id: String,
}

/// Recorded result per trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialOutcome {
    pub trial_number: u32,
    pub instruction: Instruction,
    pub word: StroopColor,
    pub ink: StroopColor,
    pub condition: Condition,
    pub iti_ms: u64,
    pub reaction_time_ms: Option<u64>,
    pub correct: Option<bool>,
    pub user_answer: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl TrialOutcome {
    pub fn answered(
        trial_number: u32,
        trial: &StroopTrial,
        iti_ms: u64,
        reaction_time_ms: u64,
        answer: &str,
    ) -> Self {
        Self {
            reaction_time_ms: Some(reaction_time_ms),
            correct: Some(trial.is_correct(answer)),
            user_answer: Some(answer.to_string()),
            ..Self::unresolved(trial_number, trial, iti_ms)
        }
    }

    pub fn timed_out(trial_number: u32, trial: &StroopTrial, iti_ms: u64, deadline_ms: u64) -> Self {
        Self {
            reaction_time_ms: Some(deadline_ms),
            ..Self::unresolved(trial_number, trial, iti_ms)
        }
    }

    fn unresolved(trial_number: u32, trial: &StroopTrial, iti_ms: u64) -> Self {
        Self {
            trial_number,
            instruction: trial.instruction(),
            word: trial.word(),
            ink: trial.ink(),
            condition: trial.condition(),
            iti_ms,
            reaction_time_ms: None,
            correct: None,
            user_answer: None,
            recorded_at: Utc::now(),
        }
    }

    pub fn is_skipped(&self) -> bool {
        self.correct.is_none()
    }

    pub fn is_inactive(&self) -> bool {
        self.user_answer.as_deref() == Some(INACTIVE_ANSWER)
    }
}

/// Running tally for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_trials: u32,
    pub correct_answers: u32,
    pub incorrect_answers: u32,
    pub skipped_trials: u32,
}

impl SessionStats {
    pub fn record(&mut self, outcome: &TrialOutcome) {
        self.total_trials += 1;
        match outcome.correct {
            Some(true) => self.correct_answers += 1,
            Some(false) => self.incorrect_answers += 1,
            None => self.skipped_trials += 1,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.total_trials == self.correct_answers + self.incorrect_answers + self.skipped_trials
    }
}
