use serde::Serialize;
use stroop_core::{Condition, TrialOutcome};

/// Aggregate view of a session's outcomes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub trials: usize,
    pub answered: usize,
    pub correct: usize,
    pub response_rate: f64,
    pub accuracy: Option<f64>,
    pub mean_rt_ms: Option<f64>,
    pub min_rt_ms: Option<u64>,
    pub max_rt_ms: Option<u64>,
    pub mean_consistent_rt_ms: Option<f64>,
    pub mean_inconsistent_rt_ms: Option<f64>,
    /// Mean correct-trial RT on inconsistent minus consistent trials.
    pub interference_ms: Option<f64>,
}

impl SessionSummary {
    pub fn from_outcomes(outcomes: &[TrialOutcome]) -> Self {
        let answered: Vec<&TrialOutcome> = outcomes.iter().filter(|o| !o.is_skipped()).collect();
        let correct = answered.iter().filter(|o| o.correct == Some(true)).count();
        let rts: Vec<u64> = answered.iter().filter_map(|o| o.reaction_time_ms).collect();

        let condition_mean = |condition: Condition| {
            mean(
                answered
                    .iter()
                    .filter(|o| o.correct == Some(true) && o.condition == condition)
                    .filter_map(|o| o.reaction_time_ms),
            )
        };
        let mean_consistent_rt_ms = condition_mean(Condition::Consistent);
        let mean_inconsistent_rt_ms = condition_mean(Condition::Inconsistent);

        Self {
            trials: outcomes.len(),
            answered: answered.len(),
            correct,
            response_rate: if outcomes.is_empty() {
                0.0
            } else {
                answered.len() as f64 / outcomes.len() as f64
            },
            accuracy: (!answered.is_empty()).then(|| correct as f64 / answered.len() as f64),
            mean_rt_ms: mean(rts.iter().copied()),
            min_rt_ms: rts.iter().copied().min(),
            max_rt_ms: rts.iter().copied().max(),
            mean_consistent_rt_ms,
            mean_inconsistent_rt_ms,
            interference_ms: mean_inconsistent_rt_ms
                .zip(mean_consistent_rt_ms)
                .map(|(inconsistent, consistent)| inconsistent - consistent),
        }
    }
}

fn mean(values: impl Iterator<Item = u64>) -> Option<f64> {
    let (sum, count) = values.fold((0u64, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum as f64 / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stroop_core::{Instruction, StroopColor, StroopTrial};

    fn consistent() -> StroopTrial {
        StroopTrial::new(Instruction::Word, StroopColor::Red, StroopColor::Red)
    }

    fn inconsistent() -> StroopTrial {
        StroopTrial::new(Instruction::Color, StroopColor::Red, StroopColor::Blue)
    }

    #[test]
    fn empty_session_has_no_rates() {
        let summary = SessionSummary::from_outcomes(&[]);
        assert_eq!(summary.trials, 0);
        assert_eq!(summary.response_rate, 0.0);
        assert_eq!(summary.accuracy, None);
        assert_eq!(summary.mean_rt_ms, None);
    }

    #[test]
    fn interference_compares_correct_trials() {
        let outcomes = vec![
            TrialOutcome::answered(1, &consistent(), 0, 400, "red"),
            TrialOutcome::answered(2, &consistent(), 0, 500, "red"),
            TrialOutcome::answered(3, &inconsistent(), 0, 700, "blue"),
            TrialOutcome::answered(4, &inconsistent(), 0, 300, "red"),
            TrialOutcome::timed_out(5, &inconsistent(), 0, 5000),
        ];
        let summary = SessionSummary::from_outcomes(&outcomes);

        assert_eq!(summary.trials, 5);
        assert_eq!(summary.answered, 4);
        assert_eq!(summary.correct, 3);
        assert_eq!(summary.response_rate, 0.8);
        assert_eq!(summary.accuracy, Some(0.75));
        assert_eq!(summary.min_rt_ms, Some(300));
        assert_eq!(summary.max_rt_ms, Some(700));
        assert_eq!(summary.mean_rt_ms, Some(475.0));
        assert_eq!(summary.mean_consistent_rt_ms, Some(450.0));
        assert_eq!(summary.mean_inconsistent_rt_ms, Some(700.0));
        assert_eq!(summary.interference_ms, Some(250.0));
    }
}
