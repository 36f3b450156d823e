use rand::Rng;
use serde::{Deserialize, Serialize};
use stroop_core::{Instruction, StroopColor, StroopTrial};

/// How word and ink are paired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StimulusPolicy {
    /// Word and ink drawn independently; about a quarter of trials are
    /// consistent.
    Independent,
    /// A fair coin decides the condition. Inconsistent trials draw the ink
    /// from the three colours the word does not name.
    #[default]
    Balanced,
}

/// Produces Stroop stimuli from an injected random source.
#[derive(Debug, Clone)]
pub struct TrialGenerator<R: Rng> {
    rng: R,
    policy: StimulusPolicy,
}

impl<R: Rng> TrialGenerator<R> {
    pub fn new(rng: R, policy: StimulusPolicy) -> Self {
        Self { rng, policy }
    }

    pub fn policy(&self) -> StimulusPolicy {
        self.policy
    }

    pub fn generate(&mut self, instruction: Instruction) -> StroopTrial {
        let word = self.pick_color();
        let ink = match self.policy {
            StimulusPolicy::Independent => self.pick_color(),
            StimulusPolicy::Balanced => {
                if self.rng.random_bool(0.5) {
                    word
                } else {
                    self.pick_other_than(word)
                }
            }
        };
        StroopTrial::new(instruction, word, ink)
    }

    fn pick_color(&mut self) -> StroopColor {
        StroopColor::ALL[self.rng.random_range(0..StroopColor::ALL.len())]
    }

    fn pick_other_than(&mut self, excluded: StroopColor) -> StroopColor {
        let mut others = StroopColor::ALL.into_iter().filter(|c| *c != excluded);
        let idx = self.rng.random_range(0..StroopColor::ALL.len() - 1);
        others.nth(idx).unwrap_or(excluded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use stroop_core::Condition;

    fn sequence(seed: u64, policy: StimulusPolicy) -> Vec<StroopTrial> {
        let mut generator = TrialGenerator::new(StdRng::seed_from_u64(seed), policy);
        (0..50).map(|_| generator.generate(Instruction::Word)).collect()
    }

    #[test]
    fn same_seed_same_sequence() {
        assert_eq!(
            sequence(42, StimulusPolicy::Balanced),
            sequence(42, StimulusPolicy::Balanced)
        );
        assert_eq!(
            sequence(7, StimulusPolicy::Independent),
            sequence(7, StimulusPolicy::Independent)
        );
    }

    #[test]
    fn instruction_is_carried_through() {
        let mut generator =
            TrialGenerator::new(StdRng::seed_from_u64(1), StimulusPolicy::Independent);
        let trial = generator.generate(Instruction::Color);
        assert_eq!(trial.instruction(), Instruction::Color);
        assert_eq!(trial.correct_answer(), trial.ink().name());
    }

    #[test]
    fn balanced_policy_is_roughly_half_consistent() {
        let mut generator = TrialGenerator::new(StdRng::seed_from_u64(2024), StimulusPolicy::Balanced);
        let consistent = (0..4000)
            .map(|_| generator.generate(Instruction::Word))
            .filter(|t| t.condition() == Condition::Consistent)
            .count();
        assert!((1700..=2300).contains(&consistent), "got {consistent}");
    }

    #[test]
    fn independent_policy_is_roughly_quarter_consistent() {
        let mut generator =
            TrialGenerator::new(StdRng::seed_from_u64(2024), StimulusPolicy::Independent);
        let consistent = (0..4000)
            .map(|_| generator.generate(Instruction::Word))
            .filter(|t| t.condition() == Condition::Consistent)
            .count();
        assert!((800..=1200).contains(&consistent), "got {consistent}");
    }

    #[test]
    fn balanced_inconsistent_ink_covers_every_other_colour() {
        let mut generator = TrialGenerator::new(StdRng::seed_from_u64(99), StimulusPolicy::Balanced);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..2000 {
            let trial = generator.generate(Instruction::Word);
            if trial.word() == StroopColor::Red && trial.condition() == Condition::Inconsistent {
                seen.insert(trial.ink());
            }
        }
        assert_eq!(seen.len(), 3);
        assert!(!seen.contains(&StroopColor::Red));
    }
}
