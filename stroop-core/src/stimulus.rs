use serde::{Deserialize, Serialize};
use std::fmt;

/// Colours used both as printed words and as ink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StroopColor {
    Red,
    Blue,
    Green,
    Yellow,
}

impl StroopColor {
    pub const ALL: [StroopColor; 4] = [
        StroopColor::Red,
        StroopColor::Blue,
        StroopColor::Green,
        StroopColor::Yellow,
    ];

    /// Lowercase colour name, the form answers are given in.
    pub fn name(&self) -> &'static str {
        match self {
            StroopColor::Red => "red",
            StroopColor::Blue => "blue",
            StroopColor::Green => "green",
            StroopColor::Yellow => "yellow",
        }
    }

    /// Uppercase form shown as the stimulus word.
    pub fn word(&self) -> &'static str {
        match self {
            StroopColor::Red => "RED",
            StroopColor::Blue => "BLUE",
            StroopColor::Green => "GREEN",
            StroopColor::Yellow => "YELLOW",
        }
    }

    pub fn rgba(&self) -> [u8; 4] {
        match self {
            StroopColor::Red => [220, 38, 38, 255],
            StroopColor::Blue => [37, 99, 235, 255],
            StroopColor::Green => [22, 163, 74, 255],
            StroopColor::Yellow => [234, 179, 8, 255],
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for StroopColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which stimulus attribute the participant has to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Instruction {
    #[default]
    Word,
    Color,
}

impl Instruction {
    pub fn flipped(self) -> Self {
        match self {
            Instruction::Word => Instruction::Color,
            Instruction::Color => Instruction::Word,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Word => f.write_str("word"),
            Instruction::Color => f.write_str("color"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    Consistent,
    Inconsistent,
}

/// A single Stroop stimulus together with the instruction it is shown under.
///
/// Condition and correct answer are derived from the three fields, which
/// cannot change after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StroopTrial {
    instruction: Instruction,
    word: StroopColor,
    ink: StroopColor,
}

impl StroopTrial {
    pub fn new(instruction: Instruction, word: StroopColor, ink: StroopColor) -> Self {
        Self {
            instruction,
            word,
            ink,
        }
    }

    pub fn instruction(&self) -> Instruction {
        self.instruction
    }

    pub fn word(&self) -> StroopColor {
        self.word
    }

    pub fn ink(&self) -> StroopColor {
        self.ink
    }

    pub fn condition(&self) -> Condition {
        if self.word == self.ink {
            Condition::Consistent
        } else {
            Condition::Inconsistent
        }
    }

    pub fn correct_answer(&self) -> &'static str {
        match self.instruction {
            Instruction::Word => self.word.name(),
            Instruction::Color => self.ink.name(),
        }
    }

    /// Answers are compared after trimming, ignoring ASCII case.
    pub fn is_correct(&self, answer: &str) -> bool {
        answer.trim().eq_ignore_ascii_case(self.correct_answer())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_instruction_reports_the_printed_word() {
        let trial = StroopTrial::new(Instruction::Word, StroopColor::Red, StroopColor::Blue);
        assert_eq!(trial.condition(), Condition::Inconsistent);
        assert_eq!(trial.correct_answer(), "red");
        assert!(trial.is_correct("red"));
        assert!(!trial.is_correct("blue"));
    }

    #[test]
    fn color_instruction_reports_the_ink() {
        let trial = StroopTrial::new(Instruction::Color, StroopColor::Red, StroopColor::Blue);
        assert_eq!(trial.correct_answer(), "blue");
        assert!(trial.is_correct(" Blue "));
    }

    #[test]
    fn matching_word_and_ink_is_consistent() {
        let trial = StroopTrial::new(Instruction::Word, StroopColor::Green, StroopColor::Green);
        assert_eq!(trial.condition(), Condition::Consistent);
    }

    #[test]
    fn colour_names_parse_case_insensitively() {
        assert_eq!(StroopColor::from_name("YELLOW"), Some(StroopColor::Yellow));
        assert_eq!(StroopColor::from_name("purple"), None);
    }

    #[test]
    fn instruction_flip_alternates() {
        assert_eq!(Instruction::Word.flipped(), Instruction::Color);
        assert_eq!(Instruction::Color.flipped(), Instruction::Word);
    }
}
