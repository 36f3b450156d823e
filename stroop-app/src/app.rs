use crate::config::AppConfig;
use anyhow::{Context, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;
use std::time::Duration;
use stroop_core::{SessionContext, SessionPhase, StroopColor, StroopTrial, TrialOutcome};
use stroop_experiment::{
    JsonlTrialStore, SessionEvent, SessionSummary, StroopSessionMachine,
};
use stroop_timing::MonotonicTimer;
use tokio::io::{AsyncBufReadExt, BufReader};

/// A line typed by the participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Answer(String),
    Pause,
    Resume,
    Inactive,
    Quit,
    Empty,
}

impl Input {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        match line {
            "" => Input::Empty,
            ":pause" | ":p" => Input::Pause,
            ":resume" | ":r" => Input::Resume,
            ":inactive" => Input::Inactive,
            ":quit" | ":q" => Input::Quit,
            _ => Input::Answer(expand_shortcut(line).to_string()),
        }
    }

    fn into_event(self) -> Option<SessionEvent> {
        match self {
            Input::Answer(answer) => Some(SessionEvent::Response(answer)),
            Input::Pause => Some(SessionEvent::Pause),
            Input::Resume => Some(SessionEvent::Resume),
            Input::Inactive => Some(SessionEvent::Inactive),
            Input::Quit => Some(SessionEvent::Complete),
            Input::Empty => None,
        }
    }
}

/// Single-letter answers map to colour names.
fn expand_shortcut(answer: &str) -> &str {
    match answer.to_ascii_lowercase().as_str() {
        "r" => "red",
        "b" => "blue",
        "g" => "green",
        "y" => "yellow",
        _ => answer,
    }
}

pub struct App {
    experiment: StroopSessionMachine<MonotonicTimer, StdRng, JsonlTrialStore>,
    tick: Duration,
    announced_trial: Option<u32>,
}

impl App {
    pub fn new(config: &AppConfig, out: Option<PathBuf>) -> Result<Self> {
        let trials_path = out.unwrap_or_else(|| config.trials_path.clone());
        let store = JsonlTrialStore::open(&trials_path)
            .with_context(|| format!("failed to open trial log {}", trials_path.display()))?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let context = SessionContext {
            user_id: config.participant.user_id.clone(),
            session_id: config
                .participant
                .session_id
                .clone()
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        };
        let experiment = StroopSessionMachine::new(
            config.session.clone(),
            context,
            MonotonicTimer::new(),
            rng,
            store,
        )?;

        Ok(Self {
            experiment,
            tick: Duration::from_millis(config.tick_ms),
            announced_trial: None,
        })
    }

    /// Runs until the participant quits, stdin closes or `max_trials` is reached.
    pub async fn run(mut self) -> Result<SessionSummary> {
        println!("=== STROOP TASK ===");
        println!("Answer with a colour name (or r/b/g/y).");
        println!("Commands: :pause  :resume  :inactive  :quit\n");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut ticker = tokio::time::interval(self.tick);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        self.experiment.handle_event(SessionEvent::Start);
        self.announce();

        while !self.experiment.phase().is_complete() {
            tokio::select! {
                _ = ticker.tick() => {
                    for event in self.experiment.update() {
                        if event == SessionEvent::Timeout {
                            println!("  too slow");
                        }
                    }
                    self.announce();
                }
                line = lines.next_line() => {
                    let input = match line.context("failed to read stdin")? {
                        Some(line) => Input::parse(&line),
                        None => Input::Quit,
                    };
                    self.handle_input(input);
                }
            }
        }

        let stats = self.experiment.stats();
        println!(
            "\nSession complete: {} trials, {} correct, {} incorrect, {} skipped.",
            stats.total_trials, stats.correct_answers, stats.incorrect_answers, stats.skipped_trials
        );
        println!(
            "Results saved to {}",
            self.experiment.store().path().display()
        );
        Ok(self.experiment.summary())
    }

    fn handle_input(&mut self, input: Input) {
        let answered = matches!(input, Input::Answer(_));
        let Some(event) = input.into_event() else {
            return;
        };
        let accepted = self.experiment.handle_event(event.clone());
        match event {
            SessionEvent::Pause if accepted => println!("  paused"),
            SessionEvent::Resume if accepted => println!("  resumed"),
            SessionEvent::Inactive if accepted => println!("  last trial marked inactive"),
            _ => {}
        }
        if answered && accepted {
            if let Some(outcome) = self.experiment.last_outcome() {
                println!("  {}", feedback_line(outcome));
            }
        }
        self.announce();
    }

    /// Prints the stimulus once per trial.
    fn announce(&mut self) {
        if self.experiment.phase() != SessionPhase::AwaitingResponse
            || self.experiment.is_paused()
            || self.announced_trial == Some(self.experiment.trial_number())
        {
            return;
        }
        if let Some(trial) = self.experiment.current_trial() {
            println!(
                "[{}] {}",
                self.experiment.trial_number(),
                stimulus_line(trial)
            );
            self.announced_trial = Some(self.experiment.trial_number());
        }
    }
}

fn feedback_line(outcome: &TrialOutcome) -> &'static str {
    match outcome.correct {
        Some(true) => "correct",
        Some(false) => "incorrect",
        None => "too slow",
    }
}

/// Instruction prompt plus the word painted in its ink colour.
fn stimulus_line(trial: &StroopTrial) -> String {
    let prompt = match trial.instruction() {
        stroop_core::Instruction::Word => "WORD ",
        stroop_core::Instruction::Color => "COLOR",
    };
    format!("{prompt}  {}", paint(trial.word().word(), trial.ink()))
}

fn paint(text: &str, ink: StroopColor) -> String {
    let [r, g, b, _] = ink.rgba();
    format!("\x1b[1;38;2;{r};{g};{b}m{text}\x1b[0m")
}
