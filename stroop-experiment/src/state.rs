use super::config::SessionConfig;
use super::error::ConfigError;
use super::generator::TrialGenerator;
use super::store::TrialStore;
use super::summary::SessionSummary;
use super::trial::ActiveTrial;
use rand::Rng;
use stroop_core::{
    INACTIVE_ANSWER, Instruction, SessionContext, SessionPhase, SessionStats, StroopTrial,
    TrialOutcome,
};
use stroop_timing::{ClockEvent, Timer, TrialClock};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Start,
    Response(String),
    Timeout,
    FeedbackElapsed,
    ItiElapsed,
    Pause,
    Resume,
    Inactive,
    Complete,
}

/// Drives one participant through the Stroop trial loop.
///
/// All mutation goes through the operation methods (or [`handle_event`]);
/// elapsed countdowns are picked up by [`update`], which the owner calls
/// from its event loop. Invalid calls are silent no-ops returning `false`.
///
/// [`handle_event`]: StroopSessionMachine::handle_event
/// [`update`]: StroopSessionMachine::update
pub struct StroopSessionMachine<T, R, S>
where
    T: Timer,
    R: Rng,
    S: TrialStore,
{
    phase: SessionPhase,
    paused: bool,
    clock: TrialClock<T>,
    generator: TrialGenerator<R>,
    store: S,
    config: SessionConfig,
    context: SessionContext,
    current: Option<ActiveTrial>,
    trial_number: u32,
    instruction: Instruction,
    stats: SessionStats,
    outcomes: Vec<TrialOutcome>,
    inactive_marked: bool,
}

impl<T, R, S> StroopSessionMachine<T, R, S>
where
    T: Timer,
    R: Rng,
    S: TrialStore,
{
    pub fn new(
        config: SessionConfig,
        context: SessionContext,
        timer: T,
        rng: R,
        store: S,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            phase: SessionPhase::Idle,
            paused: false,
            clock: TrialClock::new(timer),
            generator: TrialGenerator::new(rng, config.stimulus_policy),
            store,
            instruction: config.initial_instruction,
            config,
            context,
            current: None,
            trial_number: 0,
            stats: SessionStats::default(),
            outcomes: Vec::new(),
            inactive_marked: false,
        })
    }

    pub fn start(&mut self) -> bool {
        if self.phase != SessionPhase::Idle {
            tracing::debug!(phase = ?self.phase, "start ignored");
            return false;
        }
        tracing::info!(
            session_id = %self.context.session_id,
            iti_ms = self.config.iti_ms,
            trial_timer_ms = self.config.trial_timer_ms,
            switch_period = self.config.instruction_switch_period,
            "stroop session started"
        );
        self.trial_number = 1;
        self.instruction = self.config.initial_instruction;
        self.begin_trial();
        true
    }

    /// Records the participant's answer for the current trial.
    pub fn respond(&mut self, answer: &str) -> bool {
        if self.paused || !self.phase.allows_input() {
            tracing::debug!(phase = ?self.phase, paused = self.paused, "response ignored");
            return false;
        }
        // A deadline that passed between polls wins over the late answer.
        if self.clock.response_expired() {
            tracing::debug!(trial = self.trial_number, "response arrived after the deadline");
            self.timeout();
            return false;
        }
        let Some(trial) = self.current.as_mut() else {
            return false;
        };
        if !trial.claim() {
            return false;
        }
        let (number, stimulus) = (trial.number, trial.stimulus);

        let reaction_ms = self.clock.reaction_time_ms().unwrap_or_default();
        self.clock.cancel_response_window();
        let outcome =
            TrialOutcome::answered(number, &stimulus, self.config.iti_ms, reaction_ms, answer);
        tracing::info!(
            trial = number,
            reaction_ms,
            correct = ?outcome.correct,
            "response recorded"
        );
        self.resolve(outcome);
        true
    }

    /// Resolves the current trial as skipped once its deadline has passed.
    pub fn timeout(&mut self) -> bool {
        if self.config.trial_timer_ms == 0 || self.paused || !self.phase.allows_input() {
            return false;
        }
        let Some(trial) = self.current.as_mut() else {
            return false;
        };
        if !trial.claim() {
            return false;
        }
        let (number, stimulus) = (trial.number, trial.stimulus);

        self.clock.cancel_response_window();
        let outcome = TrialOutcome::timed_out(
            number,
            &stimulus,
            self.config.iti_ms,
            self.config.trial_timer_ms,
        );
        tracing::info!(trial = number, "trial timed out");
        self.resolve(outcome);
        true
    }

    /// Leaves feedback: flips the instruction when the finished trial closes
    /// a switch period, then starts the ITI or the next trial.
    pub fn advance(&mut self) -> bool {
        if self.phase != SessionPhase::Feedback {
            return false;
        }
        self.clock.cancel_feedback();
        self.current = None;

        if self
            .config
            .max_trials
            .is_some_and(|max| self.trial_number >= max)
        {
            return self.complete();
        }

        if self.trial_number % self.config.instruction_switch_period == 0 {
            self.instruction = self.instruction.flipped();
            tracing::info!(
                after_trial = self.trial_number,
                instruction = %self.instruction,
                "instruction switched"
            );
        }
        self.trial_number += 1;

        if self.clock.start_iti(self.config.iti_ms) {
            self.phase = SessionPhase::InterTrialInterval;
        } else {
            self.begin_trial();
        }
        true
    }

    /// Flags the most recent outcome as inactive, once per episode. A new
    /// episode begins when the next trial starts.
    pub fn mark_inactive(&mut self) -> bool {
        if self.inactive_marked {
            return false;
        }
        let Some(last) = self.outcomes.last_mut() else {
            return false;
        };
        last.user_answer = Some(INACTIVE_ANSWER.to_string());
        self.inactive_marked = true;
        tracing::info!(trial = last.trial_number, "trial marked inactive");

        if let Err(e) = self.store.mark_last_inactive(&self.context) {
            tracing::warn!(error = %e, "failed to mark last trial inactive");
        }
        true
    }

    pub fn pause(&mut self) -> bool {
        self.set_paused(true)
    }

    pub fn resume(&mut self) -> bool {
        self.set_paused(false)
    }

    /// Applies an externally computed pause signal (inactivity, open modal).
    pub fn set_paused(&mut self, paused: bool) -> bool {
        if self.paused == paused || (paused && !self.phase.can_pause()) {
            return false;
        }
        self.paused = paused;
        self.clock.set_paused(paused);
        tracing::info!(paused, phase = ?self.phase, "session pause toggled");
        true
    }

    /// Ends the session. Terminal. A trial still awaiting a response is
    /// abandoned without an outcome.
    pub fn complete(&mut self) -> bool {
        if self.phase.is_complete() {
            return false;
        }
        self.clock.cancel_all();
        self.phase = SessionPhase::Complete;
        self.paused = false;
        self.current = None;
        tracing::info!(
            total = self.stats.total_trials,
            correct = self.stats.correct_answers,
            incorrect = self.stats.incorrect_answers,
            skipped = self.stats.skipped_trials,
            "stroop session complete"
        );
        true
    }

    /// Polls the clock and handles every countdown that ran out.
    pub fn update(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if self.paused || !self.phase.is_running() {
            return events;
        }
        for elapsed in self.clock.poll() {
            let event = match elapsed {
                ClockEvent::ResponseWindowElapsed => SessionEvent::Timeout,
                ClockEvent::FeedbackElapsed => SessionEvent::FeedbackElapsed,
                ClockEvent::ItiElapsed => SessionEvent::ItiElapsed,
            };
            if self.handle_event(event.clone()) {
                events.push(event);
            }
        }
        events
    }

    pub fn handle_event(&mut self, event: SessionEvent) -> bool {
        match event {
            SessionEvent::Start => self.start(),
            SessionEvent::Response(answer) => self.respond(&answer),
            SessionEvent::Timeout => self.timeout(),
            SessionEvent::FeedbackElapsed => self.advance(),
            SessionEvent::ItiElapsed => {
                if self.phase == SessionPhase::InterTrialInterval && !self.paused {
                    self.begin_trial();
                    true
                } else {
                    false
                }
            }
            SessionEvent::Pause => self.pause(),
            SessionEvent::Resume => self.resume(),
            SessionEvent::Inactive => self.mark_inactive(),
            SessionEvent::Complete => self.complete(),
        }
    }

    fn begin_trial(&mut self) {
        let stimulus = self.generator.generate(self.instruction);
        let now = self.clock.now();
        self.current = Some(ActiveTrial::new(self.trial_number, stimulus));
        self.inactive_marked = false;
        self.phase = SessionPhase::AwaitingResponse;
        self.clock.start_response_window(self.config.trial_timer_ms);
        tracing::debug!(
            trial = self.trial_number,
            instruction = %stimulus.instruction(),
            word = stimulus.word().word(),
            ink = %stimulus.ink(),
            at_ms = now,
            "trial started"
        );
    }

    fn resolve(&mut self, outcome: TrialOutcome) {
        self.stats.record(&outcome);
        if let Err(e) = self.store.record(&outcome) {
            tracing::warn!(trial = outcome.trial_number, error = %e, "failed to persist trial outcome");
        }
        self.outcomes.push(outcome);
        self.phase = SessionPhase::Feedback;
        if !self.clock.start_feedback(self.config.feedback_ms) {
            self.advance();
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn outcomes(&self) -> &[TrialOutcome] {
        &self.outcomes
    }

    pub fn last_outcome(&self) -> Option<&TrialOutcome> {
        self.outcomes.last()
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary::from_outcomes(&self.outcomes)
    }

    pub fn current_trial(&self) -> Option<&StroopTrial> {
        self.current.as_ref().map(|t| &t.stimulus)
    }

    pub fn trial_number(&self) -> u32 {
        self.trial_number
    }

    pub fn instruction(&self) -> Instruction {
        self.instruction
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn clock(&self) -> &TrialClock<T> {
        &self.clock
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}
