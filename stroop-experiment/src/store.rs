use crate::error::StoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use stroop_core::{INACTIVE_ANSWER, SessionContext, TrialOutcome};

/// Destination for per-trial results.
///
/// Writes are fire-and-forget from the session's point of view: the machine
/// logs a failed write and carries on with the next trial.
pub trait TrialStore {
    fn record(&mut self, outcome: &TrialOutcome) -> Result<(), StoreError>;

    /// Sets the answer of the most recently recorded trial to `"inactive"`.
    fn mark_last_inactive(&mut self, context: &SessionContext) -> Result<(), StoreError>;
}

impl<S: TrialStore + ?Sized> TrialStore for Box<S> {
    fn record(&mut self, outcome: &TrialOutcome) -> Result<(), StoreError> {
        (**self).record(outcome)
    }

    fn mark_last_inactive(&mut self, context: &SessionContext) -> Result<(), StoreError> {
        (**self).mark_last_inactive(context)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryTrialStore {
    outcomes: Vec<TrialOutcome>,
    inactive_marks: usize,
}

impl MemoryTrialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn outcomes(&self) -> &[TrialOutcome] {
        &self.outcomes
    }

    /// Number of inactivity updates applied.
    pub fn inactive_marks(&self) -> usize {
        self.inactive_marks
    }
}

impl TrialStore for MemoryTrialStore {
    fn record(&mut self, outcome: &TrialOutcome) -> Result<(), StoreError> {
        self.outcomes.push(outcome.clone());
        Ok(())
    }

    fn mark_last_inactive(&mut self, context: &SessionContext) -> Result<(), StoreError> {
        let last = self
            .outcomes
            .iter_mut()
            .max_by_key(|o| o.recorded_at)
            .ok_or_else(|| StoreError::NothingToMark(context.session_id.clone()))?;
        last.user_answer = Some(INACTIVE_ANSWER.to_string());
        self.inactive_marks += 1;
        Ok(())
    }
}

/// One line of a JSONL trial log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrialRecord {
    Outcome(TrialOutcome),
    /// Amends the answer of `trial_number` to `"inactive"`.
    InactiveMark {
        user_id: String,
        session_id: String,
        trial_number: u32,
        marked_at: DateTime<Utc>,
    },
}

/// Append-only JSON-lines trial log. Inactivity marking appends an
/// amendment line instead of rewriting history.
#[derive(Debug)]
pub struct JsonlTrialStore {
    path: PathBuf,
    writer: BufWriter<File>,
    last_trial: Option<u32>,
}

impl JsonlTrialStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            last_trial: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads a log back, applying inactivity amendments to their outcomes.
    pub fn load(path: impl AsRef<Path>) -> Result<Vec<TrialOutcome>, StoreError> {
        let reader = BufReader::new(File::open(path)?);
        let mut outcomes: Vec<TrialOutcome> = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<TrialRecord>(&line)? {
                TrialRecord::Outcome(outcome) => outcomes.push(outcome),
                TrialRecord::InactiveMark { trial_number, .. } => {
                    if let Some(o) = outcomes
                        .iter_mut()
                        .rev()
                        .find(|o| o.trial_number == trial_number)
                    {
                        o.user_answer = Some(INACTIVE_ANSWER.to_string());
                    }
                }
            }
        }
        Ok(outcomes)
    }

    fn append(&mut self, record: &TrialRecord) -> Result<(), StoreError> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

impl TrialStore for JsonlTrialStore {
    fn record(&mut self, outcome: &TrialOutcome) -> Result<(), StoreError> {
        self.append(&TrialRecord::Outcome(outcome.clone()))?;
        self.last_trial = Some(outcome.trial_number);
        Ok(())
    }

    fn mark_last_inactive(&mut self, context: &SessionContext) -> Result<(), StoreError> {
        let trial_number = self
            .last_trial
            .ok_or_else(|| StoreError::NothingToMark(context.session_id.clone()))?;
        self.append(&TrialRecord::InactiveMark {
            user_id: context.user_id.clone(),
            session_id: context.session_id.clone(),
            trial_number,
            marked_at: Utc::now(),
        })
    }
}
