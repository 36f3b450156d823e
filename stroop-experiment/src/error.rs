use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("instruction_switch_period must be at least 1")]
    ZeroSwitchPeriod,

    #[error("max_trials must be at least 1 when set")]
    ZeroMaxTrials,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("trial store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode trial record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("no trial recorded yet for session {0}")]
    NothingToMark(String),

    #[error("trial store unavailable: {0}")]
    Unavailable(String),
}
