pub mod config;
pub mod error;
pub mod generator;
pub mod state;
pub mod store;
pub mod summary;
pub mod trial;

pub use config::SessionConfig;
pub use error::{ConfigError, StoreError};
pub use generator::{StimulusPolicy, TrialGenerator};
pub use state::{SessionEvent, StroopSessionMachine};
pub use store::{JsonlTrialStore, MemoryTrialStore, TrialRecord, TrialStore};
pub use summary::SessionSummary;
pub use trial::ActiveTrial;
