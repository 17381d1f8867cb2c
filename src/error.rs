// ⚠️ Registry errors
// One enum for everything the registry can refuse to do

use chrono::NaiveDate;
use thiserror::Error;

use crate::entities::CandidateKind;

#[derive(Error, Debug)]
pub enum RegistryError {
    /// Closing dates only ever move later
    #[error("Invalid closing date for {competition}: {requested} is earlier than {current}")]
    InvalidDate {
        competition: String,
        current: NaiveDate,
        requested: NaiveDate,
    },

    #[error("Candidate {candidate} cannot enroll in {competition}: only {required} accepted")]
    ModeMismatch {
        competition: String,
        candidate: String,
        required: CandidateKind,
    },

    #[error("Name already registered: {0}")]
    DuplicateKey(String),

    #[error("Competition not found: {0}")]
    CompetitionNotFound(String),

    #[error("Candidate not found: {0}")]
    CandidateNotFound(String),

    /// The external store refused the change; the registry was left untouched
    #[error("Store error: {0}")]
    Store(#[source] anyhow::Error),

    #[error("Persistence error: {0}")]
    Persistence(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;
