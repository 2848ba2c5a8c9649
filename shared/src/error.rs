//! Error types for the parish skill.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while serving a skill request.
#[derive(Error, Debug)]
pub enum Error {
    /// DynamoDB or other store failure
    #[error("Store error: {0}")]
    Store(String),

    /// Reminders API failure
    #[error("Reminder error: {0}")]
    Reminder(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation error (bad request envelope, wrong skill id)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Malformed stored data
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

impl Error {
    /// Whether the failure came from a collaborator outside the skill.
    pub fn is_external(&self) -> bool {
        matches!(self, Error::Store(_) | Error::Reminder(_))
    }
}
