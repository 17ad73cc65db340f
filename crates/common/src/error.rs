//! Error types for BookProbe

use thiserror::Error;

/// Result type alias using the common Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the data model and fixture loading
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unknown payment method: {0}")]
    UnknownPaymentMethod(String),

    #[error("Unknown answer '{0}' (expected yes or no)")]
    UnknownAnswer(String),

    #[error("Case group not found: {0}")]
    UnknownCaseGroup(String),

    #[error("Invalid fixture: {0}")]
    InvalidFixture(String),
}
