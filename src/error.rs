// Error types module

use thiserror::Error;

/// Result alias used across the harness
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Centralized error type for the verification pipeline
///
/// Each variant maps to one failure kind of the audit-record pipeline so a
/// failing run names the stage (setup, framing, syslog wait, field check)
/// that broke.
#[derive(Error, Debug)]
pub enum HarnessError {
    /// Configuration errors (invalid YAML, missing env vars, bad values)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A management request returned a non-success outcome
    #[error("Management operation '{operation}' failed: {description}")]
    Management {
        operation: String,
        description: String,
    },

    /// A file or datagram payload could not be parsed after timestamp stripping
    #[error("Framing error: {source}; payload: {payload}")]
    Framing {
        payload: String,
        #[source]
        source: serde_json::Error,
    },

    /// No datagram arrived within the scaled timeout
    #[error("Event wasn't logged into the syslog")]
    Timeout,

    /// A datagram arrived without a message part
    #[error("Message in the syslog event is empty")]
    EmptyMessage,

    /// A record field does not hold the expected value or defined-ness
    #[error("Unexpected value in {label}: field '{field}' expected {expected}, found {actual}")]
    FieldInvariant {
        label: String,
        field: String,
        expected: String,
        actual: String,
    },

    /// The file sink held a different number of records than expected
    #[error("Expected {expected} audit record(s) but found {actual}: {records}")]
    CountMismatch {
        expected: usize,
        actual: usize,
        records: String,
    },

    /// Server controller or management client failures
    #[error("Server error: {0}")]
    Server(String),

    /// Syslog listener failures
    #[error("Syslog error: {0}")]
    Syslog(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarnessError {
    /// Build a framing error from the raw payload and the parser failure
    pub fn framing(payload: impl Into<String>, source: serde_json::Error) -> Self {
        HarnessError::Framing {
            payload: payload.into(),
            source,
        }
    }
}
