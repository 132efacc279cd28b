use thiserror::Error;

/// The upstream snapshot collaborator could not produce a snapshot this tick.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("data source unavailable: {reason}")]
pub struct DataSourceUnavailable {
    pub reason: String,
}

impl DataSourceUnavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Errors raised by the imbalance pipeline
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImbalanceError {
    /// Malformed configuration or call parameters. Never silently corrected.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    DataSourceUnavailable(#[from] DataSourceUnavailable),

    /// The loop stopped after too many consecutive data-source failures.
    #[error("stream stopped after {failures} consecutive data source failures (last: {last})")]
    FailureLimitExceeded { failures: u32, last: DataSourceUnavailable },
}

impl ImbalanceError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        ImbalanceError::InvalidArgument(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, ImbalanceError>;
