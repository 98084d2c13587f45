use std::time::Duration;

use mongodb::error::ErrorKind;

use crate::config::ConfigViolations;

/// MongoDB reports failed SCRAM/X.509 authentication with this server error code
const AUTHENTICATION_FAILED_CODE: i32 = 18;

/// Error type for store operations
///
/// Driver failures are carried unchanged in [`StoreError::Mongo`]; use [`StoreError::kind`]
/// to tell authentication failures apart from unreachable servers.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigViolations),

    #[error("Deadline of {0:?} exceeded while connecting to MongoDB")]
    DeadlineExceeded(Duration),

    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("Store is already running")]
    AlreadyRunning,

    #[error("Store is not running")]
    NotRunning,
}

/// Coarse classification of a [`StoreError`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreErrorKind {
    InvalidConfig,
    DeadlineExceeded,
    AuthenticationFailed,
    Unreachable,
    AlreadyRunning,
    NotRunning,
    Other,
}

impl StoreError {
    pub fn kind(&self) -> StoreErrorKind {
        match self {
            StoreError::InvalidConfig(_) => StoreErrorKind::InvalidConfig,
            StoreError::DeadlineExceeded(_) => StoreErrorKind::DeadlineExceeded,
            StoreError::AlreadyRunning => StoreErrorKind::AlreadyRunning,
            StoreError::NotRunning => StoreErrorKind::NotRunning,
            StoreError::Mongo(err) => classify(err),
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.kind() == StoreErrorKind::DeadlineExceeded
    }

    pub fn is_auth_failure(&self) -> bool {
        self.kind() == StoreErrorKind::AuthenticationFailed
    }
}

fn classify(err: &mongodb::error::Error) -> StoreErrorKind {
    match err.kind.as_ref() {
        ErrorKind::Authentication { .. } => StoreErrorKind::AuthenticationFailed,
        ErrorKind::Command(command) if command.code == AUTHENTICATION_FAILED_CODE => {
            StoreErrorKind::AuthenticationFailed
        }
        ErrorKind::Io(_) | ErrorKind::DnsResolve { .. } | ErrorKind::ServerSelection { .. } => {
            StoreErrorKind::Unreachable
        }
        _ => StoreErrorKind::Other,
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
