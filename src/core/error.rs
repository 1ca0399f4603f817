use std::time::Duration;
use thiserror::Error;

use crate::browser::DriverError;
use crate::storage::StorageError;

/// Conditions that end a run. Per-posting misses never surface here; they
/// become terminal attempt rows instead.
#[derive(Debug, Error)]
pub enum AutomationError {
    #[error("browser launch failed: {0}")]
    BrowserLaunchFailed(String),

    #[error("browser session lost")]
    SessionLost,

    #[error("no stored credentials for platform '{0}'")]
    MissingCredentials(String),

    #[error("login rejected: {0}")]
    LoginRejected(String),

    #[error("security challenge not resolved within {0:?}")]
    ChallengeTimeout(Duration),

    #[error("timed out waiting for {0}")]
    SelectorTimeout(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("platform '{0}' has no implemented selector policy")]
    UnsupportedPlatform(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<DriverError> for AutomationError {
    fn from(e: DriverError) -> Self {
        match e {
            DriverError::SessionClosed => AutomationError::SessionLost,
            other => AutomationError::Navigation(other.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("automation is already running")]
    AlreadyRunning,

    #[error("no automation is running")]
    NotRunning,
}
