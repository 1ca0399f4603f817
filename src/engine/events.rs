use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// Levels of the operator-facing log ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Success => "SUCCESS",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }

    /// Mirror an operator message into `tracing` at the matching level.
    pub fn trace(self, message: &str) {
        match self {
            LogLevel::Info | LogLevel::Success => info!("{}", message),
            LogLevel::Warning => warn!("{}", message),
            LogLevel::Error => error!("{}", message),
        }
    }
}

/// What the engine reports while it runs. The supervisor's run handle is the
/// production implementation.
pub trait RunObserver: Send + Sync {
    fn log(&self, level: LogLevel, message: &str);
    fn progress(&self, percent: u8);
    fn postings_found(&self, count: usize);
    fn application_sent(&self);
    fn is_cancelled(&self) -> bool;
}
