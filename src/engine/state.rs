use std::path::PathBuf;
use tracing::info;

use crate::storage::{AttemptStatus, PostingStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Init,
    Auth,
    Search,
    List,
    OpenPosting,
    ApplyClick,
    FormStep,
    Submit,
    Confirmed,
    Skipped,
    Aborted,
}

pub fn log_state(state: FlowState) {
    info!("apply_flow_state={:?}", state);
}

/// How one posting ended. Browser death is not an outcome: it aborts the
/// run and leaves the attempt pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostingOutcome {
    Confirmed,
    AlreadyApplied,
    NoApplyControl { screenshot: Option<PathBuf> },
    Discarded { saved: bool },
    Stalled { screenshot: Option<PathBuf> },
    StepCapExceeded { screenshot: Option<PathBuf> },
    ConfirmationTimeout { screenshot: Option<PathBuf> },
    Cancelled,
    SelectorMiss(String),
}

impl PostingOutcome {
    /// Terminal state of the posting in the top-level machine.
    pub fn final_state(&self) -> FlowState {
        match self {
            PostingOutcome::Confirmed => FlowState::Confirmed,
            PostingOutcome::Cancelled => FlowState::Aborted,
            _ => FlowState::Skipped,
        }
    }

    pub fn attempt_status(&self) -> AttemptStatus {
        match self {
            PostingOutcome::Confirmed => AttemptStatus::Success,
            PostingOutcome::AlreadyApplied | PostingOutcome::NoApplyControl { .. } => AttemptStatus::Skipped,
            _ => AttemptStatus::Failed,
        }
    }

    pub fn error_text(&self) -> Option<String> {
        match self {
            PostingOutcome::Confirmed
            | PostingOutcome::AlreadyApplied
            | PostingOutcome::NoApplyControl { .. } => None,
            PostingOutcome::Discarded { saved: false } => Some("user-style discard".into()),
            PostingOutcome::Discarded { saved: true } => Some("saved for later".into()),
            PostingOutcome::Stalled { .. } => Some("form stalled".into()),
            PostingOutcome::StepCapExceeded { .. } => Some("max form steps exceeded".into()),
            PostingOutcome::ConfirmationTimeout { .. } => Some("confirmation timeout".into()),
            PostingOutcome::Cancelled => Some("cancelled".into()),
            PostingOutcome::SelectorMiss(label) => Some(label.clone()),
        }
    }

    pub fn posting_status(&self) -> PostingStatus {
        match self {
            PostingOutcome::Confirmed => PostingStatus::Applied,
            PostingOutcome::AlreadyApplied => PostingStatus::AlreadyApplied,
            PostingOutcome::NoApplyControl { .. } | PostingOutcome::Cancelled => PostingStatus::Found,
            PostingOutcome::SelectorMiss(_) => PostingStatus::ApplicationError,
            _ => PostingStatus::ApplicationFailed,
        }
    }

    /// Capture taken when the posting went wrong, if any.
    pub fn screenshot(&self) -> Option<&PathBuf> {
        match self {
            PostingOutcome::NoApplyControl { screenshot }
            | PostingOutcome::Stalled { screenshot }
            | PostingOutcome::StepCapExceeded { screenshot }
            | PostingOutcome::ConfirmationTimeout { screenshot } => screenshot.as_ref(),
            _ => None,
        }
    }
}
