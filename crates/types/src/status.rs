// crates/types/src/status.rs
//! Job lifecycle states and the transition rules between them.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a download job.
///
/// Jobs move `queued → starting → downloading ⇄ converting → completed`.
/// `starting`, `downloading` and `converting` can each fail; any non-terminal
/// state can be cancelled. The three terminal states accept no further
/// transitions: a late engine callback against a terminal record is ignored,
/// not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Starting,
    Downloading,
    Converting,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Whether this state accepts no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Whether the state machine permits moving from `self` to `next`.
    ///
    /// Cancellation is allowed from any non-terminal state. `converting` can
    /// fall back to `downloading` because a playlist entry or a second stream
    /// (audio after video) restarts the transfer phase after a merge step.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self, next) {
            (_, Self::Cancelled) => true,
            (Self::Queued, Self::Starting) => true,
            (Self::Starting, Self::Downloading)
            | (Self::Starting, Self::Converting)
            | (Self::Starting, Self::Completed)
            | (Self::Starting, Self::Failed) => true,
            (Self::Downloading, Self::Converting)
            | (Self::Downloading, Self::Completed)
            | (Self::Downloading, Self::Failed) => true,
            (Self::Converting, Self::Downloading)
            | (Self::Converting, Self::Completed)
            | (Self::Converting, Self::Failed) => true,
            _ => false,
        }
    }

    /// Wire name of the status, matching the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Starting => "starting",
            Self::Downloading => "downloading",
            Self::Converting => "converting",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
