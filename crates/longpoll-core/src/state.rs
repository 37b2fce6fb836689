//! Per-run polling progress record.

use serde::Serialize;
use std::fmt;

/// Status of a polling run. Only `Pending` may change; the other two are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PollStatus {
    #[default]
    Pending,
    Complete,
    Error,
}

impl PollStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, PollStatus::Pending)
    }
}

impl fmt::Display for PollStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PollStatus::Pending => "pending",
            PollStatus::Complete => "complete",
            PollStatus::Error => "error",
        };
        f.pad(s)
    }
}

/// Progress of one polling run. Reset at the start of every run and returned at the end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollState {
    /// Raw body of the most recent request that returned a parseable body.
    pub last_response: Option<String>,
    /// Responses classified as pending or complete. Failed requests are not counted.
    pub poll_count: u32,
    /// Retry cycles started; -1 before the run begins.
    pub retry_count: i64,
    /// Wall-clock duration of the whole run, set once at the end.
    pub elapsed_ms: u64,
    pub status: PollStatus,
    /// Cause of failure; only set when `status` is `Error`.
    pub error_detail: Option<String>,
}

impl Default for PollState {
    fn default() -> Self {
        Self::new()
    }
}

impl PollState {
    pub fn new() -> Self {
        Self {
            last_response: None,
            poll_count: 0,
            retry_count: -1,
            elapsed_ms: 0,
            status: PollStatus::Pending,
            error_detail: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == PollStatus::Pending
    }

    /// Marks the run complete. Returns false (and changes nothing) if already terminal.
    pub fn complete(&mut self) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = PollStatus::Complete;
        true
    }

    /// Marks the run failed with `detail`. Returns false (and changes nothing) if already terminal.
    pub fn fail(&mut self, detail: impl Into<String>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = PollStatus::Error;
        self.error_detail = Some(detail.into());
        true
    }
}
