//! The outcome of one execution

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything a caller or persistence layer learns about a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecResult {
    /// Captured stdout, at most the configured cap
    pub stdout: Vec<u8>,
    /// Captured stderr, at most the configured cap
    pub stderr: Vec<u8>,
    /// Exit code; -1 when terminated by a signal, 0 when no status is available
    pub exit_code: i32,
    /// Empty iff the run completed cleanly
    pub error: String,
    pub completed_at: DateTime<Utc>,
    /// True only if this engine terminated the process group
    pub killed: bool,
    /// Non-empty iff `killed`
    pub kill_reason: String,
}

impl ExecResult {
    pub fn is_clean(&self) -> bool {
        self.error.is_empty()
    }

    pub fn stdout_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }

    pub fn stderr_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stderr)
    }

    /// One-line status, e.g. `KILLED (timeout reached) - exit code -1`
    pub fn summary(&self) -> String {
        let status = if self.killed {
            format!("KILLED ({})", self.kill_reason)
        } else if self.is_clean() {
            "OK".to_string()
        } else {
            format!("FAILED ({})", self.error)
        };
        format!("{} - exit code {}", status, self.exit_code)
    }
}
