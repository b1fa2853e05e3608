//! Single-shot process-group termination
//!
//! Up to three triggers race to kill a running child: the stdout reader,
//! the stderr reader and the timeout guard. The [`Killer`] guarantees that at
//! most one of them signals the group and that exactly the reason of the
//! caller that acquired the lock first is recorded.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use nix::errno::Errno;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use tracing::{debug, error, info};

use crate::error::ExecError;

/// Why the engine terminated a process group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillReason {
    StdoutOverflow,
    StderrOverflow,
    Timeout,
}

impl KillReason {
    /// The error reported for a run terminated for this reason
    pub fn to_error(self) -> ExecError {
        match self {
            KillReason::StdoutOverflow => ExecError::StdoutOverflow,
            KillReason::StderrOverflow => ExecError::StderrOverflow,
            KillReason::Timeout => ExecError::Timeout,
        }
    }
}

impl fmt::Display for KillReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_error(), f)
    }
}

/// Delivers the termination signal to a process group
pub trait GroupSignal: Send + Sync {
    fn terminate_group(&self, pgid: Pid) -> nix::Result<()>;
}

/// SIGKILL to the whole group; cannot be caught or ignored by the child
#[derive(Debug, Default, Clone, Copy)]
pub struct Sigkill;

impl GroupSignal for Sigkill {
    fn terminate_group(&self, pgid: Pid) -> nix::Result<()> {
        killpg(pgid, Signal::SIGKILL)
    }
}

#[derive(Debug, Default)]
struct KillState {
    killed: bool,
    reason: Option<KillReason>,
    /// Set once the run is fully assembled; later requests are no-ops
    retired: bool,
}

pub struct Killer {
    pgid: Pid,
    signal: Box<dyn GroupSignal>,
    state: Mutex<KillState>,
}

impl Killer {
    /// Killer for the group led by `pgid`, using SIGKILL
    pub fn new(pgid: Pid) -> Self {
        Self::with_signal(pgid, Box::new(Sigkill))
    }

    pub fn with_signal(pgid: Pid, signal: Box<dyn GroupSignal>) -> Self {
        Self {
            pgid,
            signal,
            state: Mutex::new(KillState::default()),
        }
    }

    /// Request termination of the group
    ///
    /// Returns true only for the one call that actually signalled the group.
    /// A group that no longer exists is a benign race with normal exit and is
    /// not recorded; other signal failures are logged and dropped.
    pub fn kill(&self, reason: KillReason) -> bool {
        let mut state = self.lock();
        if state.killed || state.retired {
            return false;
        }

        match self.signal.terminate_group(self.pgid) {
            Ok(()) => {
                state.killed = true;
                state.reason = Some(reason);
                info!(pgid = self.pgid.as_raw(), %reason, "killed process group");
                true
            }
            Err(Errno::ESRCH) => {
                debug!(pgid = self.pgid.as_raw(), %reason, "process group already gone");
                false
            }
            Err(errno) => {
                error!(
                    pgid = self.pgid.as_raw(),
                    %reason,
                    error = %errno,
                    "failed to signal process group"
                );
                false
            }
        }
    }

    /// Stop honouring kill requests
    ///
    /// Called once every pipe has been drained and the leader reaped, so a
    /// late timer can no longer hit a recycled process group id.
    pub fn retire(&self) {
        self.lock().retired = true;
    }

    /// The recorded reason, if this killer terminated the group
    pub fn outcome(&self) -> Option<KillReason> {
        let state = self.lock();
        if state.killed {
            state.reason
        } else {
            None
        }
    }

    fn lock(&self) -> MutexGuard<'_, KillState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Killer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Killer")
            .field("pgid", &self.pgid)
            .field("state", &*self.lock())
            .finish()
    }
}
