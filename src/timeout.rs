//! Wall-clock bound for a running child

use std::io;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::killer::{KillReason, Killer};

/// Schedule a one-shot timeout kill, counted from now
///
/// Nothing is scheduled for a zero `timeout`. The timer is never cancelled:
/// if the child finishes first, the late request lands on a retired or
/// vanished group and does nothing. Returns whether a timer was armed.
pub fn arm_timeout(timeout: Duration, killer: Arc<Killer>) -> io::Result<bool> {
    if timeout.is_zero() {
        return Ok(false);
    }

    thread::Builder::new()
        .name("execguard-timeout".to_string())
        .spawn(move || {
            thread::sleep(timeout);
            debug!(?timeout, "timeout elapsed");
            killer.kill(KillReason::Timeout);
        })?;

    Ok(true)
}
