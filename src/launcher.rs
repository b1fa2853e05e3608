//! Spawning a verified command as its own process group

use std::os::unix::process::CommandExt;
use std::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command, Stdio};

use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use tracing::debug;

use crate::command::CommandSpec;
use crate::error::IoError;

/// The three pipe ends connected to the child
///
/// Each end is closed exactly once, when it is dropped.
#[derive(Debug)]
pub struct ChildPipes {
    pub stdin: ChildStdin,
    pub stdout: ChildStdout,
    pub stderr: ChildStderr,
}

/// A started child leading its own process group
#[derive(Debug)]
pub struct Launched {
    pub child: Child,
    pub pgid: Pid,
    pub pipes: ChildPipes,
}

/// Start `spec` with piped stdio as the leader of a new process group
///
/// On any failure after the child started, the group is killed and reaped
/// before returning, and pipe ends taken so far are dropped.
pub fn launch(spec: &CommandSpec) -> Result<Launched, IoError> {
    let mut child = Command::new(&spec.executable)
        .args(&spec.arguments)
        .current_dir(&spec.working_dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .process_group(0)
        .spawn()
        .map_err(|e| IoError::new("Starting program failed", e))?;

    let Ok(raw_pid) = i32::try_from(child.id()) else {
        abandon(&mut child, None);
        return Err(IoError::without_cause("Child process id out of range"));
    };
    let pgid = Pid::from_raw(raw_pid);

    match take_pipes(&mut child) {
        Ok(pipes) => {
            debug!(pid = raw_pid, "started process group");
            Ok(Launched { child, pgid, pipes })
        }
        Err(e) => {
            abandon(&mut child, Some(pgid));
            Err(e)
        }
    }
}

fn take_pipes(child: &mut Child) -> Result<ChildPipes, IoError> {
    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| IoError::without_cause("Opening stdin pipe failed"))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| IoError::without_cause("Opening stdout pipe failed"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| IoError::without_cause("Opening stderr pipe failed"))?;

    Ok(ChildPipes {
        stdin,
        stdout,
        stderr,
    })
}

/// Best-effort teardown of a child that will not be run to completion
pub(crate) fn abandon(child: &mut Child, pgid: Option<Pid>) {
    match pgid {
        Some(pgid) => {
            let _ = killpg(pgid, Signal::SIGKILL);
        }
        None => {
            let _ = child.kill();
        }
    }
    let _ = child.wait();
}
