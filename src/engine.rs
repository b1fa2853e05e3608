//! Running one command to completion
//!
//! A run moves through verification, optional limiter rewriting, output-cap
//! defaulting and launch. Once the child is running, five units of control
//! proceed independently: the three pumps, this thread waiting on the
//! child, and an optional timeout timer. They share nothing but the
//! [`Killer`]. The result is assembled only after the child has been reaped
//! and all three pumps have finished.

use std::env;
use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;
use std::sync::Arc;
use std::thread::JoinHandle;

use chrono::Utc;
use tracing::debug;

use crate::command::CommandSpec;
use crate::config::EngineConfig;
use crate::error::{ExecError, IoError, PathResolutionError};
use crate::format::preview;
use crate::killer::Killer;
use crate::launcher::{abandon, launch, ChildPipes, Launched};
use crate::limiter::apply_limiter;
use crate::pumps::{spawn_feeder, spawn_reader, Stream, StreamOutput};
use crate::result::ExecResult;
use crate::timeout::arm_timeout;
use crate::verify::verify;

/// Run `spec` with the default configuration
///
/// See [`Engine::execute`].
pub fn execute(spec: CommandSpec) -> Result<ExecResult, ExecError> {
    Engine::default().execute(spec)
}

#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

struct Pumps {
    stdin: JoinHandle<Option<ExecError>>,
    stdout: JoinHandle<StreamOutput>,
    stderr: JoinHandle<StreamOutput>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run `spec` to completion
    ///
    /// Returns `Err` only when the child could not be started: verification
    /// failures and pipe or start errors. Anything that happens once the
    /// child runs (non-zero exit, overflow, timeout, pipe errors) is reported
    /// in the returned [`ExecResult`].
    pub fn execute(&self, mut spec: CommandSpec) -> Result<ExecResult, ExecError> {
        debug!(
            executable = %spec.executable.display(),
            args = ?spec.arguments,
            workdir = %spec.working_dir.display(),
            input_len = spec.input.len(),
            "received exec command"
        );

        self.prepare(&mut spec)?;

        debug!(
            executable = %spec.executable.display(),
            args = ?spec.arguments,
            workdir = %spec.working_dir.display(),
            input_len = spec.input.len(),
            stdout_cap = spec.stdout_cap,
            stderr_cap = spec.stderr_cap,
            timeout = ?spec.timeout,
            "actual exec command"
        );

        let Launched {
            mut child,
            pgid,
            pipes,
        } = launch(&spec)?;
        let killer = Arc::new(Killer::new(pgid));

        let input = std::mem::take(&mut spec.input);
        let pumps = match self.start_pumps(pipes, input, &spec, &killer) {
            Ok(pumps) => pumps,
            Err(e) => {
                abandon(&mut child, Some(pgid));
                return Err(IoError::new("Starting I/O pumps failed", e).into());
            }
        };

        if let Err(e) = arm_timeout(spec.timeout, Arc::clone(&killer)) {
            abandon(&mut child, Some(pgid));
            return Err(IoError::new("Arming timeout failed", e).into());
        }

        let waited = child.wait();

        let stdin_error = pumps
            .stdin
            .join()
            .unwrap_or_else(|_| Some(IoError::without_cause("stdin pump panicked").into()));
        let stdout = join_reader(pumps.stdout, Stream::Stdout);
        let stderr = join_reader(pumps.stderr, Stream::Stderr);

        killer.retire();
        let kill = killer.outcome();

        let (exit_code, process_error) = match waited {
            Ok(status) => (exit_code(status), exit_error(status, &killer)),
            Err(e) => (0, Some(IoError::new("Waiting for program failed", e).into())),
        };

        debug!(
            stdout = %preview(&stdout.bytes),
            stderr = %preview(&stderr.bytes),
            error = ?process_error,
            "command result"
        );

        let error = process_error
            .or(stdin_error)
            .or(stdout.error)
            .or(stderr.error);

        Ok(ExecResult {
            stdout: stdout.bytes,
            stderr: stderr.bytes,
            exit_code,
            error: error.map(|e| e.to_string()).unwrap_or_default(),
            completed_at: Utc::now(),
            killed: kill.is_some(),
            kill_reason: kill.map(|reason| reason.to_string()).unwrap_or_default(),
        })
    }

    /// Verify, route through the limiter if requested, and default the caps
    fn prepare(&self, spec: &mut CommandSpec) -> Result<(), ExecError> {
        verify(spec)?;

        let cwd = env::current_dir().map_err(PathResolutionError::CurrentDir)?;
        apply_limiter(spec, &self.config.limiter_program, &cwd);

        spec.apply_default_caps(
            self.config.default_stdout_cap,
            self.config.default_stderr_cap,
        );
        Ok(())
    }

    fn start_pumps(
        &self,
        pipes: ChildPipes,
        input: Vec<u8>,
        spec: &CommandSpec,
        killer: &Arc<Killer>,
    ) -> std::io::Result<Pumps> {
        let ChildPipes {
            stdin,
            stdout,
            stderr,
        } = pipes;
        let chunk = self.config.read_chunk_size;

        Ok(Pumps {
            stdin: spawn_feeder(stdin, input)?,
            stdout: spawn_reader(
                Stream::Stdout,
                stdout,
                spec.stdout_cap,
                chunk,
                Arc::clone(killer),
            )?,
            stderr: spawn_reader(
                Stream::Stderr,
                stderr,
                spec.stderr_cap,
                chunk,
                Arc::clone(killer),
            )?,
        })
    }
}

fn join_reader(handle: JoinHandle<StreamOutput>, stream: Stream) -> StreamOutput {
    handle.join().unwrap_or_else(|_| StreamOutput {
        bytes: Vec::new(),
        error: Some(IoError::without_cause(format!("{} pump panicked", stream.name())).into()),
    })
}

/// Exit code of a reaped child; -1 for signal termination
fn exit_code(status: ExitStatus) -> i32 {
    match (status.code(), status.signal()) {
        (Some(code), _) => code,
        (None, Some(_)) => -1,
        (None, None) => 0,
    }
}

/// The process-level error of a run
///
/// A failure caused by our own kill is reported as the kill's reason rather
/// than as the resulting signal.
fn exit_error(status: ExitStatus, killer: &Killer) -> Option<ExecError> {
    if status.success() {
        return None;
    }
    match killer.outcome() {
        Some(reason) => Some(reason.to_error()),
        None => Some(ExecError::ProcessExit(status)),
    }
}
