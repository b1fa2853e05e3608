//! The description of a single program invocation

use std::path::PathBuf;
use std::time::Duration;

/// Output cap applied when a stream's cap is left at zero (10kB)
pub const DEFAULT_OUTPUT_CAP: usize = 10_000;

/// Everything needed to run one program
///
/// Built by the caller, then resolved in place by [`verify`](crate::verify::verify)
/// and [`apply_limiter`](crate::limiter::apply_limiter) before launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Fall back to a PATH lookup when the executable is not found under `working_dir`
    pub lookup_path: bool,
    pub executable: PathBuf,
    pub working_dir: PathBuf,
    /// Bytes fed to the child's stdin
    pub input: Vec<u8>,
    /// Leading arguments for the resource limiter; empty disables it
    pub limiter_args: Vec<String>,
    pub arguments: Vec<String>,
    /// Wall-clock bound; zero disables it
    pub timeout: Duration,
    /// Zero means [`DEFAULT_OUTPUT_CAP`]
    pub stdout_cap: usize,
    /// Zero means [`DEFAULT_OUTPUT_CAP`]
    pub stderr_cap: usize,
}

impl CommandSpec {
    /// Create a spec for `executable`, run in the current directory with no
    /// arguments, no input, no timeout and default output caps
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            lookup_path: true,
            executable: executable.into(),
            working_dir: PathBuf::from("."),
            input: Vec::new(),
            limiter_args: Vec::new(),
            arguments: Vec::new(),
            timeout: Duration::ZERO,
            stdout_cap: 0,
            stderr_cap: 0,
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.arguments.push(arg.into());
        self
    }

    /// Append several arguments in order
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arguments.extend(args.into_iter().map(Into::into));
        self
    }

    /// Directory the program runs in; relative paths resolve against the current directory
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    /// Bytes written to the program's stdin before it is closed
    pub fn input(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.input = input.into();
        self
    }

    /// Wall-clock limit; `Duration::ZERO` disables it
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Maximum captured stdout bytes; 0 takes the engine default
    pub fn stdout_cap(mut self, cap: usize) -> Self {
        self.stdout_cap = cap;
        self
    }

    /// Maximum captured stderr bytes; 0 takes the engine default
    pub fn stderr_cap(mut self, cap: usize) -> Self {
        self.stderr_cap = cap;
        self
    }

    /// Arguments for the resource limiter; non-empty routes the run through it
    pub fn limiter_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.limiter_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Whether a relative executable missing from the working directory is searched on PATH
    pub fn lookup_path(mut self, enabled: bool) -> Self {
        self.lookup_path = enabled;
        self
    }

    /// Replace zero output caps with the given defaults
    pub fn apply_default_caps(&mut self, stdout_default: usize, stderr_default: usize) {
        if self.stdout_cap == 0 {
            self.stdout_cap = stdout_default;
        }
        if self.stderr_cap == 0 {
            self.stderr_cap = stderr_default;
        }
    }
}
