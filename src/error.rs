//! Error types for command execution

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Failure to resolve or validate the paths of a [`CommandSpec`](crate::command::CommandSpec)
#[derive(Debug, Error)]
pub enum PathResolutionError {
    #[error("failed to determine current directory")]
    CurrentDir(#[source] io::Error),

    #[error("working directory is missing: {}", .0.display())]
    WorkingDirMissing(PathBuf),

    #[error("working directory must be a directory: {}", .0.display())]
    WorkingDirIsFile(PathBuf),

    #[error("executable not found: {name}")]
    ExecutableNotFound {
        name: String,
        #[source]
        source: which::Error,
    },

    #[error("executable must be a file: {}", .0.display())]
    ExecutableIsDirectory(PathBuf),

    #[error("file is not executable: {}", .0.display())]
    NotExecutable(PathBuf),

    #[error("failed to inspect {}", .path.display())]
    Inspect {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Pipe or process-start failure, optionally wrapping the OS error that caused it
#[derive(Debug)]
pub struct IoError {
    pub msg: String,
    pub source: Option<io::Error>,
}

impl IoError {
    pub fn new(msg: impl Into<String>, source: io::Error) -> Self {
        Self {
            msg: msg.into(),
            source: Some(source),
        }
    }

    pub fn without_cause(msg: impl Into<String>) -> Self {
        Self {
            msg: msg.into(),
            source: None,
        }
    }
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(cause) => write!(f, "{} - {}", self.msg, cause),
            None => f.write_str(&self.msg),
        }
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Every way a single execution can fail
#[derive(Debug, Error)]
pub enum ExecError {
    #[error(transparent)]
    PathResolution(#[from] PathResolutionError),

    #[error(transparent)]
    Io(#[from] IoError),

    #[error("stdout overflow")]
    StdoutOverflow,

    #[error("stderr overflow")]
    StderrOverflow,

    #[error("timeout reached")]
    Timeout,

    /// Non-zero or signal-terminated exit status
    #[error("{0}")]
    ProcessExit(ExitStatus),
}

/// Failure to load an [`EngineConfig`](crate::config::EngineConfig)
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
