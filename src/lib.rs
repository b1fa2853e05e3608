//! Bounded execution of untrusted programs
//!
//! Runs an external program in its own process group, feeds it input,
//! captures stdout and stderr up to a cap and kills the whole group on
//! overflow or timeout. Every run that starts produces an [`ExecResult`].

pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod format;
pub mod killer;
pub mod launcher;
pub mod limiter;
pub mod pumps;
pub mod result;
pub mod timeout;
pub mod verify;

pub use command::{CommandSpec, DEFAULT_OUTPUT_CAP};
pub use config::EngineConfig;
pub use engine::{execute, Engine};
pub use error::{ConfigError, ExecError, IoError, PathResolutionError};
pub use killer::KillReason;
pub use result::ExecResult;
