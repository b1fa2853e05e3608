//! Engine configuration

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::command::DEFAULT_OUTPUT_CAP;
use crate::error::ConfigError;
use crate::pumps::DEFAULT_CHUNK_SIZE;

/// Name of the resource limiter program, resolved against the current directory
pub const DEFAULT_LIMITER_PROGRAM: &str = "rlimiter";

/// Settings shared by every execution of an [`Engine`](crate::engine::Engine)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Cap used when a spec leaves `stdout_cap` at zero
    pub default_stdout_cap: usize,
    /// Cap used when a spec leaves `stderr_cap` at zero
    pub default_stderr_cap: usize,
    pub limiter_program: PathBuf,
    pub read_chunk_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_stdout_cap: DEFAULT_OUTPUT_CAP,
            default_stderr_cap: DEFAULT_OUTPUT_CAP,
            limiter_program: PathBuf::from(DEFAULT_LIMITER_PROGRAM),
            read_chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl EngineConfig {
    /// Load a TOML config file; missing keys keep their defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("default_stdout_cap", self.default_stdout_cap),
            ("default_stderr_cap", self.default_stderr_cap),
            ("read_chunk_size", self.read_chunk_size),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }
        if self.limiter_program.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                field: "limiter_program",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
