//! Path resolution and argument expansion
//!
//! Turns a caller-built [`CommandSpec`] into one that can be launched:
//! absolute, existing working directory; absolute, executable program;
//! glob patterns in the arguments expanded against the working directory.
//!
//! Globs are matched by joining the pattern onto the (escaped) working
//! directory, so the process-wide current directory is never touched and
//! concurrent executions cannot observe each other's directory.

use std::env;
use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::command::CommandSpec;
use crate::error::PathResolutionError;

/// Characters that make an argument a glob pattern rather than a literal
const GLOB_META: &[char] = &['*', '?', '['];

/// Resolve and validate `spec` in place
///
/// On success `working_dir` is absolute and an existing directory,
/// `executable` is absolute, not a directory and has an execute bit set,
/// and every matching glob argument has been replaced by its matches.
pub fn verify(spec: &mut CommandSpec) -> Result<(), PathResolutionError> {
    let cwd = env::current_dir().map_err(PathResolutionError::CurrentDir)?;

    if spec.working_dir.is_relative() {
        spec.working_dir = cwd.join(&spec.working_dir).components().collect();
    }
    check_working_dir(&spec.working_dir)?;

    spec.executable = resolve_executable(&spec.executable, &spec.working_dir, spec.lookup_path)?;
    check_executable(&spec.executable)?;

    spec.arguments = expand_arguments(&spec.arguments, &spec.working_dir);

    Ok(())
}

fn check_working_dir(dir: &Path) -> Result<(), PathResolutionError> {
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(PathResolutionError::WorkingDirIsFile(dir.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(PathResolutionError::WorkingDirMissing(dir.to_path_buf()))
        }
        Err(source) => Err(PathResolutionError::Inspect {
            path: dir.to_path_buf(),
            source,
        }),
    }
}

/// Relative executables are looked up under `working_dir` first, then on PATH
fn resolve_executable(
    executable: &Path,
    working_dir: &Path,
    lookup_path: bool,
) -> Result<PathBuf, PathResolutionError> {
    if executable.is_absolute() {
        return Ok(executable.to_path_buf());
    }

    let candidate = working_dir.join(executable);
    match fs::metadata(&candidate) {
        Ok(_) => return Ok(candidate),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(PathResolutionError::Inspect {
                path: candidate,
                source,
            })
        }
    }

    let not_found = |source| PathResolutionError::ExecutableNotFound {
        name: executable.display().to_string(),
        source,
    };

    if !lookup_path {
        return Err(not_found(which::Error::CannotFindBinaryPath));
    }

    let found = which::which(executable).map_err(not_found)?;
    if found.is_absolute() {
        Ok(found)
    } else {
        let cwd = env::current_dir().map_err(PathResolutionError::CurrentDir)?;
        Ok(cwd.join(found))
    }
}

fn check_executable(executable: &Path) -> Result<(), PathResolutionError> {
    let meta = fs::metadata(executable).map_err(|source| PathResolutionError::Inspect {
        path: executable.to_path_buf(),
        source,
    })?;

    if meta.is_dir() {
        return Err(PathResolutionError::ExecutableIsDirectory(
            executable.to_path_buf(),
        ));
    }
    if meta.permissions().mode() & 0o111 == 0 {
        return Err(PathResolutionError::NotExecutable(executable.to_path_buf()));
    }
    Ok(())
}

/// Expand glob patterns in `arguments` against `base`
///
/// A pattern with one or more matches is replaced by those matches (in the
/// matcher's sorted order); anything else, including invalid patterns, is
/// kept as a literal.
pub fn expand_arguments(arguments: &[String], base: &Path) -> Vec<String> {
    let mut expanded = Vec::with_capacity(arguments.len());
    for arg in arguments {
        let matches = glob_under(base, arg);
        debug!(pattern = %arg, matches = matches.len(), "glob expansion");
        if matches.is_empty() {
            expanded.push(arg.clone());
        } else {
            expanded.extend(matches);
        }
    }
    expanded
}

fn glob_under(base: &Path, pattern: &str) -> Vec<String> {
    if !pattern.contains(GLOB_META) {
        return Vec::new();
    }

    let relative = Path::new(pattern).is_relative();
    let full_pattern = if relative {
        let Some(base_str) = base.to_str() else {
            return Vec::new();
        };
        format!(
            "{}/{}",
            glob::Pattern::escape(base_str.trim_end_matches('/')),
            pattern
        )
    } else {
        pattern.to_string()
    };

    let Ok(paths) = glob::glob(&full_pattern) else {
        return Vec::new();
    };

    paths
        .filter_map(Result::ok)
        .map(|path| {
            if relative {
                path.strip_prefix(base)
                    .map(Path::to_path_buf)
                    .unwrap_or(path)
            } else {
                path
            }
        })
        .map(|path| path.to_string_lossy().into_owned())
        .collect()
}
