//! Working directory and executable resolution, and limiter routing

use std::env;
use std::fs;

use execguard::{execute, CommandSpec, Engine, EngineConfig, ExecError, PathResolutionError};
use serial_test::serial;
use tempfile::TempDir;

use super::helpers::*;

/// Restores the process working directory when dropped
struct CwdGuard(std::path::PathBuf);

impl CwdGuard {
    fn enter(dir: &std::path::Path) -> Self {
        let previous = env::current_dir().expect("Failed to read current dir");
        env::set_current_dir(dir).expect("Failed to change dir");
        Self(previous)
    }
}

impl Drop for CwdGuard {
    fn drop(&mut self) {
        let _ = env::set_current_dir(&self.0);
    }
}

#[test]
fn test_script_in_working_dir_runs() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    write_script(dir.path(), "grade.sh", "echo graded \"$@\"");

    let spec = CommandSpec::new("grade.sh")
        .arg("task1")
        .working_dir(dir.path());
    let result = execute(spec).expect("Failed to run");

    assert!(result.is_clean(), "unexpected error: {}", result.error);
    assert_eq!(result.stdout_lossy(), "graded task1\n");
}

#[test]
fn test_unknown_program_fails_before_launch() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let spec = CommandSpec::new("no-such-program-8d1f").working_dir(dir.path());

    let err = execute(spec).unwrap_err();
    assert!(matches!(
        err,
        ExecError::PathResolution(PathResolutionError::ExecutableNotFound { .. })
    ));
}

#[test]
fn test_non_executable_file_fails_before_launch() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    fs::write(dir.path().join("data.txt"), "not a program").unwrap();

    let spec = CommandSpec::new("data.txt").working_dir(dir.path());
    let err = execute(spec).unwrap_err();
    assert!(matches!(
        err,
        ExecError::PathResolution(PathResolutionError::NotExecutable(_))
    ));
}

#[test]
#[serial]
fn test_relative_working_dir_resolved_against_cwd() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    fs::create_dir(dir.path().join("job")).unwrap();
    let expected = dir.path().join("job").canonicalize().unwrap();

    let result = {
        let _cwd = CwdGuard::enter(dir.path());
        execute(CommandSpec::new("sh").args(["-c", "pwd -P"]).working_dir("job"))
            .expect("Failed to run")
    };

    assert_eq!(result.stdout_lossy().trim_end(), expected.display().to_string());
}

#[test]
#[serial]
fn test_limiter_receives_original_invocation() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let job = dir.path().join("job");
    fs::create_dir(&job).unwrap();
    let target = write_script(&job, "solution", "exit 0");
    let limiter = write_script(dir.path(), "rlimiter", "pwd -P\nprintf '%s\\n' \"$@\"");

    let engine = Engine::new(EngineConfig {
        limiter_program: limiter,
        ..EngineConfig::default()
    });
    let spec = CommandSpec::new("solution")
        .args(["--fast", "input.txt"])
        .working_dir(&job)
        .limiter_args(["-cpu", "2"]);

    let result = {
        let _cwd = CwdGuard::enter(dir.path());
        engine.execute(spec).expect("Failed to run")
    };

    assert!(result.is_clean(), "unexpected error: {}", result.error);
    let lines: Vec<String> = result.stdout_lossy().lines().map(str::to_string).collect();
    let expected = vec![
        dir.path().canonicalize().unwrap().display().to_string(),
        "-cpu".to_string(),
        "2".to_string(),
        "-wdir".to_string(),
        job.display().to_string(),
        "-executable".to_string(),
        target.display().to_string(),
        "--".to_string(),
        "--fast".to_string(),
        "input.txt".to_string(),
    ];
    assert_eq!(lines, expected);
}
