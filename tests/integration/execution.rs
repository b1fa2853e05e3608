//! Basic execution: capture, input, exit status and error priority

use std::fs;

use execguard::{execute, CommandSpec};
use tempfile::TempDir;

use super::helpers::*;

#[test]
fn test_silent_success_is_clean() {
    let result = execute(shell("exit 0")).expect("Failed to run");

    assert_eq!(result.exit_code, 0);
    assert!(result.stdout.is_empty());
    assert!(result.stderr.is_empty());
    assert!(!result.killed);
    assert_eq!(result.kill_reason, "");
    assert_eq!(result.error, "");
}

#[test]
fn test_captures_both_streams() {
    let result = execute(shell("echo out; echo err >&2")).expect("Failed to run");

    assert!(result.is_clean(), "unexpected error: {}", result.error);
    assert_eq!(result.stdout_lossy(), "out\n");
    assert_eq!(result.stderr_lossy(), "err\n");
}

#[test]
fn test_input_is_fed_and_closed() {
    let spec = shell("tr a-z A-Z").input("submission output\n");
    let result = execute(spec).expect("Failed to run");

    assert!(result.is_clean(), "unexpected error: {}", result.error);
    assert_eq!(result.stdout_lossy(), "SUBMISSION OUTPUT\n");
}

#[test]
fn test_nonzero_exit_reported_with_code() {
    let result = execute(shell("echo partial; exit 3")).expect("Failed to run");

    assert_eq!(result.exit_code, 3);
    assert_eq!(result.error, "exit status: 3");
    assert_eq!(result.stdout_lossy(), "partial\n");
    assert!(!result.killed);
}

#[test]
fn test_foreign_signal_is_not_a_kill() {
    let result = execute(shell("kill -9 $$")).expect("Failed to run");

    assert_eq!(result.exit_code, -1);
    assert!(result.error.contains("signal"), "error was: {}", result.error);
    assert!(!result.killed);
    assert_eq!(result.kill_reason, "");
}

#[test]
fn test_unread_input_reports_feed_error() {
    // Far more than a pipe buffer, never read by the child
    let spec = shell("exit 0").input(vec![b'x'; 1 << 20]);
    let result = execute(spec).expect("Failed to run");

    assert_eq!(result.exit_code, 0);
    assert!(
        result.error.starts_with("Writing stdin failed"),
        "error was: {}",
        result.error
    );
    assert!(!result.killed);
}

#[test]
fn test_exit_error_outranks_feed_error() {
    let spec = shell("exit 5").input(vec![b'x'; 1 << 20]);
    let result = execute(spec).expect("Failed to run");

    assert_eq!(result.exit_code, 5);
    assert_eq!(result.error, "exit status: 5");
}

#[test]
fn test_glob_arguments_expanded_in_working_dir() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    fs::write(dir.path().join("b.txt"), "").unwrap();
    fs::write(dir.path().join("a.txt"), "").unwrap();
    fs::write(dir.path().join("c.log"), "").unwrap();

    let spec = CommandSpec::new("echo")
        .args(["first", "*.txt", "last", "*.none"])
        .working_dir(dir.path());
    let result = execute(spec).expect("Failed to run");

    assert!(result.is_clean(), "unexpected error: {}", result.error);
    assert_eq!(result.stdout_lossy(), "first a.txt b.txt last *.none\n");
}

#[test]
fn test_runs_in_working_dir() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let expected = dir.path().canonicalize().unwrap();

    let spec = CommandSpec::new("sh")
        .args(["-c", "pwd -P"])
        .working_dir(dir.path());
    let result = execute(spec).expect("Failed to run");

    assert_eq!(result.stdout_lossy().trim_end(), expected.display().to_string());
}

#[test]
fn test_completed_at_is_set() {
    let before = chrono::Utc::now();
    let result = execute(shell("true")).expect("Failed to run");
    assert!(result.completed_at >= before);
}
