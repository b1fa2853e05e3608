//! Output caps, timeouts and the kill path

use std::time::{Duration, Instant};

use execguard::{execute, DEFAULT_OUTPUT_CAP};

use super::helpers::*;

#[test]
fn test_output_exactly_at_cap_is_clean() {
    let spec = shell("head -c 10 /dev/zero").stdout_cap(10);
    let result = execute(spec).expect("Failed to run");

    assert_eq!(result.stdout.len(), 10);
    assert!(result.is_clean(), "unexpected error: {}", result.error);
    assert!(!result.killed);
}

#[test]
fn test_stdout_one_byte_over_cap() {
    let spec = shell("head -c 11 /dev/zero; exec sleep 10").stdout_cap(10);
    let result = execute(spec).expect("Failed to run");

    assert_eq!(result.stdout.len(), 10);
    assert_eq!(result.error, "stdout overflow");
    assert!(result.killed);
    assert_eq!(result.kill_reason, "stdout overflow");
    assert_eq!(result.exit_code, -1);
}

#[test]
fn test_stderr_overflow() {
    let spec = shell("head -c 50 /dev/zero >&2; exec sleep 10").stderr_cap(20);
    let result = execute(spec).expect("Failed to run");

    assert_eq!(result.stderr.len(), 20);
    assert!(result.stdout.is_empty());
    assert_eq!(result.error, "stderr overflow");
    assert!(result.killed);
    assert_eq!(result.kill_reason, "stderr overflow");
}

#[test]
fn test_huge_cap_runs_normally() {
    let spec = shell("echo hi").stdout_cap(1usize << 45);
    let result = execute(spec).expect("Failed to run");

    assert_eq!(result.stdout, b"hi\n");
    assert!(result.is_clean(), "unexpected error: {}", result.error);
    assert!(!result.killed);
}

#[test]
fn test_infinite_output_bounded_by_default_cap() {
    let result = execute(shell("yes")).expect("Failed to run");

    assert_eq!(result.stdout.len(), DEFAULT_OUTPUT_CAP);
    assert!(result.killed);
    assert_eq!(result.error, "stdout overflow");
}

#[test]
fn test_both_streams_flooding_record_one_reason() {
    let spec = shell("yes out & yes err >&2")
        .stdout_cap(100)
        .stderr_cap(100);
    let result = execute(spec).expect("Failed to run");

    assert!(result.killed);
    assert!(
        result.kill_reason == "stdout overflow" || result.kill_reason == "stderr overflow",
        "unexpected kill reason: {}",
        result.kill_reason
    );
    assert_eq!(result.error, result.kill_reason);
    assert!(result.stdout.len() <= 100);
    assert!(result.stderr.len() <= 100);
}

#[test]
fn test_timeout_kills_child_ignoring_term() {
    let spec = shell("trap '' TERM; sleep 10").timeout(Duration::from_millis(200));

    let start = Instant::now();
    let result = execute(spec).expect("Failed to run");
    let elapsed = start.elapsed();

    assert!(result.killed);
    assert_eq!(result.kill_reason, "timeout reached");
    assert_eq!(result.error, "timeout reached");
    assert_eq!(result.exit_code, -1);
    assert!(elapsed >= Duration::from_millis(200), "returned too early: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(5), "timeout fired late: {elapsed:?}");
}

#[test]
fn test_timeout_kills_background_children_too() {
    // The grandchild holds stdout open; only a group kill releases the reader.
    let spec = shell("sleep 10 & wait").timeout(Duration::from_millis(200));

    let start = Instant::now();
    let result = execute(spec).expect("Failed to run");

    assert!(result.killed);
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_fast_exit_beats_timeout() {
    let spec = shell("echo done").timeout(Duration::from_secs(5));

    let start = Instant::now();
    let result = execute(spec).expect("Failed to run");

    assert!(result.is_clean(), "unexpected error: {}", result.error);
    assert!(!result.killed);
    assert!(start.elapsed() < Duration::from_secs(2));
}
