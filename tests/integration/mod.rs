//! Integration tests for execguard
//!
//! These tests run real child processes through the engine and check the
//! assembled results: capture, caps, timeouts, kills, path resolution and
//! limiter routing. The `cli` module drives the `execguard` binary itself.

pub mod execution;
pub mod limits;
pub mod resolution;
