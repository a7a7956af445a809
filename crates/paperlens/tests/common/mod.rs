//! Shared test utilities for paperlens integration tests.
//!
//! This module provides:
//! - `TestHarness` for isolated runs with temp directories and a scripted backend
//! - Builder patterns for creating test configurations programmatically

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::{RecordingProgress, ScriptedCompleter, TestHarness};
