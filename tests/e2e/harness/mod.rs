//! E2E test harness for the client configuration scenarios.
//!
//! Runs the real orchestration core against a fake supervisor and the
//! `fake-tester` binary. Some helpers are only used by a subset of the
//! scenario files.

#![allow(dead_code)]

pub mod assertions;
pub mod scenario;
pub mod supervisor;

pub use assertions::{assert_clean, assert_exited_with, assert_group_passed, assert_passed};
pub use scenario::Scenario;
pub use workspace::TestWorkspace;
