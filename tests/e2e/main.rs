//! End-to-end tests: the orchestration core against a fake cluster and the
//! `fake-tester` binary.

mod harness;
mod scenarios;
