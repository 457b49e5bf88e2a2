//! Expected and observed tester results, and the verdict between them.

use crate::config::ExpectationMode;
use crate::error::{HarnessError, Result};
use serde::Serialize;
use std::fmt;
use std::process::ExitStatus;

/// What a scenario expects the tester to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "code", rename_all = "snake_case")]
pub enum Expectation {
    /// The tester completes its transaction.
    Success,
    /// The tester fails with this error code.
    Error(i32),
}

impl Expectation {
    /// Builds the expectation for an optional expected error code.
    pub fn from_code(code: Option<i32>) -> Self {
        code.map_or(Self::Success, Self::Error)
    }

    /// Rejects expectations the mode cannot tell apart from success.
    pub fn validate(&self, mode: ExpectationMode) -> Result<()> {
        match (self, mode) {
            (Self::Error(code), ExpectationMode::ExitStatus) if exit_status_of(*code) == 0 => {
                Err(HarnessError::AmbiguousExpectedError(*code))
            }
            _ => Ok(()),
        }
    }

    /// The exit status the tester must report for this expectation.
    pub fn required_status(&self, mode: ExpectationMode) -> i32 {
        match (self, mode) {
            (Self::Error(code), ExpectationMode::ExitStatus) => exit_status_of(*code),
            _ => 0,
        }
    }

    /// Whether `observed` satisfies the expectation.
    pub fn is_met(&self, mode: ExpectationMode, observed: &Observation) -> bool {
        matches!(observed, Observation::Exited { status } if *status == self.required_status(mode))
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::Error(code) => write!(f, "error {}", code),
        }
    }
}

/// The exit status a process reports when it exits with `code`.
///
/// Unix truncates exit codes to their low byte.
pub fn exit_status_of(code: i32) -> i32 {
    if cfg!(unix) {
        code & 0xff
    } else {
        code
    }
}

/// How the tester process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Observation {
    /// Exited normally with a status.
    Exited { status: i32 },
    /// Terminated by a signal.
    Terminated { signal: Option<i32> },
    /// Killed by the runner's watchdog.
    WatchdogExpired { after_ms: u64 },
}

impl From<ExitStatus> for Observation {
    fn from(status: ExitStatus) -> Self {
        match status.code() {
            Some(status) => Self::Exited { status },
            None => Self::Terminated {
                signal: signal_of(&status),
            },
        }
    }
}

#[cfg(unix)]
fn signal_of(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn signal_of(_status: &ExitStatus) -> Option<i32> {
    None
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exited { status } => write!(f, "exit status {}", status),
            Self::Terminated { signal: Some(signal) } => write!(f, "signal {}", signal),
            Self::Terminated { signal: None } => f.write_str("abnormal termination"),
            Self::WatchdogExpired { after_ms } => write!(f, "watchdog expired after {}ms", after_ms),
        }
    }
}

/// The judged result of one scenario run.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioOutcome {
    /// Scenario name.
    pub name: String,
    /// Argument vector the tester ran with.
    pub args: Vec<String>,
    pub expected: Expectation,
    pub observed: Observation,
    /// Wall-clock time from spawn to exit.
    pub elapsed_ms: u64,
    /// Whether the observation met the expectation.
    pub passed: bool,
}

impl ScenarioOutcome {
    /// Converts a failed outcome into `ScenarioFailed`.
    pub fn into_result(self) -> Result<Self> {
        if self.passed {
            Ok(self)
        } else {
            Err(HarnessError::ScenarioFailed {
                name: self.name,
                expected: self.expected.to_string(),
                observed: self.observed.to_string(),
            })
        }
    }
}
