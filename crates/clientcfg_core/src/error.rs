//! Error types for harness operations.

use crate::version::Version;
use std::path::PathBuf;
use thiserror::Error;

/// Core error type for the client-configuration harness.
///
/// A tester process exiting with an unexpected status is *not* an error of
/// this type: it is reported as a failed [`crate::ScenarioOutcome`]. These
/// variants describe a broken environment or a misconfigured scenario.
#[derive(Error, Debug)]
pub enum HarnessError {
    /// A versioned artifact is absent from the artifact cache.
    #[error("artifact for version {version} not found at {}", path.display())]
    MissingArtifact {
        /// Version whose artifacts were requested
        version: Version,
        /// The first path that does not exist
        path: PathBuf,
    },

    /// The same version was requested twice for a multi-library layout.
    #[error("version {0} requested more than once for the external client directory")]
    DuplicateVersion(Version),

    /// A version string is not of the form `major.minor.patch`.
    #[error("invalid version string: {0:?}")]
    InvalidVersion(String),

    /// A connection string could not be parsed.
    #[error("invalid connection string: {0:?}")]
    InvalidConnectionString(String),

    /// Single-library and library-directory layouts were both requested.
    #[error("scenario {0} configures both an external client library and an external client directory")]
    ConflictingLibraryLayout(String),

    /// The expected code cannot be told apart from success by exit status alone.
    #[error("expected error {0} is indistinguishable from success as a process exit status")]
    AmbiguousExpectedError(i32),

    /// Configuration error (loading, parsing, invalid values).
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// The cluster did not accept a database-creation call in time.
    #[error("cluster {version} did not become ready within {timeout_secs}s")]
    ClusterNotReady {
        /// Version of the cluster being started
        version: Version,
        /// Readiness timeout that elapsed
        timeout_secs: u64,
    },

    /// An operation needed a running cluster.
    #[error("cluster is not running")]
    ClusterNotRunning,

    /// A specific port could not be (re)acquired.
    #[error("port {0} is unavailable")]
    PortUnavailable(u16),

    /// No free port could be leased.
    #[error("no free port could be leased after {0} attempts")]
    PortPoolExhausted(u32),

    /// A child process failed to start.
    #[error("failed to start {}: {source}", program.display())]
    Spawn {
        /// Program that was being started
        program: PathBuf,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// The cluster process supervisor reported a failure.
    #[error("supervisor error: {0}")]
    Supervisor(String),

    /// A task of a task group panicked.
    #[error("task {0} panicked")]
    TaskPanicked(&'static str),

    /// A scenario's tester process did not exit as expected.
    #[error("scenario {name} failed: expected {expected}, observed {observed}")]
    ScenarioFailed {
        /// Scenario name
        name: String,
        /// Rendered expectation
        expected: String,
        /// Rendered observation
        observed: String,
    },

    /// I/O error during file or process operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarnessError {
    /// Whether the error signals a broken test environment.
    ///
    /// Setup errors abort the whole run instead of failing one scenario.
    pub fn is_setup_error(&self) -> bool {
        !matches!(self, Self::ScenarioFailed { .. })
    }

    /// Returns a user-friendly recovery suggestion for the error, if available.
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            Self::MissingArtifact { .. } => Some(
                "Download the release binaries for this version into the artifact cache, or point [artifacts].root at an existing cache.",
            ),
            Self::ClusterNotReady { .. } => Some(
                "Check the cluster logs under the cluster root, or raise [cluster].ready_timeout_secs.",
            ),
            Self::PortUnavailable(_) | Self::PortPoolExhausted(_) => Some(
                "Another process may hold the port. Remove stale files from the port lease directory if no harness is running.",
            ),
            Self::Spawn { .. } => Some("Verify the binary exists and is executable."),
            Self::AmbiguousExpectedError(_) => {
                Some("Use the `delegate` expectation mode so the tester judges the error code itself.")
            }
            _ => None,
        }
    }
}

/// Convenience Result type for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;
