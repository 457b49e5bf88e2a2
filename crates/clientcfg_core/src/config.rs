//! Configuration types for a harness run.

use crate::error::{HarnessError, Result};
use crate::version::VersionSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Comprehensive configuration for a harness run.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HarnessConfig {
    /// Build directory holding the current release's binaries.
    #[serde(default)]
    pub build_dir: PathBuf,

    /// Path to the tester executable.
    #[serde(default)]
    pub tester_bin: PathBuf,

    /// Releases exercised by the catalog.
    #[serde(default)]
    pub versions: VersionSet,

    /// Artifact cache configuration.
    #[serde(default)]
    pub artifacts: ArtifactsConfig,

    /// Cluster lifecycle configuration.
    #[serde(default)]
    pub cluster: ClusterConfig,

    /// Tester process configuration.
    #[serde(default)]
    pub runner: RunnerConfig,

    /// Upgrade-race configuration.
    #[serde(default)]
    pub race: RaceConfig,
}

impl HarnessConfig {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .map_err(|e| HarnessError::ConfigError(format!("failed to read config: {}", e)))?;
            toml::from_str(&content)
                .map_err(|e| HarnessError::ConfigError(format!("failed to parse config: {}", e)))
        } else {
            Ok(HarnessConfig::default())
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            HarnessError::ConfigError(format!("failed to serialize config: {}", e))
        })?;
        fs::write(path, content)
            .map_err(|e| HarnessError::ConfigError(format!("failed to write config: {}", e)))?;
        Ok(())
    }

    /// Checks the paths a run cannot do without.
    pub fn validate(&self) -> Result<()> {
        if !self.build_dir.is_dir() {
            return Err(HarnessError::ConfigError(format!(
                "build directory {} does not exist",
                self.build_dir.display()
            )));
        }
        if !self.tester_bin.is_file() {
            return Err(HarnessError::ConfigError(format!(
                "tester executable {} does not exist",
                self.tester_bin.display()
            )));
        }
        Ok(())
    }

    /// Directory under which cluster roots (and their sandboxes) are created.
    pub fn work_root(&self) -> PathBuf {
        self.build_dir.join("tmp")
    }

    /// Root of the versioned artifact cache.
    pub fn artifact_root(&self) -> PathBuf {
        self.artifacts
            .root
            .clone()
            .unwrap_or_else(|| self.build_dir.join("tmp").join("old_binaries"))
    }
}

/// Artifact cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ArtifactsConfig {
    /// Cache root; defaults to `<build_dir>/tmp/old_binaries`.
    pub root: Option<PathBuf>,
}

/// Cluster lifecycle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Seconds to wait for a started cluster to accept database creation (default: 60).
    pub ready_timeout_secs: u64,

    /// Seconds to wait for cluster processes to exit after SIGTERM (default: 10).
    pub stop_timeout_secs: u64,

    /// Directory holding cross-process port lease files.
    pub port_lease_dir: PathBuf,

    /// Number of server processes per cluster (default: 1).
    pub server_count: usize,
}

impl ClusterConfig {
    /// Returns the readiness timeout as a Duration.
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.ready_timeout_secs)
    }

    /// Returns the stop timeout as a Duration.
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            ready_timeout_secs: 60,
            stop_timeout_secs: 10,
            port_lease_dir: std::env::temp_dir().join("clientcfg-port-locks"),
            server_count: 1,
        }
    }
}

/// How the runner decides whether an expected error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExpectationMode {
    /// Compare the tester's exit status with the expected code.
    #[default]
    ExitStatus,
    /// Pass `--expected-error` to the tester and require exit status 0.
    Delegate,
}

/// Tester process configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RunnerConfig {
    /// Kill the tester after this many seconds. Unset means wait forever.
    pub watchdog_secs: Option<u64>,

    /// How expected errors are judged.
    #[serde(default)]
    pub expectation: ExpectationMode,

    /// Extra environment variables for the tester process.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl RunnerConfig {
    /// Returns the watchdog as a Duration, if configured.
    pub fn watchdog(&self) -> Option<Duration> {
        self.watchdog_secs.map(Duration::from_secs)
    }
}

/// Upgrade-race configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceConfig {
    /// Delay between the tester launching and the upgrade starting (default: 100ms).
    pub upgrade_delay_ms: u64,
}

impl RaceConfig {
    /// Returns the upgrade delay as a Duration.
    pub fn upgrade_delay(&self) -> Duration {
        Duration::from_millis(self.upgrade_delay_ms)
    }
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            upgrade_delay_ms: 100,
        }
    }
}
