//! Description of one running cluster instance.

use crate::artifacts::VersionArtifacts;
use crate::version::Version;
use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;

/// Environment variable the cluster processes resolve client libraries from.
pub const LIBRARY_PATH_VAR: &str = "LD_LIBRARY_PATH";

/// Everything needed to reach and operate one cluster instance.
///
/// Binaries, version and library path change during an upgrade; the root
/// directory, cluster file and ports do not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterDescriptor {
    /// Release the cluster currently runs.
    pub version: Version,
    /// Working directory owned by the cluster.
    pub root: PathBuf,
    /// Server binary.
    pub server_bin: PathBuf,
    /// Process monitor binary.
    pub monitor_bin: PathBuf,
    /// Command-line client binary.
    pub cli_bin: PathBuf,
    /// Connection descriptor file.
    pub cluster_file: PathBuf,
    /// Ports allocated to server processes.
    pub ports: Vec<u16>,
    /// Environment overrides for the cluster's processes.
    pub env: BTreeMap<String, String>,
}

impl ClusterDescriptor {
    /// Builds a descriptor for a fresh cluster.
    pub fn new(root: PathBuf, artifacts: &VersionArtifacts, ports: Vec<u16>) -> Self {
        let mut env = BTreeMap::new();
        env.insert(
            LIBRARY_PATH_VAR.to_string(),
            artifacts.lib_dir.display().to_string(),
        );
        Self {
            version: artifacts.version,
            cluster_file: root.join("fdb.cluster"),
            root,
            server_bin: artifacts.server.clone(),
            monitor_bin: artifacts.monitor.clone(),
            cli_bin: artifacts.cli.clone(),
            ports,
            env,
        }
    }

    /// Rebinds to the binaries of another release.
    ///
    /// The library search path is extended, not replaced: the new release's
    /// library directory goes first and the previous value stays behind it.
    pub fn rebind(&mut self, artifacts: &VersionArtifacts) {
        self.version = artifacts.version;
        self.server_bin = artifacts.server.clone();
        self.monitor_bin = artifacts.monitor.clone();
        self.cli_bin = artifacts.cli.clone();

        let previous = self
            .env
            .get(LIBRARY_PATH_VAR)
            .cloned()
            .or_else(|| env::var(LIBRARY_PATH_VAR).ok())
            .filter(|p| !p.is_empty());
        let lib_dir = artifacts.lib_dir.display().to_string();
        let extended = match previous {
            Some(previous) => format!("{}:{}", lib_dir, previous),
            None => lib_dir,
        };
        self.env.insert(LIBRARY_PATH_VAR.to_string(), extended);
    }

    /// Directory for server data files.
    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }

    /// Directory for server log files.
    pub fn log_dir(&self) -> PathBuf {
        self.root.join("log")
    }

    /// Directory for generated configuration.
    pub fn etc_dir(&self) -> PathBuf {
        self.root.join("etc")
    }
}
