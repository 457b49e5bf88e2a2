//! Versioned binary artifacts and the cache that holds them.
//!
//! The harness never downloads anything itself. It talks to an
//! [`ArtifactSource`], whose only contract is "make sure the artifacts for
//! version V are present locally and tell me where they are". Tests back it
//! with a pre-populated directory.

use crate::error::{HarnessError, Result};
use crate::version::Version;
use std::path::{Path, PathBuf};

/// File name of the cluster server binary.
pub const SERVER_BINARY: &str = "fdbserver";
/// File name of the process monitor binary.
pub const MONITOR_BINARY: &str = "fdbmonitor";
/// File name of the command-line client binary.
pub const CLI_BINARY: &str = "fdbcli";
/// File name of the client library inside a library directory.
pub const CLIENT_LIBRARY: &str = "libfdb_c.so";

/// File name a staged client library gets for `version`.
///
/// The tester derives the library's release from this name, so it is part of
/// the external contract.
pub fn staged_library_name(version: &Version) -> String {
    format!("libfdb_c.{}.so", version)
}

/// Paths of every artifact belonging to one release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionArtifacts {
    /// Release these artifacts belong to.
    pub version: Version,
    /// Cluster server binary.
    pub server: PathBuf,
    /// Process monitor binary.
    pub monitor: PathBuf,
    /// Command-line client binary.
    pub cli: PathBuf,
    /// Directory to put on the library search path.
    pub lib_dir: PathBuf,
    /// The client library itself.
    pub client_library: PathBuf,
}

impl VersionArtifacts {
    /// Lays out artifact paths for a release rooted at `bin_dir` / `lib_dir`.
    pub fn in_dirs(version: Version, bin_dir: &Path, lib_dir: &Path) -> Self {
        Self {
            version,
            server: bin_dir.join(SERVER_BINARY),
            monitor: bin_dir.join(MONITOR_BINARY),
            cli: bin_dir.join(CLI_BINARY),
            lib_dir: lib_dir.to_path_buf(),
            client_library: lib_dir.join(CLIENT_LIBRARY),
        }
    }

    /// Every file that must exist for the release to be usable.
    fn required_files(&self) -> [&Path; 4] {
        [&self.server, &self.monitor, &self.cli, &self.client_library]
    }

    /// Fails with [`HarnessError::MissingArtifact`] naming the first absent file.
    pub fn verify(&self) -> Result<()> {
        for path in self.required_files() {
            if !path.is_file() {
                return Err(HarnessError::MissingArtifact {
                    version: self.version,
                    path: path.to_path_buf(),
                });
            }
        }
        Ok(())
    }
}

/// Source of versioned artifacts.
pub trait ArtifactSource: Send + Sync {
    /// Ensures the artifacts for `version` are present locally and returns their paths.
    fn ensure(&self, version: &Version) -> Result<VersionArtifacts>;
}

/// Artifact cache laid out on the local filesystem.
///
/// Release `V` lives at `<root>/V/bin/{fdbserver,fdbmonitor,fdbcli}` and
/// `<root>/V/lib/libfdb_c.so`. The release under development can instead be
/// mapped onto a build directory's `bin/` and `lib/`.
#[derive(Debug, Clone)]
pub struct LocalArtifactCache {
    root: PathBuf,
    build: Option<(Version, PathBuf)>,
}

impl LocalArtifactCache {
    /// Creates a cache rooted at `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            build: None,
        }
    }

    /// Resolves `version` from a build directory instead of the cache.
    pub fn with_build_dir(mut self, version: Version, build_dir: impl AsRef<Path>) -> Self {
        self.build = Some((version, build_dir.as_ref().to_path_buf()));
        self
    }

    /// Cache root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn layout(&self, version: &Version) -> VersionArtifacts {
        match &self.build {
            Some((built, dir)) if built == version => {
                VersionArtifacts::in_dirs(*version, &dir.join("bin"), &dir.join("lib"))
            }
            _ => {
                let dir = self.root.join(version.to_string());
                VersionArtifacts::in_dirs(*version, &dir.join("bin"), &dir.join("lib"))
            }
        }
    }
}

impl ArtifactSource for LocalArtifactCache {
    fn ensure(&self, version: &Version) -> Result<VersionArtifacts> {
        let artifacts = self.layout(version);
        artifacts.verify()?;
        Ok(artifacts)
    }
}
