//! Copies client libraries from the artifact cache into sandboxes.

use crate::artifacts::{staged_library_name, ArtifactSource};
use crate::error::{HarnessError, Result};
use crate::sandbox::Sandbox;
use crate::version::Version;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Stages versioned client libraries under the names the tester expects.
#[derive(Clone)]
pub struct ArtifactStager {
    artifacts: Arc<dyn ArtifactSource>,
}

impl ArtifactStager {
    /// Creates a stager reading from `artifacts`.
    pub fn new(artifacts: Arc<dyn ArtifactSource>) -> Self {
        Self { artifacts }
    }

    /// Copies the library for `version` into the sandbox root.
    ///
    /// # Errors
    ///
    /// Returns `MissingArtifact` if the cache does not hold the release.
    pub fn stage_single(&self, sandbox: &Sandbox, version: &Version) -> Result<PathBuf> {
        let source = self.artifacts.ensure(version)?.client_library;
        copy_library(&source, sandbox.path(), version)
    }

    /// Copies one library per version into the sandbox's external client directory.
    ///
    /// Every version is resolved before anything is copied, so a missing
    /// release leaves no partially populated directory behind.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateVersion` if a version repeats, `MissingArtifact` if
    /// any release is absent from the cache.
    pub fn stage_multiple(&self, sandbox: &Sandbox, versions: &[Version]) -> Result<PathBuf> {
        let mut seen = HashSet::with_capacity(versions.len());
        for version in versions {
            if !seen.insert(*version) {
                return Err(HarnessError::DuplicateVersion(*version));
            }
        }

        let sources = versions
            .iter()
            .map(|v| Ok((*v, self.artifacts.ensure(v)?.client_library)))
            .collect::<Result<Vec<_>>>()?;

        let dir = sandbox.external_client_dir()?;
        for (version, source) in &sources {
            copy_library(source, &dir, version)?;
        }
        Ok(dir)
    }
}

fn copy_library(source: &Path, dest_dir: &Path, version: &Version) -> Result<PathBuf> {
    let target = dest_dir.join(staged_library_name(version));
    let copied = fs::copy(source, &target)?;
    let expected = fs::metadata(source)?.len();
    if copied != expected {
        return Err(HarnessError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!(
                "short copy of {}: {} of {} bytes",
                source.display(),
                copied,
                expected
            ),
        )));
    }

    debug!(version = %version, target = %target.display(), "Staged client library");
    Ok(target)
}
