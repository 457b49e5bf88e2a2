//! The full parameter set of one scenario.

use super::command::TesterArgs;
use super::outcome::Expectation;
use crate::cluster::ClusterController;
use crate::config::ExpectationMode;
use crate::error::{HarnessError, Result};
use crate::ports::{PortLease, PortPool};
use crate::sandbox::Sandbox;
use crate::stager::ArtifactStager;
use crate::version::Version;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// One scenario's configuration, bound to the sandbox it owns.
///
/// Built fresh per scenario and consumed by the runner, which closes the
/// sandbox after judging.
#[derive(Debug)]
pub struct ScenarioConfig {
    name: String,
    sandbox: Sandbox,
    cluster_file: PathBuf,
    external_library: Option<PathBuf>,
    external_library_dir: Option<PathBuf>,
    // Keeps an unreachable port from being handed out while the tester runs.
    unreachable_port: Option<PortLease>,

    /// Disable the locally linked client.
    pub disable_local_client: bool,
    /// Tolerate external clients that fail to initialize.
    pub ignore_external_client_failures: bool,
    /// Fail when no client matches the cluster's protocol.
    pub fail_incompatible_client: bool,
    /// Requested client API version.
    pub api_version: Option<u32>,
    /// Error code the tester must report; `None` expects success.
    pub expected_error: Option<i32>,
    /// Transaction timeout passed to the tester.
    pub transaction_timeout: Option<Duration>,
}

impl ScenarioConfig {
    /// Creates a configuration against `cluster`, with a sandbox inside the
    /// cluster's working directory.
    pub fn new(name: impl Into<String>, cluster: &ClusterController) -> Result<Self> {
        let sandbox = Sandbox::create_in(cluster.root())?;
        Ok(Self::with_sandbox(name, sandbox, cluster.cluster_file()))
    }

    /// Creates a configuration over an existing sandbox.
    pub fn with_sandbox(name: impl Into<String>, sandbox: Sandbox, cluster_file: &Path) -> Self {
        Self {
            name: name.into(),
            sandbox,
            cluster_file: cluster_file.to_path_buf(),
            external_library: None,
            external_library_dir: None,
            unreachable_port: None,
            disable_local_client: false,
            ignore_external_client_failures: false,
            fail_incompatible_client: true,
            api_version: None,
            expected_error: None,
            transaction_timeout: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sandbox(&self) -> &Sandbox {
        &self.sandbox
    }

    /// Cluster file the tester connects with.
    pub fn cluster_file(&self) -> &Path {
        &self.cluster_file
    }

    pub fn external_library(&self) -> Option<&Path> {
        self.external_library.as_deref()
    }

    pub fn external_library_dir(&self) -> Option<&Path> {
        self.external_library_dir.as_deref()
    }

    /// Stages the library of `version` as the single external client.
    ///
    /// # Errors
    ///
    /// Returns `ConflictingLibraryLayout` if a library directory is already set.
    pub fn stage_external_library(&mut self, stager: &ArtifactStager, version: &Version) -> Result<()> {
        if self.external_library_dir.is_some() {
            return Err(HarnessError::ConflictingLibraryLayout(self.name.clone()));
        }
        self.external_library = Some(stager.stage_single(&self.sandbox, version)?);
        Ok(())
    }

    /// Stages one library per version into the external client directory.
    ///
    /// # Errors
    ///
    /// Returns `ConflictingLibraryLayout` if a single library is already set.
    pub fn stage_external_library_dir(
        &mut self,
        stager: &ArtifactStager,
        versions: &[Version],
    ) -> Result<()> {
        if self.external_library.is_some() {
            return Err(HarnessError::ConflictingLibraryLayout(self.name.clone()));
        }
        self.external_library_dir = Some(stager.stage_multiple(&self.sandbox, versions)?);
        Ok(())
    }

    /// Points the tester at a well-formed cluster file whose only
    /// coordinator port has nothing listening on it.
    pub fn use_unreachable_cluster_file(&mut self, ports: &PortPool) -> Result<()> {
        let lease = ports.lease()?;
        let path = self
            .sandbox
            .write_cluster_file(&format!("abcde:fghijk@127.0.0.1:{}", lease.port()))?;
        debug!(scenario = %self.name, port = lease.port(), "Using unreachable cluster file");
        self.cluster_file = path;
        self.unreachable_port = Some(lease);
        Ok(())
    }

    /// Points the tester at a cluster file with no coordinator address.
    pub fn use_invalid_cluster_file(&mut self) -> Result<()> {
        self.cluster_file = self.sandbox.write_cluster_file("abcde:fghijk@")?;
        Ok(())
    }

    /// What the runner will judge the tester against.
    pub fn expectation(&self) -> Expectation {
        Expectation::from_code(self.expected_error)
    }

    /// Materializes the tester arguments.
    ///
    /// The expected error is only forwarded when the tester judges it
    /// itself.
    pub fn tester_args(&self, mode: ExpectationMode) -> Result<TesterArgs> {
        self.expectation().validate(mode)?;
        Ok(TesterArgs {
            disable_local_client: self.disable_local_client,
            external_library: self.external_library.clone(),
            external_library_dir: self.external_library_dir.clone(),
            ignore_external_client_failures: self.ignore_external_client_failures,
            fail_incompatible_client: self.fail_incompatible_client,
            api_version: self.api_version,
            expected_error: match mode {
                ExpectationMode::Delegate => self.expected_error,
                ExpectationMode::ExitStatus => None,
            },
            transaction_timeout: self.transaction_timeout,
            ..TesterArgs::new(
                self.cluster_file.clone(),
                self.sandbox.tmp_dir().to_path_buf(),
                self.sandbox.log_dir().to_path_buf(),
            )
        })
    }

    /// Releases everything but the sandbox.
    pub(crate) fn into_sandbox(self) -> Sandbox {
        self.sandbox
    }
}
