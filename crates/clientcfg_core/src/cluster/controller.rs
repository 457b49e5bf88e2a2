//! Lifecycle of one cluster instance: start, upgrade, stop, teardown.

use super::connection::ConnectionString;
use super::descriptor::ClusterDescriptor;
use super::supervisor::Supervisor;
use crate::artifacts::{ArtifactSource, VersionArtifacts};
use crate::error::{HarnessError, Result};
use crate::ports::{PortLease, PortPool};
use crate::version::Version;
use std::fs;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Collaborators and limits a controller is built from.
pub struct ClusterDeps {
    /// Where versioned binaries come from.
    pub artifacts: Arc<dyn ArtifactSource>,
    /// Port leasing.
    pub ports: PortPool,
    /// Process supervision.
    pub supervisor: Box<dyn Supervisor>,
    /// Parent of the cluster's working directory.
    pub work_root: PathBuf,
    /// How long a new cluster may take to accept database creation.
    pub ready_timeout: Duration,
    /// How long to wait for released ports to become bindable again.
    pub port_timeout: Duration,
    /// Number of server processes.
    pub server_count: usize,
}

/// Owns one running cluster for the lifetime of a test group.
pub struct ClusterController {
    descriptor: ClusterDescriptor,
    artifacts: Arc<dyn ArtifactSource>,
    ports: PortPool,
    leases: Vec<PortLease>,
    supervisor: Box<dyn Supervisor>,
    port_timeout: Duration,
    running: bool,
}

impl ClusterController {
    /// Starts a cluster of `version` and blocks until it accepts a database.
    ///
    /// # Errors
    ///
    /// Returns `MissingArtifact` if the release is not cached and
    /// `ClusterNotReady` if the database could not be created in time. On any
    /// error nothing is left running and the working directory is removed.
    pub fn start(version: &Version, deps: ClusterDeps) -> Result<Self> {
        let artifacts = deps.artifacts.ensure(version)?;

        let name = uuid::Uuid::new_v4().simple().to_string();
        let root = deps.work_root.join(&name[..16]);
        fs::create_dir_all(&root)?;
        info!(version = %version, root = %root.display(), "Starting cluster");

        let (descriptor, leases) =
            match prepare(root.clone(), &artifacts, &deps.ports, deps.server_count) {
                Ok(prepared) => prepared,
                Err(e) => {
                    if let Err(cleanup) = fs::remove_dir_all(&root) {
                        warn!(error = %cleanup, root = %root.display(), "Failed to remove cluster directory");
                    }
                    return Err(e);
                }
            };

        let mut controller = Self {
            descriptor,
            artifacts: deps.artifacts,
            ports: deps.ports,
            leases,
            supervisor: deps.supervisor,
            port_timeout: deps.port_timeout,
            running: false,
        };

        if let Err(e) = controller.launch_and_create_database(deps.ready_timeout) {
            if let Err(cleanup) = controller.teardown() {
                warn!(error = %cleanup, "Failed to clean up cluster after failed start");
            }
            return Err(e);
        }

        info!(version = %version, "Cluster ready");
        Ok(controller)
    }

    fn launch_and_create_database(&mut self, ready_timeout: Duration) -> Result<()> {
        self.supervisor.launch(&self.descriptor)?;
        self.running = true;
        self.supervisor
            .create_database(&self.descriptor, ready_timeout)
    }

    /// Current view of the cluster.
    pub fn descriptor(&self) -> &ClusterDescriptor {
        &self.descriptor
    }

    /// Path of the connection descriptor file.
    pub fn cluster_file(&self) -> &Path {
        &self.descriptor.cluster_file
    }

    /// Working directory of the cluster.
    pub fn root(&self) -> &Path {
        &self.descriptor.root
    }

    /// Release the cluster currently runs.
    pub fn version(&self) -> Version {
        self.descriptor.version
    }

    /// Whether the cluster processes are running.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Port pool the cluster leases from.
    pub fn ports(&self) -> &PortPool {
        &self.ports
    }

    /// Reads the connection descriptor back from disk.
    pub fn connection_string(&self) -> Result<ConnectionString> {
        fs::read_to_string(&self.descriptor.cluster_file)?.parse()
    }

    /// Restarts the cluster on the binaries of `version`.
    ///
    /// The working directory and the cluster file survive; ports are released
    /// and leased again under the same numbers, so a client holding the old
    /// cluster file reconnects once the restart completes.
    pub fn upgrade(&mut self, version: &Version) -> Result<()> {
        if !self.running {
            return Err(HarnessError::ClusterNotRunning);
        }
        let artifacts = self.artifacts.ensure(version)?;
        info!(from = %self.descriptor.version, to = %version, "Upgrading cluster");

        self.supervisor.shutdown()?;
        self.running = false;
        self.descriptor.rebind(&artifacts);

        self.leases.clear();
        for port in self.descriptor.ports.clone() {
            self.leases
                .push(self.ports.reacquire(port, self.port_timeout)?);
        }

        self.supervisor.launch(&self.descriptor)?;
        self.running = true;
        info!(version = %version, "Cluster upgraded");
        Ok(())
    }

    /// Stops the processes and releases the ports. The directory stays.
    pub fn stop(&mut self) -> Result<()> {
        if self.running {
            self.supervisor.shutdown()?;
            self.running = false;
            info!(root = %self.descriptor.root.display(), "Cluster stopped");
        }
        self.leases.clear();
        Ok(())
    }

    /// Stops the cluster and removes its working directory.
    pub fn teardown(&mut self) -> Result<()> {
        self.stop()?;
        if self.descriptor.root.exists() {
            fs::remove_dir_all(&self.descriptor.root)?;
        }
        info!(root = %self.descriptor.root.display(), "Cluster torn down");
        Ok(())
    }
}

/// Leases ports and writes the cluster file under `root`.
fn prepare(
    root: PathBuf,
    artifacts: &VersionArtifacts,
    pool: &PortPool,
    server_count: usize,
) -> Result<(ClusterDescriptor, Vec<PortLease>)> {
    let leases = (0..server_count.max(1))
        .map(|_| pool.lease())
        .collect::<Result<Vec<_>>>()?;
    let ports = leases.iter().map(PortLease::port).collect::<Vec<_>>();

    let descriptor = ClusterDescriptor::new(root, artifacts, ports);
    let coordinators = descriptor
        .ports
        .iter()
        .map(|p| SocketAddr::from((Ipv4Addr::LOCALHOST, *p)))
        .collect();
    fs::write(
        &descriptor.cluster_file,
        ConnectionString::generate(coordinators).to_string(),
    )?;
    Ok((descriptor, leases))
}

impl Drop for ClusterController {
    fn drop(&mut self) {
        if self.running {
            if let Err(e) = self.stop() {
                warn!(error = %e, "Failed to stop cluster on drop");
            }
        }
    }
}
