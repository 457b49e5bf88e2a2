//! The seam between the cluster controller and the processes it runs.

use super::descriptor::ClusterDescriptor;
use crate::error::{HarnessError, Result};
use std::fs;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Starts and stops the processes of one cluster.
///
/// Implementations must be able to `launch` again after `shutdown`, with a
/// descriptor whose binaries have changed.
pub trait Supervisor: Send {
    /// Starts the cluster processes described by `cluster`.
    fn launch(&mut self, cluster: &ClusterDescriptor) -> Result<()>;

    /// Blocks until the cluster accepts a database-creation call.
    ///
    /// # Errors
    ///
    /// Returns `ClusterNotReady` once `timeout` elapses.
    fn create_database(&mut self, cluster: &ClusterDescriptor, timeout: Duration) -> Result<()>;

    /// Stops every process started by `launch`. Idempotent.
    fn shutdown(&mut self) -> Result<()>;
}

/// Supervisor that runs the cluster under its own process monitor.
///
/// The monitor reads a generated configuration and keeps one server process
/// alive per port; the CLI binary is used to create the database.
pub struct MonitorSupervisor {
    monitor: Option<Child>,
    stop_timeout: Duration,
}

impl MonitorSupervisor {
    /// Creates a supervisor that waits `stop_timeout` for a graceful stop.
    pub fn new(stop_timeout: Duration) -> Self {
        Self {
            monitor: None,
            stop_timeout,
        }
    }

    /// Renders the monitor configuration for `cluster`.
    pub fn monitor_config(cluster: &ClusterDescriptor) -> String {
        let mut conf = format!(
            "[fdbmonitor]\n\
             \n\
             [general]\n\
             restart-delay = 10\n\
             cluster-file = {cluster_file}\n\
             \n\
             [fdbserver]\n\
             command = {server}\n\
             public-address = 127.0.0.1:$ID\n\
             listen-address = public\n\
             datadir = {data}/$ID\n\
             logdir = {log}\n",
            cluster_file = cluster.cluster_file.display(),
            server = cluster.server_bin.display(),
            data = cluster.data_dir().display(),
            log = cluster.log_dir().display(),
        );
        for port in &cluster.ports {
            conf.push_str(&format!("\n[fdbserver.{}]\n", port));
        }
        conf
    }

    fn write_config(cluster: &ClusterDescriptor) -> Result<std::path::PathBuf> {
        for dir in [cluster.etc_dir(), cluster.data_dir(), cluster.log_dir()] {
            fs::create_dir_all(dir)?;
        }
        let path = cluster.etc_dir().join("foundationdb.conf");
        fs::write(&path, Self::monitor_config(cluster))?;
        Ok(path)
    }

    fn run_cli(cluster: &ClusterDescriptor, command: &str) -> Result<bool> {
        let status = Command::new(&cluster.cli_bin)
            .arg("-C")
            .arg(&cluster.cluster_file)
            .args(["--timeout", "5", "--exec", command])
            .envs(&cluster.env)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|source| HarnessError::Spawn {
                program: cluster.cli_bin.clone(),
                source,
            })?;
        Ok(status.success())
    }
}

impl Supervisor for MonitorSupervisor {
    fn launch(&mut self, cluster: &ClusterDescriptor) -> Result<()> {
        if self.monitor.is_some() {
            return Err(HarnessError::Supervisor(
                "cluster processes are already running".into(),
            ));
        }

        let conf = Self::write_config(cluster)?;
        let child = Command::new(&cluster.monitor_bin)
            .arg("--conffile")
            .arg(&conf)
            .arg("--lockfile")
            .arg(cluster.root.join("fdbmonitor.pid"))
            .envs(&cluster.env)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| HarnessError::Spawn {
                program: cluster.monitor_bin.clone(),
                source,
            })?;

        info!(pid = child.id(), version = %cluster.version, "Started process monitor");
        self.monitor = Some(child);
        Ok(())
    }

    fn create_database(&mut self, cluster: &ClusterDescriptor, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if Self::run_cli(cluster, "configure new single memory")? {
                info!(version = %cluster.version, "Database created");
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(HarnessError::ClusterNotReady {
                    version: cluster.version,
                    timeout_secs: timeout.as_secs(),
                });
            }
            debug!("Cluster not ready yet, retrying database creation");
            thread::sleep(POLL_INTERVAL);
        }
    }

    fn shutdown(&mut self) -> Result<()> {
        let Some(mut child) = self.monitor.take() else {
            return Ok(());
        };

        // The monitor stops its servers on SIGTERM; SIGKILL would orphan them.
        terminate(child.id());
        let deadline = Instant::now() + self.stop_timeout;
        loop {
            if child.try_wait()?.is_some() {
                break;
            }
            if Instant::now() >= deadline {
                warn!(pid = child.id(), "Process monitor ignored SIGTERM, killing");
                let _ = child.kill();
                child.wait()?;
                break;
            }
            thread::sleep(POLL_INTERVAL);
        }
        info!("Stopped process monitor");
        Ok(())
    }
}

impl Drop for MonitorSupervisor {
    fn drop(&mut self) {
        if let Some(mut child) = self.monitor.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

#[cfg(unix)]
fn terminate(pid: u32) {
    let _ = Command::new("kill")
        .args(["-TERM", &pid.to_string()])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
}

#[cfg(not(unix))]
fn terminate(_pid: u32) {}
