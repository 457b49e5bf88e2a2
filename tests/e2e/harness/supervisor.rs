use clientcfg_core::{ClusterDescriptor, HarnessError, Result, Supervisor};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Ordered record of supervisor calls, shared across clusters
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn record(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.events().iter().filter(|e| e.starts_with(prefix)).count()
    }
}

/// Supervisor that "runs" a cluster by announcing it in a registry directory
///
/// The fake tester treats `<registry>/<port>` as a live coordinator running
/// the release written in the file.
pub struct FakeSupervisor {
    registry: PathBuf,
    events: EventLog,
    ready: bool,
    announced: Vec<PathBuf>,
}

impl FakeSupervisor {
    pub fn new(registry: &Path, events: EventLog, ready: bool) -> Self {
        Self {
            registry: registry.to_path_buf(),
            events,
            ready,
            announced: Vec::new(),
        }
    }
}

impl Supervisor for FakeSupervisor {
    fn launch(&mut self, cluster: &ClusterDescriptor) -> Result<()> {
        if !self.announced.is_empty() {
            return Err(HarnessError::Supervisor("already launched".into()));
        }
        if !cluster.server_bin.is_file() {
            return Err(HarnessError::Supervisor(format!(
                "server binary {} missing",
                cluster.server_bin.display()
            )));
        }

        for port in &cluster.ports {
            let entry = self.registry.join(port.to_string());
            // Readers must never observe a partial entry.
            let staging = self.registry.join(format!(".{}.tmp", port));
            fs::write(&staging, cluster.version.to_string())?;
            fs::rename(&staging, &entry)?;
            self.announced.push(entry);
        }
        self.events.record(format!("launch {}", cluster.version));
        Ok(())
    }

    fn create_database(&mut self, cluster: &ClusterDescriptor, timeout: Duration) -> Result<()> {
        if self.ready {
            self.events.record("create");
            Ok(())
        } else {
            Err(HarnessError::ClusterNotReady {
                version: cluster.version,
                timeout_secs: timeout.as_secs(),
            })
        }
    }

    fn shutdown(&mut self) -> Result<()> {
        if self.announced.is_empty() {
            return Ok(());
        }
        for entry in self.announced.drain(..) {
            if entry.exists() {
                fs::remove_file(&entry)?;
            }
        }
        self.events.record("shutdown");
        Ok(())
    }
}
