//! Cross-process leasing of local network ports.
//!
//! Several harness processes may start clusters on the same machine. A port
//! is only handed out while this process holds an exclusive lock on
//! `<lease_dir>/<port>.lock`, so two harnesses never pick the same port.

use crate::error::{HarnessError, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::net::{Ipv4Addr, TcpListener};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

const LEASE_ATTEMPTS: u32 = 64;
const REACQUIRE_POLL: Duration = Duration::from_millis(50);

/// Hands out leased ports on the loopback interface.
#[derive(Debug, Clone)]
pub struct PortPool {
    lease_dir: PathBuf,
}

impl PortPool {
    /// Creates a pool whose lease files live in `lease_dir`.
    pub fn new(lease_dir: impl AsRef<Path>) -> Result<Self> {
        fs::create_dir_all(lease_dir.as_ref())?;
        Ok(Self {
            lease_dir: lease_dir.as_ref().to_path_buf(),
        })
    }

    /// Leases a port that is currently free.
    pub fn lease(&self) -> Result<PortLease> {
        for _ in 0..LEASE_ATTEMPTS {
            let port = {
                let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))?;
                listener.local_addr()?.port()
            };
            if let Some(lease) = self.try_lock(port)? {
                debug!(port, "Leased port");
                return Ok(lease);
            }
        }
        Err(HarnessError::PortPoolExhausted(LEASE_ATTEMPTS))
    }

    /// Leases `port` again once nothing is bound to it any more.
    ///
    /// Used when restarting processes that must keep their address.
    pub fn reacquire(&self, port: u16, timeout: Duration) -> Result<PortLease> {
        let deadline = Instant::now() + timeout;
        loop {
            if is_bindable(port) {
                if let Some(lease) = self.try_lock(port)? {
                    debug!(port, "Reacquired port");
                    return Ok(lease);
                }
            }
            if Instant::now() >= deadline {
                return Err(HarnessError::PortUnavailable(port));
            }
            thread::sleep(REACQUIRE_POLL);
        }
    }

    fn try_lock(&self, port: u16) -> Result<Option<PortLease>> {
        let path = self.lease_dir.join(format!("{}.lock", port));
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(PortLease {
                port,
                file: Some(file),
            })),
            Err(_) => Ok(None),
        }
    }
}

fn is_bindable(port: u16) -> bool {
    TcpListener::bind((Ipv4Addr::LOCALHOST, port)).is_ok()
}

/// RAII guard for a leased port.
///
/// Dropping the lease unlocks the lease file but never removes it, so every
/// contender for a port locks the same inode.
#[derive(Debug)]
pub struct PortLease {
    port: u16,
    file: Option<File>,
}

impl PortLease {
    /// The leased port number.
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Drop for PortLease {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = file.unlock();
        }
    }
}
