//! Cluster lifecycle management.
//!
//! A [`ClusterController`] owns one cluster instance: its working directory,
//! leased ports, connection descriptor and the [`Supervisor`] that runs its
//! processes.

mod connection;
mod controller;
mod descriptor;
mod supervisor;

pub use connection::ConnectionString;
pub use controller::{ClusterController, ClusterDeps};
pub use descriptor::{ClusterDescriptor, LIBRARY_PATH_VAR};
pub use supervisor::{MonitorSupervisor, Supervisor};
