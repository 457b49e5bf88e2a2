//! Client configuration test harness
//!
//! Drives an external tester executable through a matrix of client
//! configurations against locally spawned clusters, and judges each run by
//! the tester's exit status:
//! - Cluster lifecycle (start, in-place upgrade, stop, teardown)
//! - Per-scenario sandboxes with staged client libraries
//! - Deterministic tester command lines
//! - A fixed scenario catalog, including a live upgrade race
//!
//! # Quick Start
//!
//! ```
//! use clientcfg_core::{find, VersionSet};
//!
//! let versions = VersionSet::default();
//! let scenario = find("multiple_external_clients").unwrap();
//! let args = scenario.preview_args(&versions).to_strings();
//!
//! assert!(args.contains(&"--external-client-dir".to_string()));
//! assert!(args.contains(&versions.prev2.api_version().to_string()));
//! ```
//!
//! # Running a group
//!
//! Groups start their own clusters. The current and previous groups share
//! one cluster each; every upgrade-race scenario gets a dedicated one:
//!
//! ```no_run
//! use clientcfg_core::{run_group, HarnessConfig, HarnessEnv, ScenarioGroup};
//! use std::path::Path;
//!
//! let config = HarnessConfig::load(Path::new("clientcfg.toml"))?;
//! let env = HarnessEnv::from_config(config)?;
//! let report = run_group(&env, ScenarioGroup::Current, None, |outcome| {
//!     println!("{}: {}", outcome.name, outcome.passed);
//! })?;
//! assert!(report.passed());
//! # Ok::<(), clientcfg_core::HarnessError>(())
//! ```

mod artifacts;
mod cluster;
mod config;
mod error;
mod ports;
mod sandbox;
mod scenario;
mod stager;
mod suite;
mod task_group;
mod version;

pub use artifacts::{
    staged_library_name, ArtifactSource, LocalArtifactCache, VersionArtifacts, CLIENT_LIBRARY,
    CLI_BINARY, MONITOR_BINARY, SERVER_BINARY,
};
pub use cluster::{
    ClusterController, ClusterDeps, ClusterDescriptor, ConnectionString, MonitorSupervisor,
    Supervisor, LIBRARY_PATH_VAR,
};
pub use config::{
    ArtifactsConfig, ClusterConfig, ExpectationMode, HarnessConfig, RaceConfig, RunnerConfig,
};
pub use error::{HarnessError, Result};
pub use ports::{PortLease, PortPool};
pub use sandbox::Sandbox;
pub use scenario::{
    catalog, exit_status_of, find, scenarios_in, ClusterFileKind, ErrorCode, Execution,
    Expectation, LibraryLayout, Observation, ScenarioConfig, ScenarioDef, ScenarioGroup,
    ScenarioOutcome, ScenarioRunner, TesterArgs, UpgradeRace,
};
pub use stager::ArtifactStager;
pub use suite::{run_group, run_scenario, ClusterFixture, GroupReport, HarnessEnv, SupervisorFactory};
pub use task_group::{join2, Joined};
pub use version::{Version, VersionRole, VersionSet};
