//! Group-level orchestration: fixtures, scenario dispatch and reports.

use crate::artifacts::{ArtifactSource, LocalArtifactCache};
use crate::cluster::{ClusterController, ClusterDeps, MonitorSupervisor, Supervisor};
use crate::config::HarnessConfig;
use crate::error::Result;
use crate::ports::PortPool;
use crate::scenario::{
    scenarios_in, ScenarioDef, ScenarioGroup, ScenarioOutcome, ScenarioRunner, UpgradeRace,
};
use crate::stager::ArtifactStager;
use crate::version::{Version, VersionSet};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Builds a fresh supervisor for each cluster.
pub type SupervisorFactory = Arc<dyn Fn() -> Box<dyn Supervisor> + Send + Sync>;

// Upper bound for a restarted cluster to get its ports back.
const PORT_REACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything a harness run shares between groups.
pub struct HarnessEnv {
    config: HarnessConfig,
    artifacts: Arc<dyn ArtifactSource>,
    ports: PortPool,
    supervisors: SupervisorFactory,
    runner: ScenarioRunner,
}

impl HarnessEnv {
    /// Creates an environment backed by the on-disk artifact cache and the
    /// process monitor.
    pub fn from_config(config: HarnessConfig) -> Result<Self> {
        let artifacts = LocalArtifactCache::new(config.artifact_root())
            .with_build_dir(config.versions.current, &config.build_dir);
        let stop_timeout = config.cluster.stop_timeout();
        let supervisors: SupervisorFactory = Arc::new(move || -> Box<dyn Supervisor> {
            Box::new(MonitorSupervisor::new(stop_timeout))
        });
        Self::new(config, Arc::new(artifacts), supervisors)
    }

    /// Creates an environment with explicit collaborators.
    pub fn new(
        config: HarnessConfig,
        artifacts: Arc<dyn ArtifactSource>,
        supervisors: SupervisorFactory,
    ) -> Result<Self> {
        let ports = PortPool::new(&config.cluster.port_lease_dir)?;
        let runner = ScenarioRunner::from_config(&config);
        Ok(Self {
            config,
            artifacts,
            ports,
            supervisors,
            runner,
        })
    }

    /// Replaces the scenario runner.
    pub fn with_runner(mut self, runner: ScenarioRunner) -> Self {
        self.runner = runner;
        self
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn versions(&self) -> &VersionSet {
        &self.config.versions
    }

    pub fn runner(&self) -> &ScenarioRunner {
        &self.runner
    }

    pub fn stager(&self) -> ArtifactStager {
        ArtifactStager::new(Arc::clone(&self.artifacts))
    }

    /// Starts a cluster of `version` under the work root.
    pub fn start_cluster(&self, version: &Version) -> Result<ClusterController> {
        ClusterController::start(
            version,
            ClusterDeps {
                artifacts: Arc::clone(&self.artifacts),
                ports: self.ports.clone(),
                supervisor: (self.supervisors)(),
                work_root: self.config.work_root(),
                ready_timeout: self.config.cluster.ready_timeout(),
                port_timeout: PORT_REACQUIRE_TIMEOUT,
                server_count: self.config.cluster.server_count,
            },
        )
    }
}

/// A cluster owned by one test group.
///
/// Call [`ClusterFixture::teardown`] to observe cleanup errors; dropping the
/// fixture tears down best-effort.
pub struct ClusterFixture {
    cluster: ClusterController,
    torn_down: bool,
}

impl ClusterFixture {
    pub fn setup(env: &HarnessEnv, version: &Version) -> Result<Self> {
        Ok(Self {
            cluster: env.start_cluster(version)?,
            torn_down: false,
        })
    }

    pub fn cluster(&self) -> &ClusterController {
        &self.cluster
    }

    pub fn cluster_mut(&mut self) -> &mut ClusterController {
        &mut self.cluster
    }

    pub fn teardown(mut self) -> Result<()> {
        self.torn_down = true;
        self.cluster.teardown()
    }
}

impl Drop for ClusterFixture {
    fn drop(&mut self) {
        if !self.torn_down {
            if let Err(e) = self.cluster.teardown() {
                warn!(error = %e, "Failed to tear down cluster fixture");
            }
        }
    }
}

/// Results of one group run.
#[derive(Debug, Clone, Serialize)]
pub struct GroupReport {
    pub group: ScenarioGroup,
    /// Release the group's cluster started on.
    pub cluster_version: Version,
    pub outcomes: Vec<ScenarioOutcome>,
}

impl GroupReport {
    /// Whether every scenario passed.
    pub fn passed(&self) -> bool {
        self.outcomes.iter().all(|o| o.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ScenarioOutcome> {
        self.outcomes.iter().filter(|o| !o.passed)
    }
}

/// Configures and runs one scenario against `cluster`.
pub fn run_scenario(
    env: &HarnessEnv,
    cluster: &mut ClusterController,
    def: &ScenarioDef,
) -> Result<ScenarioOutcome> {
    let config = def.configure(cluster, &env.stager(), env.versions())?;
    match def.upgrade_to {
        None => env.runner.run(config),
        Some(role) => UpgradeRace::new(
            env.versions().resolve(role),
            env.config.race.upgrade_delay(),
        )
        .run(&env.runner, config, cluster),
    }
}

/// Runs the scenarios of `group` whose name contains `filter`.
///
/// Groups that share a cluster start it once; the others start one per
/// scenario. `on_outcome` sees each outcome as soon as it is judged.
///
/// # Errors
///
/// Any setup error aborts the group. Failed scenarios are not errors; they
/// are reported in the returned [`GroupReport`].
pub fn run_group(
    env: &HarnessEnv,
    group: ScenarioGroup,
    filter: Option<&str>,
    mut on_outcome: impl FnMut(&ScenarioOutcome),
) -> Result<GroupReport> {
    let defs: Vec<&ScenarioDef> = scenarios_in(group)
        .filter(|d| filter.map_or(true, |f| d.name.contains(f)))
        .collect();
    let cluster_version = env.versions().resolve(group.cluster_role());
    let mut report = GroupReport {
        group,
        cluster_version,
        outcomes: Vec::with_capacity(defs.len()),
    };
    if defs.is_empty() {
        return Ok(report);
    }

    info!(%group, version = %cluster_version, scenarios = defs.len(), "Running scenario group");

    if group.shares_cluster() {
        let mut fixture = ClusterFixture::setup(env, &cluster_version)?;
        for def in defs {
            let outcome = run_scenario(env, fixture.cluster_mut(), def)?;
            on_outcome(&outcome);
            report.outcomes.push(outcome);
        }
        fixture.teardown()?;
    } else {
        for def in defs {
            let mut fixture = ClusterFixture::setup(env, &cluster_version)?;
            let outcome = run_scenario(env, fixture.cluster_mut(), def)?;
            fixture.teardown()?;
            on_outcome(&outcome);
            report.outcomes.push(outcome);
        }
    }

    Ok(report)
}
