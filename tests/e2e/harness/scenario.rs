use super::workspace::TestWorkspace;
use anyhow::Result;
use clientcfg_core::{
    run_scenario, ClusterFileKind, ClusterFixture, ErrorCode, LibraryLayout, ScenarioDef,
    ScenarioGroup, ScenarioOutcome, VersionRole,
};

/// Fluent DSL for ad-hoc scenarios outside the catalog
///
/// Builds a [`ScenarioDef`] and runs it through the same path the catalog
/// uses: fixture setup, configuration, tester run, teardown.
pub struct Scenario {
    def: ScenarioDef,
}

impl Scenario {
    /// Create a scenario on a current-release cluster with default flags
    pub fn new(name: &'static str) -> Self {
        Self {
            def: ScenarioDef {
                name,
                group: ScenarioGroup::Current,
                summary: "",
                libraries: LibraryLayout::None,
                disable_local_client: false,
                api_version: None,
                ignore_external_client_failures: false,
                fail_incompatible_client: true,
                transaction_timeout_ms: None,
                cluster_file: ClusterFileKind::Live,
                expected_error: None,
                upgrade_to: None,
            },
        }
    }

    // ===== Cluster =====

    /// Run against a previous-release cluster
    pub fn on_previous_cluster(mut self) -> Self {
        self.def.group = ScenarioGroup::Previous;
        self
    }

    /// Upgrade the cluster while the tester runs
    pub fn upgrading_to(mut self, role: VersionRole) -> Self {
        self.def.group = ScenarioGroup::UpgradeRace;
        self.def.upgrade_to = Some(role);
        self
    }

    // ===== Client selection =====

    pub fn external_library(mut self, role: VersionRole) -> Self {
        self.def.libraries = LibraryLayout::Single(role);
        self
    }

    pub fn external_dir(mut self, roles: &'static [VersionRole]) -> Self {
        self.def.libraries = LibraryLayout::Directory(roles);
        self
    }

    pub fn disable_local_client(mut self) -> Self {
        self.def.disable_local_client = true;
        self
    }

    pub fn api_version(mut self, role: VersionRole) -> Self {
        self.def.api_version = Some(role);
        self
    }

    pub fn ignore_external_failures(mut self) -> Self {
        self.def.ignore_external_client_failures = true;
        self
    }

    pub fn tolerate_incompatible(mut self) -> Self {
        self.def.fail_incompatible_client = false;
        self
    }

    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.def.transaction_timeout_ms = Some(ms);
        self
    }

    // ===== Cluster file =====

    pub fn unreachable_coordinator(mut self) -> Self {
        self.def.cluster_file = ClusterFileKind::UnreachableCoordinator;
        self
    }

    pub fn invalid_cluster_file(mut self) -> Self {
        self.def.cluster_file = ClusterFileKind::Invalid;
        self
    }

    // ===== Expectation =====

    pub fn expect_error(mut self, code: ErrorCode) -> Self {
        self.def.expected_error = Some(code);
        self
    }

    pub fn def(&self) -> &ScenarioDef {
        &self.def
    }

    /// Run in a fresh workspace
    pub fn run(self) -> Result<ScenarioOutcome> {
        let workspace = TestWorkspace::new()?;
        self.run_in(&workspace)
    }

    /// Run in `workspace`, with a dedicated cluster
    pub fn run_in(self, workspace: &TestWorkspace) -> Result<ScenarioOutcome> {
        let env = workspace.env()?;
        let version = env.versions().resolve(self.def.group.cluster_role());
        let mut fixture = ClusterFixture::setup(&env, &version)?;
        let outcome = run_scenario(&env, fixture.cluster_mut(), &self.def)?;
        fixture.teardown()?;
        Ok(outcome)
    }
}
