//! The fixed set of client-configuration scenarios.

use super::command::TesterArgs;
use super::config::ScenarioConfig;
use crate::artifacts::staged_library_name;
use crate::cluster::ClusterController;
use crate::error::{HarnessError, Result};
use crate::sandbox::EXTERNAL_CLIENT_DIR;
use crate::stager::ArtifactStager;
use crate::version::{VersionRole, VersionSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use ErrorCode::*;
use VersionRole::{Current, Prev, Prev2};

/// Error codes the tester reports, as defined by the client library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    TransactionTimedOut,
    ConnectionStringInvalid,
    AllExternalClientsFailed,
    IncompatibleClient,
    ApiFunctionMissing,
}

impl ErrorCode {
    pub const fn code(self) -> i32 {
        match self {
            Self::TransactionTimedOut => 1031,
            Self::ConnectionStringInvalid => 2104,
            Self::AllExternalClientsFailed => 2124,
            Self::IncompatibleClient => 2125,
            Self::ApiFunctionMissing => 2204,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TransactionTimedOut => "transaction_timed_out",
            Self::ConnectionStringInvalid => "connection_string_invalid",
            Self::AllExternalClientsFailed => "all_external_clients_failed",
            Self::IncompatibleClient => "incompatible_client",
            Self::ApiFunctionMissing => "api_function_missing",
        };
        write!(f, "{} ({})", name, self.code())
    }
}

/// Test groups, one per kind of cluster they need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScenarioGroup {
    /// Scenarios sharing one cluster of the current release.
    Current,
    /// Scenarios sharing one cluster of the previous release.
    Previous,
    /// Scenarios that upgrade their cluster and need one each.
    UpgradeRace,
}

impl ScenarioGroup {
    pub const ALL: [ScenarioGroup; 3] = [Self::Current, Self::Previous, Self::UpgradeRace];

    /// Release the group's cluster starts on.
    pub fn cluster_role(self) -> VersionRole {
        match self {
            Self::Current => VersionRole::Current,
            Self::Previous | Self::UpgradeRace => VersionRole::Prev,
        }
    }

    /// Whether every scenario of the group runs against one shared cluster.
    pub fn shares_cluster(self) -> bool {
        !matches!(self, Self::UpgradeRace)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Previous => "previous",
            Self::UpgradeRace => "upgrade-race",
        }
    }
}

impl fmt::Display for ScenarioGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScenarioGroup {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| HarnessError::ConfigError(format!("unknown scenario group: {}", s)))
    }
}

/// Where the tester finds external client libraries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryLayout {
    None,
    Single(VersionRole),
    /// One library per release, in precedence order.
    Directory(&'static [VersionRole]),
}

/// Which cluster file the tester connects with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterFileKind {
    /// The running cluster's own file.
    Live,
    /// A well-formed file naming a port nothing listens on.
    UnreachableCoordinator,
    /// A file with no coordinator address.
    Invalid,
}

/// One catalog entry.
#[derive(Debug, Clone, Copy)]
pub struct ScenarioDef {
    pub name: &'static str,
    pub group: ScenarioGroup,
    pub summary: &'static str,
    pub libraries: LibraryLayout,
    pub disable_local_client: bool,
    /// API version, taken from a release.
    pub api_version: Option<VersionRole>,
    pub ignore_external_client_failures: bool,
    pub fail_incompatible_client: bool,
    pub transaction_timeout_ms: Option<u64>,
    pub cluster_file: ClusterFileKind,
    pub expected_error: Option<ErrorCode>,
    /// Release the cluster is upgraded to while the tester runs.
    pub upgrade_to: Option<VersionRole>,
}

const BASE: ScenarioDef = ScenarioDef {
    name: "",
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
};

static CATALOG: &[ScenarioDef] = &[
    ScenarioDef {
        name: "local_client_only",
        summary: "local client only, no external libraries",
        ..BASE
    },
    ScenarioDef {
        name: "single_external_client_only",
        summary: "one external client of the current release, local client disabled",
        libraries: LibraryLayout::Single(Current),
        disable_local_client: true,
        ..BASE
    },
    ScenarioDef {
        name: "same_local_and_external_client",
        summary: "local client plus an external client of the same release",
        libraries: LibraryLayout::Single(Current),
        ..BASE
    },
    ScenarioDef {
        name: "multiple_external_clients",
        summary: "three external clients, API version of the oldest",
        libraries: LibraryLayout::Directory(&[Current, Prev, Prev2]),
        disable_local_client: true,
        api_version: Some(Prev2),
        ..BASE
    },
    ScenarioDef {
        name: "no_external_client_support_api_version",
        summary: "no external client supports the requested API version",
        libraries: LibraryLayout::Directory(&[Prev2, Prev]),
        disable_local_client: true,
        api_version: Some(Current),
        expected_error: Some(ApiFunctionMissing),
        ..BASE
    },
    ScenarioDef {
        name: "no_external_client_support_api_version_ignore",
        summary: "no external client supports the API version, failures ignored",
        libraries: LibraryLayout::Directory(&[Prev2, Prev]),
        disable_local_client: true,
        api_version: Some(Current),
        ignore_external_client_failures: true,
        expected_error: Some(AllExternalClientsFailed),
        ..BASE
    },
    ScenarioDef {
        name: "one_external_client_wrong_api_version",
        summary: "one of three external clients lacks the requested API version",
        libraries: LibraryLayout::Directory(&[Current, Prev, Prev2]),
        disable_local_client: true,
        api_version: Some(Current),
        expected_error: Some(ApiFunctionMissing),
        ..BASE
    },
    ScenarioDef {
        name: "one_external_client_wrong_api_version_ignore",
        summary: "one external client lacks the API version, failures ignored",
        libraries: LibraryLayout::Directory(&[Current, Prev, Prev2]),
        disable_local_client: true,
        api_version: Some(Current),
        ignore_external_client_failures: true,
        ..BASE
    },
    ScenarioDef {
        name: "external_client_not_matching_cluster_version",
        summary: "only an external client of an older protocol",
        libraries: LibraryLayout::Single(Prev),
        disable_local_client: true,
        api_version: Some(Prev),
        transaction_timeout_ms: Some(5000),
        expected_error: Some(IncompatibleClient),
        ..BASE
    },
    ScenarioDef {
        name: "external_client_not_matching_cluster_version_ignore",
        summary: "only an older-protocol client, incompatibility tolerated until timeout",
        libraries: LibraryLayout::Single(Prev),
        disable_local_client: true,
        api_version: Some(Prev),
        fail_incompatible_client: false,
        transaction_timeout_ms: Some(100),
        expected_error: Some(TransactionTimedOut),
        ..BASE
    },
    ScenarioDef {
        name: "cannot_connect_to_coordinator",
        summary: "cluster file names a coordinator nothing listens on",
        libraries: LibraryLayout::Single(Current),
        disable_local_client: true,
        api_version: Some(Current),
        transaction_timeout_ms: Some(100),
        cluster_file: ClusterFileKind::UnreachableCoordinator,
        expected_error: Some(TransactionTimedOut),
        ..BASE
    },
    ScenarioDef {
        name: "invalid_cluster_file",
        summary: "cluster file without a coordinator address",
        libraries: LibraryLayout::Single(Current),
        disable_local_client: true,
        api_version: Some(Current),
        transaction_timeout_ms: Some(5000),
        cluster_file: ClusterFileKind::Invalid,
        expected_error: Some(ConnectionStringInvalid),
        ..BASE
    },
    ScenarioDef {
        name: "prev_external_client",
        group: ScenarioGroup::Previous,
        summary: "external client matching the previous-release cluster",
        libraries: LibraryLayout::Single(Prev),
        api_version: Some(Prev),
        ..BASE
    },
    ScenarioDef {
        name: "prev_external_client_unsupported_api",
        group: ScenarioGroup::Previous,
        summary: "previous-release client asked for the default API version",
        libraries: LibraryLayout::Single(Prev),
        expected_error: Some(ApiFunctionMissing),
        ..BASE
    },
    ScenarioDef {
        name: "prev_external_client_unsupported_api_ignore",
        group: ScenarioGroup::Previous,
        summary: "unsupported API on the previous-release client, failures ignored",
        libraries: LibraryLayout::Single(Prev),
        ignore_external_client_failures: true,
        transaction_timeout_ms: Some(5000),
        expected_error: Some(IncompatibleClient),
        ..BASE
    },
    ScenarioDef {
        name: "wait_cluster_to_upgrade",
        group: ScenarioGroup::UpgradeRace,
        summary: "current-release client waits out a cluster upgrade",
        libraries: LibraryLayout::Single(Current),
        fail_incompatible_client: false,
        transaction_timeout_ms: Some(10_000),
        upgrade_to: Some(Current),
        ..BASE
    },
];

/// Every scenario, in catalog order.
pub fn catalog() -> &'static [ScenarioDef] {
    CATALOG
}

/// Scenarios of one group, in catalog order.
pub fn scenarios_in(group: ScenarioGroup) -> impl Iterator<Item = &'static ScenarioDef> {
    CATALOG.iter().filter(move |s| s.group == group)
}

/// Looks a scenario up by name.
pub fn find(name: &str) -> Option<&'static ScenarioDef> {
    CATALOG.iter().find(|s| s.name == name)
}

impl ScenarioDef {
    pub fn expected_code(&self) -> Option<i32> {
        self.expected_error.map(ErrorCode::code)
    }

    /// Builds this scenario's configuration against a running cluster.
    pub fn configure(
        &self,
        cluster: &ClusterController,
        stager: &ArtifactStager,
        versions: &VersionSet,
    ) -> Result<ScenarioConfig> {
        let mut config = ScenarioConfig::new(self.name, cluster)?;
        self.apply_flags(&mut config, versions);

        match self.libraries {
            LibraryLayout::None => {}
            LibraryLayout::Single(role) => {
                config.stage_external_library(stager, &versions.resolve(role))?
            }
            LibraryLayout::Directory(roles) => {
                let releases: Vec<_> = roles.iter().map(|r| versions.resolve(*r)).collect();
                config.stage_external_library_dir(stager, &releases)?
            }
        }

        match self.cluster_file {
            ClusterFileKind::Live => {}
            ClusterFileKind::UnreachableCoordinator => {
                config.use_unreachable_cluster_file(cluster.ports())?
            }
            ClusterFileKind::Invalid => config.use_invalid_cluster_file()?,
        }

        Ok(config)
    }

    fn apply_flags(&self, config: &mut ScenarioConfig, versions: &VersionSet) {
        config.disable_local_client = self.disable_local_client;
        config.ignore_external_client_failures = self.ignore_external_client_failures;
        config.fail_incompatible_client = self.fail_incompatible_client;
        config.api_version = self.api_version.map(|r| versions.resolve(r).api_version());
        config.expected_error = self.expected_code();
        config.transaction_timeout = self.transaction_timeout_ms.map(Duration::from_millis);
    }

    /// The arguments this scenario materializes, with placeholder paths.
    pub fn preview_args(&self, versions: &VersionSet) -> TesterArgs {
        let sandbox = PathBuf::from("<sandbox>");
        let cluster_file = match self.cluster_file {
            ClusterFileKind::Live => PathBuf::from("<cluster>/fdb.cluster"),
            ClusterFileKind::UnreachableCoordinator | ClusterFileKind::Invalid => {
                sandbox.join("<random>.cluster")
            }
        };
        let (external_library, external_library_dir) = match self.libraries {
            LibraryLayout::None => (None, None),
            LibraryLayout::Single(role) => (
                Some(sandbox.join(staged_library_name(&versions.resolve(role)))),
                None,
            ),
            LibraryLayout::Directory(_) => (None, Some(sandbox.join(EXTERNAL_CLIENT_DIR))),
        };

        TesterArgs {
            disable_local_client: self.disable_local_client,
            external_library,
            external_library_dir,
            ignore_external_client_failures: self.ignore_external_client_failures,
            fail_incompatible_client: self.fail_incompatible_client,
            api_version: self.api_version.map(|r| versions.resolve(r).api_version()),
            transaction_timeout: self.transaction_timeout_ms.map(Duration::from_millis),
            ..TesterArgs::new(cluster_file, sandbox.join("tmp"), sandbox.join("log"))
        }
    }
}
