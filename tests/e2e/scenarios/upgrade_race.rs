use crate::harness::{assert_clean, assert_group_passed, assert_passed, Scenario, TestWorkspace};
use anyhow::Result;
use clientcfg_core::{
    run_group, run_scenario, ClusterFixture, ErrorCode, HarnessError, Observation, ScenarioGroup,
    ScenarioRunner, VersionRole, LIBRARY_PATH_VAR,
};
use std::fs;

#[test]
fn test_client_survives_upgrade() {
    let workspace = TestWorkspace::new().unwrap();
    let env = workspace.env().unwrap();

    let report = run_group(&env, ScenarioGroup::UpgradeRace, None, |_| {}).unwrap();

    assert_group_passed(&report);
    assert_eq!(report.cluster_version, workspace.versions().prev);
    assert_eq!(
        workspace.events().events(),
        vec!["launch 7.2.5", "create", "shutdown", "launch 7.3.0", "shutdown"]
    );
    assert_clean(&workspace);
}

#[test]
fn test_client_times_out_without_upgrade() {
    let outcome = Scenario::new("no_upgrade")
        .on_previous_cluster()
        .external_library(VersionRole::Current)
        .disable_local_client()
        .tolerate_incompatible()
        .timeout_ms(300)
        .expect_error(ErrorCode::TransactionTimedOut)
        .run()
        .unwrap();

    assert_passed(&outcome);
}

#[test]
fn test_race_runs_on_dedicated_cluster() {
    let workspace = TestWorkspace::new().unwrap();
    let outcome = Scenario::new("race")
        .upgrading_to(VersionRole::Current)
        .external_library(VersionRole::Current)
        .tolerate_incompatible()
        .timeout_ms(10_000)
        .run_in(&workspace)
        .unwrap();

    assert_passed(&outcome);
    assert_eq!(outcome.observed, Observation::Exited { status: 0 });
    assert_eq!(workspace.events().count("launch"), 2);
    assert_clean(&workspace);
}

#[test]
fn test_upgrade_keeps_coordinator_address() -> Result<()> {
    let workspace = TestWorkspace::new()?;
    let env = workspace.env()?;
    let versions = *workspace.versions();

    let mut fixture = ClusterFixture::setup(&env, &versions.prev)?;
    let before = fixture.cluster().connection_string()?;
    let port = fixture.cluster().descriptor().ports[0];

    fixture.cluster_mut().upgrade(&versions.current)?;

    let cluster = fixture.cluster();
    assert_eq!(cluster.connection_string()?, before);
    assert_eq!(cluster.version(), versions.current);
    assert_eq!(
        fs::read_to_string(workspace.registry().join(port.to_string()))?,
        "7.3.0"
    );

    let lib_path = &cluster.descriptor().env[LIBRARY_PATH_VAR];
    let entries: Vec<_> = lib_path.split(':').collect();
    assert_eq!(entries.len(), 2);
    assert!(entries[0].starts_with(&workspace.build_dir().display().to_string()));
    assert!(entries[1].contains("7.2.5"));

    fixture.teardown()?;
    assert_clean(&workspace);
    Ok(())
}

#[test]
fn test_missing_tester_leaves_cluster_on_old_release() -> Result<()> {
    let workspace = TestWorkspace::new()?;
    let env = workspace
        .env()?
        .with_runner(ScenarioRunner::new(workspace.path().join("no-such-tester")));
    let def = *Scenario::new("race")
        .upgrading_to(VersionRole::Current)
        .external_library(VersionRole::Current)
        .tolerate_incompatible()
        .def();

    let mut fixture = ClusterFixture::setup(&env, &workspace.versions().prev)?;
    let err = run_scenario(&env, fixture.cluster_mut(), &def).unwrap_err();

    assert!(matches!(err, HarnessError::Spawn { .. }));
    assert_eq!(fixture.cluster().version(), workspace.versions().prev);
    assert!(workspace.leftover_sandboxes()?.is_empty());
    fixture.teardown()?;

    assert_eq!(workspace.events().count("launch"), 1);
    assert_clean(&workspace);
    Ok(())
}

#[test]
fn test_failed_upgrade_removes_sandbox() -> Result<()> {
    let workspace = TestWorkspace::new()?;
    let env = workspace.env()?;
    let def = *Scenario::new("race")
        .upgrading_to(VersionRole::Prev2)
        .external_library(VersionRole::Current)
        .tolerate_incompatible()
        .timeout_ms(300)
        .def();

    let mut fixture = ClusterFixture::setup(&env, &workspace.versions().prev)?;
    workspace.remove_release(&workspace.versions().prev2)?;
    let err = run_scenario(&env, fixture.cluster_mut(), &def).unwrap_err();

    assert!(
        matches!(err, HarnessError::MissingArtifact { version, .. } if version == workspace.versions().prev2)
    );
    assert!(workspace.leftover_sandboxes()?.is_empty());
    fixture.teardown()?;

    assert_eq!(workspace.events().count("launch"), 1);
    assert_clean(&workspace);
    Ok(())
}
