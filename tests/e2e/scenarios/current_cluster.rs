use crate::harness::{assert_clean, assert_exited_with, assert_group_passed, assert_passed, Scenario, TestWorkspace};
use clientcfg_core::{run_group, ErrorCode, ScenarioGroup, VersionRole, VersionSet};

#[test]
fn test_current_group_passes_on_one_cluster() {
    let workspace = TestWorkspace::new().unwrap();
    let env = workspace.env().unwrap();

    let mut seen = Vec::new();
    let report = run_group(&env, ScenarioGroup::Current, None, |o| seen.push(o.name.clone())).unwrap();

    assert_group_passed(&report);
    assert_eq!(report.outcomes.len(), 12);
    assert_eq!(seen.len(), 12);
    assert_eq!(report.cluster_version, workspace.versions().current);
    // One shared cluster for the whole group
    assert_eq!(workspace.events().events(), vec!["launch 7.3.0", "create", "shutdown"]);
    assert_clean(&workspace);
}

#[test]
fn test_filter_selects_by_name() {
    let workspace = TestWorkspace::new().unwrap();
    let env = workspace.env().unwrap();

    let report = run_group(&env, ScenarioGroup::Current, Some("_ignore"), |_| {}).unwrap();
    let names: Vec<_> = report.outcomes.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "no_external_client_support_api_version_ignore",
            "one_external_client_wrong_api_version_ignore",
            "external_client_not_matching_cluster_version_ignore",
        ]
    );
    assert_group_passed(&report);
}

#[test]
fn test_empty_selection_starts_no_cluster() {
    let workspace = TestWorkspace::new().unwrap();
    let env = workspace.env().unwrap();

    let report = run_group(&env, ScenarioGroup::Current, Some("no-such-scenario"), |_| {}).unwrap();
    assert!(report.outcomes.is_empty());
    assert!(workspace.events().events().is_empty());
}

#[test]
fn test_invalid_cluster_file_exit_status() {
    let workspace = TestWorkspace::new().unwrap();
    let env = workspace.env().unwrap();

    let report = run_group(&env, ScenarioGroup::Current, Some("invalid_cluster_file"), |_| {}).unwrap();
    assert_eq!(report.outcomes.len(), 1);
    assert_passed(&report.outcomes[0]);
    assert_exited_with(&report.outcomes[0], ErrorCode::ConnectionStringInvalid);
}

#[test]
fn test_unreachable_coordinator_times_out() {
    let outcome = Scenario::new("unreachable")
        .external_library(VersionRole::Current)
        .disable_local_client()
        .timeout_ms(100)
        .unreachable_coordinator()
        .expect_error(ErrorCode::TransactionTimedOut)
        .run()
        .unwrap();

    assert_passed(&outcome);
    assert_exited_with(&outcome, ErrorCode::TransactionTimedOut);
}

#[test]
fn test_oldest_library_serves_requested_api() {
    let outcome = Scenario::new("oldest_api")
        .external_dir(&[VersionRole::Current, VersionRole::Prev, VersionRole::Prev2])
        .disable_local_client()
        .api_version(VersionRole::Prev2)
        .run()
        .unwrap();

    assert_passed(&outcome);
    assert!(outcome.args.contains(&"--external-client-dir".to_string()));
    let oldest = VersionSet::default().prev2.api_version().to_string();
    assert!(outcome.args.contains(&oldest));
}

#[test]
fn test_incompatible_external_client_is_rejected() {
    let outcome = Scenario::new("incompatible")
        .external_library(VersionRole::Prev)
        .disable_local_client()
        .api_version(VersionRole::Prev)
        .timeout_ms(5000)
        .expect_error(ErrorCode::IncompatibleClient)
        .run()
        .unwrap();

    assert_passed(&outcome);
    assert!(outcome.args.contains(&"--fail-incompatible-client".to_string()));
}
