use crate::harness::{assert_clean, TestWorkspace};
use clientcfg_core::{run_group, HarnessError, ScenarioGroup};

#[test]
fn test_missing_release_aborts_group() {
    let workspace = TestWorkspace::new().unwrap();
    workspace.remove_release(&workspace.versions().prev2).unwrap();
    let env = workspace.env().unwrap();

    let err = run_group(&env, ScenarioGroup::Current, None, |_| {}).unwrap_err();

    assert!(matches!(err, HarnessError::MissingArtifact { version, .. } if version == workspace.versions().prev2));
    assert!(err.is_setup_error());
    assert!(err.recovery_suggestion().is_some());
    assert_clean(&workspace);
}

#[test]
fn test_missing_cluster_release_starts_nothing() {
    let workspace = TestWorkspace::new().unwrap();
    workspace.remove_release(&workspace.versions().prev).unwrap();
    let env = workspace.env().unwrap();

    let err = run_group(&env, ScenarioGroup::Previous, None, |_| {}).unwrap_err();

    assert!(matches!(err, HarnessError::MissingArtifact { .. }));
    assert!(workspace.events().events().is_empty());
    assert_clean(&workspace);
}

#[test]
fn test_cluster_not_ready_aborts_and_cleans_up() {
    let workspace = TestWorkspace::new().unwrap().never_ready();
    let env = workspace.env().unwrap();

    let err = run_group(&env, ScenarioGroup::Current, None, |_| {}).unwrap_err();

    assert!(matches!(err, HarnessError::ClusterNotReady { .. }));
    assert_eq!(workspace.events().events(), vec!["launch 7.3.0", "shutdown"]);
    assert_clean(&workspace);
}
