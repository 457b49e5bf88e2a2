use super::workspace::TestWorkspace;
use clientcfg_core::{exit_status_of, ErrorCode, GroupReport, Observation, ScenarioOutcome};

/// Assert the scenario passed, printing the outcome otherwise
pub fn assert_passed(outcome: &ScenarioOutcome) {
    assert!(
        outcome.passed,
        "{} failed: expected {}, observed {} (args: {:?})",
        outcome.name, outcome.expected, outcome.observed, outcome.args
    );
}

/// Assert every scenario of a group passed
pub fn assert_group_passed(report: &GroupReport) {
    for outcome in &report.outcomes {
        assert_passed(outcome);
    }
    assert!(report.passed());
}

/// Assert the tester exited with the status `code` maps to
pub fn assert_exited_with(outcome: &ScenarioOutcome, code: ErrorCode) {
    assert_eq!(
        outcome.observed,
        Observation::Exited {
            status: exit_status_of(code.code())
        },
        "{}",
        outcome.name
    );
}

/// Assert nothing the harness created is left under the work root
pub fn assert_clean(workspace: &TestWorkspace) {
    let sandboxes = workspace.leftover_sandboxes().unwrap();
    assert!(sandboxes.is_empty(), "leftover sandboxes: {:?}", sandboxes);
    let clusters = workspace.cluster_dirs().unwrap();
    assert!(clusters.is_empty(), "leftover clusters: {:?}", clusters);
}
