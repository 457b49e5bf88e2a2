//! Catalog listing command.

use anyhow::Result;
use clientcfg_core::{scenarios_in, ScenarioGroup};
use console::style;

/// Print the scenarios of one group, or of all groups.
pub fn run(group: Option<ScenarioGroup>) -> Result<()> {
    let groups = group.map_or_else(|| ScenarioGroup::ALL.to_vec(), |g| vec![g]);

    for group in groups {
        println!(
            "{} {}",
            style(group.as_str()).bold(),
            style(format!("({} cluster)", cluster_label(group))).dim()
        );
        for def in scenarios_in(group) {
            let expected = def
                .expected_error
                .map_or_else(|| "success".to_string(), |e| e.to_string());
            println!(
                "  {:<52} {:<36} {}",
                style(def.name).cyan(),
                expected,
                style(def.summary).dim()
            );
        }
        println!();
    }
    Ok(())
}

fn cluster_label(group: ScenarioGroup) -> &'static str {
    match group {
        ScenarioGroup::Current => "shared, current release",
        ScenarioGroup::Previous => "shared, previous release",
        ScenarioGroup::UpgradeRace => "dedicated per scenario",
    }
}
