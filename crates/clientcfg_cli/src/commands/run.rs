//! Scenario execution command.

use super::{load_config, GlobalOpts};
use anyhow::{bail, Context, Result};
use chrono::Local;
use clientcfg_core::{run_group, scenarios_in, GroupReport, HarnessEnv, ScenarioGroup, ScenarioOutcome};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

#[derive(Serialize)]
struct RunReport<'a> {
    started_at: String,
    finished_at: String,
    passed: bool,
    groups: &'a [GroupReport],
}

/// Run the selected scenarios and report a verdict per scenario.
pub fn run(
    opts: &GlobalOpts,
    group: Option<ScenarioGroup>,
    filter: Option<&str>,
    format: &str,
) -> Result<()> {
    let json = match format {
        "json" => true,
        "text" => false,
        other => bail!("Unsupported format: {}. Use 'json' or 'text'.", other),
    };

    let config = load_config(opts)?;
    config.validate().context("Invalid harness configuration")?;
    let env = HarnessEnv::from_config(config).context("Failed to prepare harness environment")?;

    let groups = group.map_or_else(|| ScenarioGroup::ALL.to_vec(), |g| vec![g]);
    let total: usize = groups
        .iter()
        .map(|g| {
            scenarios_in(*g)
                .filter(|d| filter.map_or(true, |f| d.name.contains(f)))
                .count()
        })
        .sum();
    if total == 0 {
        bail!("No scenario matches the selection");
    }

    let pb = if json {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("=> "),
        );
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    };

    let started_at = Local::now();
    let mut reports = Vec::with_capacity(groups.len());
    for group in groups {
        pb.set_message(format!("{} group", group));
        let result = run_group(&env, group, filter, |outcome| {
            pb.inc(1);
            if !json {
                pb.println(verdict_line(outcome));
            }
        });

        match result {
            Ok(report) => reports.push(report),
            Err(e) => {
                pb.finish_and_clear();
                if let Some(hint) = e.recovery_suggestion() {
                    eprintln!("{} {}", style("hint:").yellow().bold(), hint);
                }
                return Err(e).with_context(|| format!("Setup of the {} group failed", group));
            }
        }
    }
    pb.finish_and_clear();

    let passed = reports.iter().all(GroupReport::passed);
    let failed: usize = reports.iter().map(|r| r.failures().count()).sum();

    if json {
        let report = RunReport {
            started_at: started_at.to_rfc3339(),
            finished_at: Local::now().to_rfc3339(),
            passed,
            groups: &reports,
        };
        let out = serde_json::to_string_pretty(&report).context("Failed to serialize to JSON")?;
        println!("{}", out);
    } else {
        println!();
        if passed {
            println!(
                "{} {}",
                style("✓").green(),
                style(format!("{} scenario(s) passed", total)).green()
            );
        } else {
            println!(
                "{} {}",
                style("×").red(),
                style(format!("{} of {} scenario(s) failed", failed, total))
                    .red()
                    .bold()
            );
        }
    }

    if !passed {
        bail!("{} scenario(s) failed", failed);
    }
    Ok(())
}

fn verdict_line(outcome: &ScenarioOutcome) -> String {
    if outcome.passed {
        format!(
            "{} {} {}",
            style("✓").green(),
            outcome.name,
            style(format!("({}ms)", outcome.elapsed_ms)).dim()
        )
    } else {
        format!(
            "{} {}: expected {}, observed {}",
            style("×").red(),
            style(&outcome.name).bold(),
            outcome.expected,
            style(outcome.observed).red()
        )
    }
}
