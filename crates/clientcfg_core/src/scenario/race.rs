//! A tester run racing an in-place cluster upgrade.

use super::config::ScenarioConfig;
use super::outcome::ScenarioOutcome;
use super::runner::ScenarioRunner;
use crate::cluster::ClusterController;
use crate::error::Result;
use crate::task_group::{join2, Joined};
use crate::version::Version;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// Upgrades the cluster while the tester is connecting to it.
#[derive(Debug, Clone, Copy)]
pub struct UpgradeRace {
    /// Release the cluster is upgraded to.
    pub target: Version,
    /// Delay between the tester process existing and the upgrade starting.
    pub delay: Duration,
}

impl UpgradeRace {
    pub fn new(target: Version, delay: Duration) -> Self {
        Self { target, delay }
    }

    /// Runs the tester and the upgrade concurrently, then judges.
    ///
    /// The upgrade waits until the tester process has been spawned, then for
    /// `delay`. The outcome is judged only after both tasks have finished. If
    /// the tester never starts, the cluster is left untouched.
    ///
    /// # Errors
    ///
    /// Returns the upgrade's error if the upgrade failed, after the sandbox
    /// has been removed.
    pub fn run(
        &self,
        runner: &ScenarioRunner,
        config: ScenarioConfig,
        cluster: &mut ClusterController,
    ) -> Result<ScenarioOutcome> {
        let (launched_tx, launched_rx) = mpsc::channel::<()>();
        let tester_config = &config;

        let Joined {
            left: execution,
            right: upgraded,
        } = join2(
            ("tester", move || {
                runner.execute(tester_config, move || {
                    let _ = launched_tx.send(());
                })
            }),
            ("upgrade", move || -> Result<bool> {
                if launched_rx.recv().is_err() {
                    debug!("Tester did not start, skipping upgrade");
                    return Ok(false);
                }
                thread::sleep(self.delay);
                cluster.upgrade(&self.target)?;
                Ok(true)
            }),
        )?;

        let outcome = runner.finish(config, execution)?;
        if upgraded? {
            info!(scenario = %outcome.name, version = %self.target, "Upgrade completed during scenario");
        }
        Ok(outcome)
    }
}
