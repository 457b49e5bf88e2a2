//! Runs the tester executable for one scenario and judges its exit status.

use super::config::ScenarioConfig;
use super::outcome::{Observation, ScenarioOutcome};
use crate::config::{ExpectationMode, HarnessConfig};
use crate::error::{HarnessError, Result};
use crate::sandbox::Sandbox;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const WATCHDOG_POLL: Duration = Duration::from_millis(10);

/// A finished tester process, not yet judged.
#[derive(Debug)]
pub struct Execution {
    args: Vec<String>,
    observed: Observation,
    elapsed: Duration,
}

/// Launches the tester executable.
///
/// Standard output and error are inherited, so the tester's own diagnostics
/// land next to the harness's.
pub struct ScenarioRunner {
    tester_bin: PathBuf,
    mode: ExpectationMode,
    watchdog: Option<Duration>,
    env: BTreeMap<String, String>,
    diagnostics: Mutex<Box<dyn Write + Send>>,
}

impl ScenarioRunner {
    /// Creates a runner for `tester_bin`. Failure logs go to stderr.
    pub fn new(tester_bin: impl Into<PathBuf>) -> Self {
        Self {
            tester_bin: tester_bin.into(),
            mode: ExpectationMode::default(),
            watchdog: None,
            env: BTreeMap::new(),
            diagnostics: Mutex::new(Box::new(io::stderr())),
        }
    }

    /// Creates a runner from the `[runner]` configuration.
    pub fn from_config(config: &HarnessConfig) -> Self {
        Self::new(&config.tester_bin)
            .with_mode(config.runner.expectation)
            .with_watchdog(config.runner.watchdog())
            .with_env(config.runner.env.clone())
    }

    pub fn with_mode(mut self, mode: ExpectationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Kills the tester once `watchdog` elapses. `None` waits forever.
    pub fn with_watchdog(mut self, watchdog: Option<Duration>) -> Self {
        self.watchdog = watchdog;
        self
    }

    /// Extra environment for the tester process.
    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// Where sandbox logs are dumped when a scenario fails.
    pub fn with_diagnostics(mut self, out: impl Write + Send + 'static) -> Self {
        self.diagnostics = Mutex::new(Box::new(out));
        self
    }

    pub fn tester_bin(&self) -> &Path {
        &self.tester_bin
    }

    pub fn mode(&self) -> ExpectationMode {
        self.mode
    }

    /// Runs the scenario, judges it, and removes its sandbox.
    pub fn run(&self, config: ScenarioConfig) -> Result<ScenarioOutcome> {
        self.run_with_hook(config, || {})
    }

    /// Like [`ScenarioRunner::run`], calling `on_launch` once the tester
    /// process exists.
    pub fn run_with_hook(
        &self,
        config: ScenarioConfig,
        on_launch: impl FnOnce(),
    ) -> Result<ScenarioOutcome> {
        let execution = self.execute(&config, on_launch);
        self.finish(config, execution)
    }

    /// Spawns the tester and blocks until it exits or the watchdog fires.
    pub fn execute(&self, config: &ScenarioConfig, on_launch: impl FnOnce()) -> Result<Execution> {
        let args = config.tester_args(self.mode)?;
        let rendered = args.to_strings();
        info!(scenario = config.name(), "Executing tester");
        debug!(
            command = %format!("{} {}", self.tester_bin.display(), rendered.join(" ")),
            "Materialized tester command"
        );

        let started = Instant::now();
        let mut child = Command::new(&self.tester_bin)
            .args(args.to_args())
            .envs(&self.env)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| HarnessError::Spawn {
                program: self.tester_bin.clone(),
                source,
            })?;
        on_launch();

        let observed: Observation = match self.watchdog {
            None => child.wait()?.into(),
            Some(limit) => loop {
                if let Some(status) = child.try_wait()? {
                    break status.into();
                }
                if started.elapsed() >= limit {
                    warn!(scenario = config.name(), pid = child.id(), "Watchdog expired, killing tester");
                    let _ = child.kill();
                    child.wait()?;
                    break Observation::WatchdogExpired {
                        after_ms: limit.as_millis() as u64,
                    };
                }
                thread::sleep(WATCHDOG_POLL);
            },
        };

        Ok(Execution {
            args: rendered,
            observed,
            elapsed: started.elapsed(),
        })
    }

    /// Judges an execution, dumps logs on failure, and closes the sandbox.
    ///
    /// The sandbox is removed on every path, including when `execution`
    /// is an error.
    pub fn finish(&self, config: ScenarioConfig, execution: Result<Execution>) -> Result<ScenarioOutcome> {
        let name = config.name().to_string();
        let expected = config.expectation();
        let sandbox = config.into_sandbox();

        let outcome = execution.map(|execution| {
            let passed = expected.is_met(self.mode, &execution.observed);
            ScenarioOutcome {
                name,
                args: execution.args,
                expected,
                observed: execution.observed,
                elapsed_ms: execution.elapsed.as_millis() as u64,
                passed,
            }
        });

        if let Ok(outcome) = &outcome {
            if outcome.passed {
                info!(scenario = %outcome.name, observed = %outcome.observed, "Scenario passed");
            } else {
                warn!(
                    scenario = %outcome.name,
                    expected = %outcome.expected,
                    observed = %outcome.observed,
                    "Scenario failed, dumping tester logs"
                );
                self.dump(&sandbox);
            }
        }

        match sandbox.close() {
            Ok(()) => outcome,
            Err(e) if outcome.is_ok() => Err(e),
            Err(_) => outcome,
        }
    }

    fn dump(&self, sandbox: &Sandbox) {
        let mut out = match self.diagnostics.lock() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = sandbox.dump_logs(&mut **out) {
            warn!(error = %e, "Failed to dump tester logs");
        }
        let _ = out.flush();
    }
}
