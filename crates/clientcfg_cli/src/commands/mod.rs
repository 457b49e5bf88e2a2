//! CLI commands.

use anyhow::{Context, Result};
use clientcfg_core::HarnessConfig;
use std::path::PathBuf;

pub mod args;
pub mod list;
pub mod run;

/// Options shared by every command.
pub struct GlobalOpts {
    pub config: PathBuf,
    pub build_dir: Option<PathBuf>,
    pub tester_bin: Option<PathBuf>,
    pub watchdog_secs: Option<u64>,
}

/// Loads the configuration file and applies command-line overrides.
pub fn load_config(opts: &GlobalOpts) -> Result<HarnessConfig> {
    let mut config = HarnessConfig::load(&opts.config)
        .with_context(|| format!("Failed to load {}", opts.config.display()))?;

    if let Some(dir) = &opts.build_dir {
        config.build_dir = dir.clone();
    }
    if let Some(bin) = &opts.tester_bin {
        config.tester_bin = bin.clone();
    }
    if opts.watchdog_secs.is_some() {
        config.runner.watchdog_secs = opts.watchdog_secs;
    }
    Ok(config)
}
