//! Argument preview command.

use super::{load_config, GlobalOpts};
use anyhow::{bail, Result};
use clientcfg_core::{find, ExpectationMode};

/// Print the command line a scenario would run, with placeholder paths.
pub fn run(opts: &GlobalOpts, scenario: &str) -> Result<()> {
    let Some(def) = find(scenario) else {
        bail!("Unknown scenario: {}. Run `clientcfg list` to see the catalog.", scenario);
    };
    let config = load_config(opts)?;

    let mut args = def.preview_args(&config.versions);
    if config.runner.expectation == ExpectationMode::Delegate {
        args.expected_error = def.expected_code();
    }

    let tester = if config.tester_bin.as_os_str().is_empty() {
        "<tester>".to_string()
    } else {
        config.tester_bin.display().to_string()
    };
    println!("{} {}", tester, args.to_strings().join(" "));
    Ok(())
}
