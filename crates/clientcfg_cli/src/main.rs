//! clientcfg - runs the client configuration scenarios against local clusters.

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use clientcfg_core::ScenarioGroup;
use std::path::PathBuf;

mod commands;

use commands::GlobalOpts;

#[derive(Parser)]
#[command(name = "clientcfg")]
#[command(about = "Client configuration tests against local clusters", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, default_value = "clientcfg.toml")]
    config: PathBuf,
    /// Build directory (overrides the configuration file)
    #[arg(long, global = true)]
    build_dir: Option<PathBuf>,
    /// Tester executable (overrides the configuration file)
    #[arg(long, global = true)]
    tester_bin: Option<PathBuf>,
    /// Kill a tester after this many seconds
    #[arg(long, global = true)]
    watchdog_secs: Option<u64>,
    /// Log more (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List catalog scenarios
    List {
        /// Only this group (current, previous, upgrade-race)
        #[arg(short, long)]
        group: Option<ScenarioGroup>,
    },
    /// Run scenarios
    Run {
        /// Only this group (current, previous, upgrade-race)
        #[arg(short, long)]
        group: Option<ScenarioGroup>,
        /// Only scenarios whose name contains this string
        #[arg(short, long)]
        filter: Option<String>,
        /// Output format (text, json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Print the tester arguments a scenario materializes
    Args {
        /// Scenario name
        scenario: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over -v
    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let opts = GlobalOpts {
        config: cli.config,
        build_dir: cli.build_dir,
        tester_bin: cli.tester_bin,
        watchdog_secs: cli.watchdog_secs,
    };

    match cli.command {
        Commands::List { group } => commands::list::run(group),
        Commands::Run {
            group,
            filter,
            format,
        } => commands::run::run(&opts, group, filter.as_deref(), &format),
        Commands::Args { scenario } => commands::args::run(&opts, &scenario),
    }
}
