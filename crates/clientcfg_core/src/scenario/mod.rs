//! Scenario configuration, execution and the scenario catalog.

mod catalog;
mod command;
mod config;
mod outcome;
mod race;
mod runner;

pub use catalog::{
    catalog, find, scenarios_in, ClusterFileKind, ErrorCode, LibraryLayout, ScenarioDef,
    ScenarioGroup,
};
pub use command::TesterArgs;
pub use config::ScenarioConfig;
pub use outcome::{exit_status_of, Expectation, Observation, ScenarioOutcome};
pub use race::UpgradeRace;
pub use runner::{Execution, ScenarioRunner};
