mod current_cluster;
mod setup_errors;
mod upgrade_race;
