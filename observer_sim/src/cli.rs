// observer_sim/src/cli.rs

use clap::Parser;
use std::path::PathBuf;

/// Runs a disturbance-estimation scenario against a simulated plant.
///
/// Command-line values take precedence over the scenario file.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The path to the scenario TOML file to run.
    #[arg(
        short,
        long,
        default_value = "assets/scenarios/disturbed_oscillator.toml"
    )]
    pub scenario: PathBuf,

    /// Override the scenario's random seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override the scenario's duration, in seconds.
    #[arg(short, long)]
    pub duration: Option<f64>,
}
