// observer_sim/src/main.rs

//! Loads a scenario, runs it, and logs the summary.
//!
//! `cargo run -p observer_sim -- --scenario assets/scenarios/disturbed_oscillator.toml`
//!
//! Log verbosity follows `RUST_LOG` (default `info`), e.g.
//! `RUST_LOG=info,observer_core=debug`.

use std::process::ExitCode;

use clap::Parser;
use observer_sim::prelude::*;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match ScenarioConfig::load(&cli).and_then(|config| run(&config)) {
        Ok(summary) => {
            info!(
                disturbance_error = summary.disturbance_error(),
                "{summary}"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
