//! Battle CLI - Command-line interface
//!
//! Commands:
//! - simulate: Play episodes with scripted pilots and report results
//! - scenario: Write a scenario file from a built-in preset

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod scenario_cmd;
mod simulate_cmd;

#[derive(Parser)]
#[command(name = "battle")]
#[command(about = "Team melee combat engine for reinforcement-learning training")]
struct Cli {
    /// Random seed for reproducibility
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play episodes and report wins, draws and rewards
    Simulate(simulate_cmd::SimulateArgs),
    /// Write a scenario file
    Scenario(scenario_cmd::ScenarioArgs),
}

fn main() -> anyhow::Result<()> {
    // Initialize logging (RUST_LOG overrides the default level)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate(args) => simulate_cmd::run(args, cli.seed),
        Commands::Scenario(args) => scenario_cmd::run(args),
    }
}
