//! Simulate command - play episodes with scripted pilots
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: load_scenario(), build_config(), report_results()
//! - Level 3: play via battle_arena
//! - Level 4: formatting utilities

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Args;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use battle_arena::{play_match, play_match_parallel, ArenaConfig, MatchResult, PilotKind};
use battle_core::{ScenarioConfig, Team};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct SimulateArgs {
    /// Scenario JSON file (default: built-in duel)
    #[arg(long, value_name = "FILE")]
    pub scenario: Option<PathBuf>,

    /// Episodes per environment
    #[arg(long, default_value = "10")]
    pub episodes: usize,

    /// Independent environments
    #[arg(long, default_value = "4")]
    pub environments: usize,

    /// Pilot for every agent: idle, random or chaser
    #[arg(long, default_value = "chaser")]
    pub pilot: String,

    /// Override episode length in ticks
    #[arg(long)]
    pub max_tick: Option<u32>,

    /// Run environments one after another
    #[arg(long)]
    pub sequential: bool,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run simulate command
///
/// 1. Load the scenario
/// 2. Play every environment
/// 3. Report results
pub fn run(args: SimulateArgs, seed: Option<u64>) -> Result<()> {
    let scenario = load_scenario(&args)?;
    let config = build_config(&args, seed)?;

    tracing::info!(
        "Simulating '{}': {} environments x {} episodes, pilot={:?}, seed={:?}",
        scenario.name,
        config.environments,
        config.episodes,
        config.pilot,
        config.seed
    );

    let result = if config.parallel {
        play_match_parallel(&scenario, &config)
    } else {
        play_match(&scenario, &config)
    }
    .context("Simulation failed")?;

    report_results(&result, &args);
    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Load the scenario file, or fall back to the built-in duel
fn load_scenario(args: &SimulateArgs) -> Result<ScenarioConfig> {
    let mut scenario = match &args.scenario {
        Some(path) => ScenarioConfig::load(path)
            .with_context(|| format!("Failed to load scenario: {}", path.display()))?,
        None => ScenarioConfig::duel(),
    };

    if let Some(max_tick) = args.max_tick {
        scenario.env.max_tick = max_tick;
    }
    Ok(scenario)
}

/// Turn command-line arguments into an arena configuration
fn build_config(args: &SimulateArgs, seed: Option<u64>) -> Result<ArenaConfig> {
    let pilot = PilotKind::from_name(&args.pilot)
        .ok_or_else(|| anyhow!("Unknown pilot: {} (expected idle, random or chaser)", args.pilot))?;

    let mut config = ArenaConfig::new(args.episodes, args.environments)
        .with_pilot(pilot)
        .with_seed(resolve_seed(seed));
    if args.sequential {
        config = config.sequential();
    }
    Ok(config)
}

/// Report match results
fn report_results(result: &MatchResult, args: &SimulateArgs) {
    if args.json {
        print_json_results(result);
    } else {
        print_text_results(result);
    }
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

/// Use the given seed or draw one from entropy
fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(|| create_rng(None).gen())
}

/// Create RNG from seed or random
fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    }
}

fn percent(count: u32, total: u32) -> f32 {
    if total > 0 {
        count as f32 / total as f32 * 100.0
    } else {
        0.0
    }
}

/// Print results as JSON
fn print_json_results(result: &MatchResult) {
    match serde_json::to_string_pretty(result) {
        Ok(json) => println!("{}", json),
        Err(e) => tracing::error!("Failed to serialize results: {}", e),
    }
}

/// Print results as text
fn print_text_results(result: &MatchResult) {
    let total = result.episodes_played;

    println!("\n=== Simulation Results ===");
    println!("Episodes:     {}", total);
    println!("Red wins:     {} ({:.1}%)", result.red_wins, percent(result.red_wins, total));
    println!("Yellow wins:  {} ({:.1}%)", result.yellow_wins, percent(result.yellow_wins, total));
    println!("Draws:        {} ({:.1}%)", result.draws, percent(result.draws, total));
    println!("Eliminations: {}", result.eliminations);
    println!("Timeouts:     {}", result.timeouts);
    println!("Avg ticks:    {:.1}", result.avg_ticks);
    println!(
        "Scoreboard:   red {} - yellow {}",
        result.scoreboard.display(Team::Red),
        result.scoreboard.display(Team::Yellow)
    );

    println!("\nEpisode details:");
    for (i, outcome) in result.outcomes.iter().enumerate() {
        println!(
            "  Episode {}: {:?} in {} ticks (group rewards {:.2} / {:.2})",
            i + 1,
            outcome.termination,
            outcome.ticks,
            outcome.team_rewards[0],
            outcome.team_rewards[1]
        );
    }
}

// ============================================================================
// TESTS
// ============================================================================
