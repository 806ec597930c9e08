//! Scenario command - write a preset scenario to disk

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;

use battle_core::ScenarioConfig;

#[derive(Args)]
pub struct ScenarioArgs {
    /// Output JSON file
    #[arg(long, value_name = "FILE")]
    pub output: PathBuf,

    /// Preset: duel or skirmish
    #[arg(long, default_value = "duel")]
    pub preset: String,

    /// Agents per team (skirmish only)
    #[arg(long, default_value = "2")]
    pub per_team: usize,

    /// Episode length in ticks (0 disables timeout)
    #[arg(long)]
    pub max_tick: Option<u32>,

    /// Sample spawn positions each episode
    #[arg(long)]
    pub random_spawn: bool,
}

/// Run scenario command
pub fn run(args: ScenarioArgs) -> Result<()> {
    let scenario = build_scenario(&args)?;
    scenario.validate()?;

    scenario
        .save(&args.output)
        .with_context(|| format!("Failed to write scenario: {}", args.output.display()))?;

    tracing::info!(
        "Wrote scenario '{}' ({} agents) to {}",
        scenario.name,
        scenario.agents.len(),
        args.output.display()
    );
    Ok(())
}

/// Build the requested preset with overrides applied
pub fn build_scenario(args: &ScenarioArgs) -> Result<ScenarioConfig> {
    let mut scenario = match args.preset.to_ascii_lowercase().as_str() {
        "duel" => ScenarioConfig::duel(),
        "skirmish" => {
            if args.per_team == 0 {
                bail!("--per-team must be at least 1");
            }
            ScenarioConfig::skirmish(args.per_team)
        }
        other => bail!("Unknown preset: {} (expected duel or skirmish)", other),
    };

    if let Some(max_tick) = args.max_tick {
        scenario.env.max_tick = max_tick;
    }
    if args.random_spawn {
        scenario.env.random_spawn = true;
    }

    Ok(scenario)
}
