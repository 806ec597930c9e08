//! Integration tests for the battle engine
//!
//! Tests the full stack: scenario files, episode control, the arena world
//! and match play

use battle_arena::{play_match, play_match_parallel, ArenaConfig, EpisodeRunner, PilotKind};
use battle_core::{
    ActionVector, AgentKind, AgentSpec, BattleError, EpisodeController, EpisodeState, HitEvent,
    HitOutcome, Pose, ScenarioConfig, SkipReason, Team, Termination, TickInput,
};

// ============================================================================
// TEST FIXTURES
// ============================================================================

/// Red at the origin facing +Z, yellow `gap` ahead, both melee
fn facing_duel(gap: f32, yellow_yaw: f32, max_tick: u32) -> EpisodeController {
    let mut scenario = ScenarioConfig::duel();
    scenario.env.max_tick = max_tick;
    scenario.agents = vec![
        AgentSpec::new("red", Team::Red, AgentKind::melee(), Pose::at(0.0, 0.0, 0.0)),
        AgentSpec::new("yellow", Team::Yellow, AgentKind::melee(), Pose::at(0.0, gap, yellow_yaw)),
    ];
    EpisodeController::new(&scenario).unwrap()
}

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}

// ============================================================================
// SCENARIO FILE TESTS
// ============================================================================

#[test]
fn test_scenario_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("skirmish.json");

    let mut scenario = ScenarioConfig::skirmish(2);
    scenario.env.max_tick = 500;
    scenario.save(&path).unwrap();

    let loaded = ScenarioConfig::load(&path).unwrap();
    assert_eq!(loaded, scenario);
}

#[test]
fn test_load_rejects_empty_team() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lopsided.json");

    let mut scenario = ScenarioConfig::skirmish(2);
    scenario.agents.retain(|a| a.team == Team::Red);
    scenario.save(&path).unwrap();

    let err = ScenarioConfig::load(&path).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BattleError>(),
        Some(BattleError::EmptyTeam(Team::Yellow))
    ));
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(ScenarioConfig::load(&dir.path().join("missing.json")).is_err());
}

// ============================================================================
// COMBAT SCENARIOS
// ============================================================================

#[test]
fn test_back_attack_early_in_episode() {
    // Target faces the same way as the attacker: hit from behind
    let mut ctrl = facing_duel(1.0, 10.0, 1000);
    ctrl.enable_attack_valid(0).unwrap();

    let report = ctrl.step(TickInput {
        hits: vec![HitEvent::new(0, 1, 0)],
        ..Default::default()
    });

    assert!(approx(ctrl.agents()[1].hp(), 0.7));
    // Hit reward plus the living penalty of 1/1000
    assert!(approx(report.rewards[0], 0.45 - 0.001));
    assert!(approx(report.rewards[1], -0.3 - 0.001));
}

#[test]
fn test_dedup_window_through_step() {
    let mut ctrl = facing_duel(1.0, 180.0, 0);
    ctrl.enable_attack_valid(0).unwrap();

    // The collision source reports the same contact every tick
    let mut landed_at = Vec::new();
    for _ in 0..40 {
        let before = ctrl.agents()[1].hp();
        let report = ctrl.step(TickInput {
            hits: vec![HitEvent::new(0, 1, 0)],
            ..Default::default()
        });
        if ctrl.agents()[1].hp() < before {
            landed_at.push(report.tick);
        }
    }
    assert_eq!(landed_at, vec![1, 32]);

    let tick = ctrl.advance();
    assert_eq!(
        ctrl.resolve_hit(HitEvent::new(0, 1, tick)),
        HitOutcome::Skipped(SkipReason::Duplicate)
    );
}

#[test]
fn test_all_eliminated_pays_out_once() {
    let mut ctrl = facing_duel(1.0, 180.0, 1000);
    ctrl.enable_attack_valid(0).unwrap();

    let mut outcomes = Vec::new();
    let mut end = None;
    for round in 0..5 {
        // Each swing lands once per dedup window
        for _ in 0..31 {
            let report = ctrl.step(TickInput::default());
            assert!(report.episode_end.is_none());
        }
        let report = ctrl.step(TickInput {
            hits: vec![HitEvent::new(0, 1, 0)],
            ..Default::default()
        });
        outcomes.push(ctrl.agents()[1].hp());
        if round == 4 {
            end = report.episode_end;
            // Kill at tick 160 of 1000: bonus 3 - 0.16
            assert_eq!(report.tick, 160);
            assert!(approx(report.rewards[0], -0.001 + 0.3 + 3.0 - 0.16));
            assert!(approx(report.group_reward(Team::Red), 3.0));
            assert!(approx(report.group_reward(Team::Yellow), -3.0));
        }
    }

    let end = end.expect("fifth hit ends the episode");
    assert_eq!(end.termination, Termination::AllEliminated { winner: Team::Red });
    assert_eq!(ctrl.scoreboard().wins(Team::Red), 1);
    // Reset already happened: full hp, fresh clock
    assert_eq!(outcomes[4], 1.0);
    assert_eq!(ctrl.current_tick(), 0);
    assert_eq!(ctrl.state(), EpisodeState::Running);
}

#[test]
fn test_friendly_fire_ignored_in_skirmish() {
    let mut scenario = ScenarioConfig::skirmish(2);
    scenario.env.max_tick = 100;
    let mut ctrl = EpisodeController::new(&scenario).unwrap();
    let red_1 = ctrl.agent_id("red-1").unwrap();
    let red_2 = ctrl.agent_id("red-2").unwrap();
    ctrl.enable_attack_valid(red_1).unwrap();

    let report = ctrl.step(TickInput {
        hits: vec![HitEvent::new(red_1, red_2, 0)],
        ..Default::default()
    });
    assert_eq!(ctrl.agents()[red_2].hp(), 1.0);
    assert!(approx(report.rewards[red_1], -0.01));
}

#[test]
fn test_timeout_draw_leaves_scoreboard() {
    let mut ctrl = facing_duel(8.0, 180.0, 20);
    let mut last = None;
    for _ in 0..20 {
        last = Some(ctrl.step(TickInput {
            actions: vec![(0, ActionVector::IDLE), (1, ActionVector::IDLE)],
            ..Default::default()
        }));
    }
    let report = last.unwrap();
    let end = report.episode_end.unwrap();
    assert_eq!(end.termination, Termination::TimedOut { winner: None });
    assert_eq!(report.rewards, vec![0.0, 0.0]);
    assert_eq!(ctrl.scoreboard().total(), 0);
}

// ============================================================================
// ARENA TESTS
// ============================================================================

#[test]
fn test_idle_match_is_all_draws() {
    let mut scenario = ScenarioConfig::skirmish(2);
    scenario.env.max_tick = 60;
    let config = ArenaConfig::new(3, 2).with_pilot(PilotKind::Idle).with_seed(1);

    let result = play_match(&scenario, &config).unwrap();
    assert_eq!(result.episodes_played, 6);
    assert_eq!(result.draws, 6);
    assert_eq!(result.timeouts, 6);
    assert_eq!(result.avg_ticks, 60.0);
    assert_eq!(result.scoreboard.total(), 0);
}

#[test]
fn test_chaser_match_is_consistent() {
    let config = ArenaConfig::new(2, 2).with_pilot(PilotKind::Chaser).with_seed(3);
    let scenario = ScenarioConfig::duel();

    let sequential = play_match(&scenario, &config).unwrap();
    let parallel = play_match_parallel(&scenario, &config).unwrap();

    assert_eq!(sequential.episodes_played, 4);
    assert_eq!(sequential.red_wins + sequential.yellow_wins + sequential.draws, 4);
    assert_eq!(sequential.scoreboard.total(), sequential.red_wins + sequential.yellow_wins);
    assert_eq!(sequential.outcomes, parallel.outcomes);
}

#[test]
fn test_random_spawn_runner() {
    let mut scenario = ScenarioConfig::skirmish(3);
    scenario.env.max_tick = 30;
    scenario.env.random_spawn = true;

    let mut runner = EpisodeRunner::new(&scenario, PilotKind::Random, 99).unwrap();
    let outcomes = runner.play(2).unwrap();
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| o.ticks <= 30));
}
