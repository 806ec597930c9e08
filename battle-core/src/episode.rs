//! Episode controller - tick driver, termination and final rewards
//!
//! One tick runs in a fixed order:
//! 1. [`EpisodeController::advance`] (tick, living penalty, stamina, timeout)
//! 2. actions, blocks, hits, obstacle contacts
//! 3. [`EpisodeController::end_tick`] (drain rewards, reset if terminal)
//!
//! [`EpisodeController::step`] runs the whole sequence with events sorted
//! so that replays are reproducible regardless of report order.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rustc_hash::FxHashMap;

use crate::action::{ActionVector, MeleeIntent};
use crate::agent::{AgentId, AgentState, AttackRefusal, Team};
use crate::clock::TimeStepClock;
use crate::combat::{
    apply_block, apply_hit, validate_block, validate_hit, BlockEvent, BlockOutcome, HitEvent,
    HitOutcome, SkipReason,
};
use crate::config::{EnvConfig, ScenarioConfig};
use crate::error::{BattleError, Result};
use crate::geometry::{Pose, Vec3};
use crate::report::{
    AgentDisplay, DisplayFrame, EngineCommand, EpisodeEnd, StepReport, Termination,
};
use crate::rules::{OBSTACLE_PENALTY, TIE_EPSILON};
use crate::scoreboard::ScoreBoard;
use crate::team::TeamGroup;

// ============================================================================
// TYPES
// ============================================================================

/// Episode lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EpisodeState {
    Running,
    /// Tick limit reached (interrupted, not a natural end)
    TimedOut,
    AllEliminated,
}

/// Result of feeding one action vector
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Unknown or dead agent, or the episode is over
    Ignored,
    /// Movement applied; `attack` is set when an attack was requested
    Applied {
        attack: Option<std::result::Result<(), AttackRefusal>>,
    },
}

/// All external input for one tick
#[derive(Clone, Debug, Default)]
pub struct TickInput {
    pub actions: Vec<(AgentId, ActionVector)>,
    pub blocks: Vec<BlockEvent>,
    pub hits: Vec<HitEvent>,
    /// Agents touching an obstacle this tick
    pub obstacle_contacts: Vec<AgentId>,
}

// ============================================================================
// CONTROLLER
// ============================================================================

/// Owns every agent, both team groups, the clock and the scoreboard
pub struct EpisodeController {
    config: EnvConfig,
    agents: Vec<AgentState>,
    groups: [TeamGroup; 2],
    names: FxHashMap<String, AgentId>,
    clock: TimeStepClock,
    state: EpisodeState,
    scoreboard: ScoreBoard,
    /// Summary waiting for `end_tick`
    pending_end: Option<EpisodeEnd>,
    commands: Vec<EngineCommand>,
    rng: ChaCha8Rng,
    completed_episodes: u32,
}

impl EpisodeController {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    /// Build the roster and place every agent for the first episode
    ///
    /// Fails when a team has no agents or the settings are unusable.
    pub fn new(scenario: &ScenarioConfig) -> Result<Self> {
        scenario.validate()?;

        let config = scenario.env.clone();
        let mut groups = [TeamGroup::new(Team::Red), TeamGroup::new(Team::Yellow)];
        let mut names = FxHashMap::default();
        let mut agents = Vec::with_capacity(scenario.agents.len());

        for (id, entry) in scenario.agents.iter().enumerate() {
            agents.push(AgentState::new(
                id,
                &entry.name,
                entry.team,
                entry.kind,
                entry.spawn_pose()?,
                config.base_move_speed,
            ));
            groups[entry.team.index()].register(id);
            names.insert(entry.name.clone(), id);
        }

        let mut controller = Self {
            clock: TimeStepClock::new(config.max_tick),
            rng: ChaCha8Rng::seed_from_u64(config.seed.unwrap_or(42)),
            config,
            agents,
            groups,
            names,
            state: EpisodeState::Running,
            scoreboard: ScoreBoard::new(),
            pending_end: None,
            commands: Vec::new(),
            completed_episodes: 0,
        };
        controller.reset();
        Ok(controller)
    }

    /// Carry a win tally over from an earlier controller
    pub fn with_scoreboard(mut self, scoreboard: ScoreBoard) -> Self {
        self.scoreboard = scoreboard;
        self
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn agents(&self) -> &[AgentState] {
        &self.agents
    }

    pub fn agent(&self, id: AgentId) -> Option<&AgentState> {
        self.agents.get(id)
    }

    pub fn agent_id(&self, name: &str) -> Option<AgentId> {
        self.names.get(name).copied()
    }

    pub fn group(&self, team: Team) -> &TeamGroup {
        &self.groups[team.index()]
    }

    pub fn scoreboard(&self) -> &ScoreBoard {
        &self.scoreboard
    }

    pub fn clock(&self) -> &TimeStepClock {
        &self.clock
    }

    pub fn current_tick(&self) -> u32 {
        self.clock.current()
    }

    pub fn state(&self) -> EpisodeState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == EpisodeState::Running
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    pub fn completed_episodes(&self) -> u32 {
        self.completed_episodes
    }

    /// Hand over queued collaborator requests
    pub fn drain_commands(&mut self) -> Vec<EngineCommand> {
        std::mem::take(&mut self.commands)
    }

    // ========================================================================
    // TICK PROTOCOL
    // ========================================================================

    /// Start a tick: advance the clock, charge the living penalty, regenerate
    /// stamina and resolve a timeout. Returns the new tick number.
    ///
    /// Drivers must call [`end_tick`](Self::end_tick) after every tick. On a
    /// finished episode that was never flushed, the pending [`EpisodeEnd`]
    /// and that tick's rewards are discarded before the reset.
    pub fn advance(&mut self) -> u32 {
        if self.state != EpisodeState::Running {
            tracing::warn!("advance() called before end_tick() flushed the finished episode");
            self.pending_end = None;
            self.reset();
        }

        let tick = self.clock.advance();

        let penalty = self.clock.per_tick(1.0);
        for agent in self.agents.iter_mut().filter(|a| a.is_alive()) {
            if penalty > 0.0 {
                agent.add_reward(-penalty);
            }
            agent.regenerate();
        }

        if self.clock.is_expired() {
            self.resolve_timeout();
        }

        tick
    }

    /// Finish a tick: emit rewards and, if the episode ended, reset
    pub fn end_tick(&mut self) -> StepReport {
        let tick = self.clock.current();
        let rewards = self.agents.iter_mut().map(|a| a.take_step_reward()).collect();
        let group_rewards = [
            self.groups[0].take_step_reward(),
            self.groups[1].take_step_reward(),
        ];
        let observations = self.agents.iter().map(|a| a.observation()).collect();
        let episode_end = self.pending_end.take();

        if episode_end.is_some() {
            for group in &mut self.groups {
                group.take_signal();
            }
            self.reset();
        }

        StepReport {
            tick,
            rewards,
            group_rewards,
            observations,
            episode_end,
        }
    }

    /// Run one full tick with events in a reproducible order
    ///
    /// Actions go by agent id, blocks and hits by (attacker, target/defender).
    /// Blocks come before hits so a blocked swing cannot also land.
    pub fn step(&mut self, mut input: TickInput) -> StepReport {
        let tick = self.advance();

        input.actions.sort_by_key(|&(id, _)| id);
        for (id, action) in input.actions {
            self.apply_action(id, action);
        }

        input.blocks.sort_by_key(|b| (b.attacker, b.defender));
        for mut block in input.blocks {
            block.tick = tick;
            self.resolve_block(block);
        }

        let hits = input
            .hits
            .into_iter()
            .map(|h| HitEvent::new(h.attacker, h.target, tick))
            .collect();
        self.resolve_hits(hits);

        input.obstacle_contacts.sort_unstable();
        input.obstacle_contacts.dedup();
        for id in input.obstacle_contacts {
            self.apply_obstacle_contact(id);
        }

        self.end_tick()
    }

    // ========================================================================
    // COMBAT ENTRY POINTS
    // ========================================================================

    /// Resolve one sword hit; ineligible hits are no-ops
    pub fn resolve_hit(&mut self, event: HitEvent) -> HitOutcome {
        if self.state != EpisodeState::Running {
            return HitOutcome::Skipped(SkipReason::EpisodeOver);
        }
        if let Err(reason) = validate_hit(&self.agents, &event) {
            return HitOutcome::Skipped(reason);
        }

        let report = apply_hit(&mut self.agents, &event, self.clock.ratio_at(event.tick));
        if report.killed {
            self.on_killed(report.attacker, report.target);
        }
        HitOutcome::Landed(report)
    }

    /// Resolve a batch of hits in ascending (attacker, target, tick) order
    pub fn resolve_hits(&mut self, mut events: Vec<HitEvent>) -> Vec<HitOutcome> {
        events.sort_by_key(|e| (e.attacker, e.target, e.tick));
        events.into_iter().map(|e| self.resolve_hit(e)).collect()
    }

    /// Resolve a sword meeting a raised shield
    pub fn resolve_block(&mut self, event: BlockEvent) -> BlockOutcome {
        if self.state != EpisodeState::Running {
            return BlockOutcome::Skipped(SkipReason::EpisodeOver);
        }
        if let Err(reason) = validate_block(&self.agents, &event) {
            return BlockOutcome::Skipped(reason);
        }

        let report = apply_block(&mut self.agents, &event);
        self.commands.push(EngineCommand::ApplyImpulse {
            agent: report.attacker,
            impulse: report.attacker_impulse,
        });
        self.commands.push(EngineCommand::ApplyImpulse {
            agent: report.defender,
            impulse: report.defender_impulse,
        });
        BlockOutcome::Blocked(report)
    }

    /// Charge the per-tick obstacle penalty; returns false when skipped
    pub fn apply_obstacle_contact(&mut self, id: AgentId) -> bool {
        if self.state != EpisodeState::Running {
            return false;
        }
        let penalty = self.clock.per_tick(OBSTACLE_PENALTY);
        match self.agents.get_mut(id) {
            Some(agent) if agent.is_alive() => {
                agent.add_reward(-penalty);
                true
            }
            _ => false,
        }
    }

    // ========================================================================
    // ACTIONS
    // ========================================================================

    /// Apply one discrete action: move, turn and the kind-specific extra
    pub fn apply_action(&mut self, id: AgentId, action: ActionVector) -> ActionOutcome {
        if self.state != EpisodeState::Running {
            return ActionOutcome::Ignored;
        }
        let turn = self.config.rotate_speed * self.config.tick_seconds;
        let agent = match self.agents.get_mut(id) {
            Some(agent) if agent.is_alive() => agent,
            _ => return ActionOutcome::Ignored,
        };

        let facing = agent.facing();
        let speed = agent.move_speed();
        let mut movement = facing.scale(speed * action.forward_sign());
        if action.strafe_sign() != 0.0 {
            movement = facing.right().scale(speed * action.strafe_sign());
        }

        if action.rotate_sign() != 0.0 {
            if let Some(rotated) = facing.rotate_yaw(turn * action.rotate_sign()).normalized() {
                agent.pose.facing = rotated;
            }
        }

        let attack = if agent.kind.is_melee() {
            match action.melee_intent() {
                MeleeIntent::LowerShield => {
                    agent.lower_guard();
                    None
                }
                MeleeIntent::RaiseShield => {
                    agent.raise_guard();
                    None
                }
                MeleeIntent::Attack => Some(agent.try_begin_attack()),
            }
        } else {
            None
        };

        if movement != Vec3::ZERO {
            self.commands.push(EngineCommand::ApplyImpulse {
                agent: id,
                impulse: movement,
            });
        }
        if let Some(Ok(())) = attack {
            self.commands.push(EngineCommand::StartAttackAnimation { agent: id });
        }

        ActionOutcome::Applied { attack }
    }

    // ========================================================================
    // COLLABORATOR FEEDBACK
    // ========================================================================

    /// Animation layer opened the sword's active window
    pub fn enable_attack_valid(&mut self, id: AgentId) -> Result<()> {
        self.agent_mut(id)?.attack_valid = true;
        Ok(())
    }

    /// Animation layer closed the sword's active window
    pub fn disable_attack_valid(&mut self, id: AgentId) -> Result<()> {
        self.agent_mut(id)?.attack_valid = false;
        Ok(())
    }

    /// Mirror the animation layer's attack-in-progress flag
    pub fn set_attack_in_progress(&mut self, id: AgentId, attacking: bool) -> Result<()> {
        self.agent_mut(id)?.set_attacking(attacking);
        Ok(())
    }

    /// Attack animation exited
    pub fn finish_attack(&mut self, id: AgentId) -> Result<()> {
        self.agent_mut(id)?.finish_attack();
        Ok(())
    }

    /// Physics layer moved an agent
    pub fn sync_position(&mut self, id: AgentId, position: Vec3) -> Result<()> {
        self.agent_mut(id)?.pose.position = position;
        Ok(())
    }

    fn agent_mut(&mut self, id: AgentId) -> Result<&mut AgentState> {
        self.agents.get_mut(id).ok_or(BattleError::UnknownAgent(id))
    }

    // ========================================================================
    // TERMINATION
    // ========================================================================

    /// A hit brought `prey` to zero hp
    fn on_killed(&mut self, killer: AgentId, prey: AgentId) {
        self.agents[prey].dead = true;

        let prey_team = self.agents[prey].team;
        let killer_team = self.agents[killer].team;
        let alive_teammates = self
            .agents
            .iter()
            .filter(|a| a.team == prey_team && a.id != prey && !a.dead)
            .count();

        tracing::debug!(
            "{} killed {} ({} teammates left)",
            self.agents[killer].name,
            self.agents[prey].name,
            alive_teammates
        );

        if alive_teammates > 0 {
            return;
        }

        let (_, killer_hp_mean) = self.team_hp(killer_team);
        let win_reward = 1.0 + 2.0 * killer_hp_mean;
        self.groups[killer_team.index()].add_group_reward(win_reward);
        self.groups[prey_team.index()].add_group_reward(-win_reward);

        tracing::info!(
            "[all-eliminated] {:?} wins at tick {} (group reward {:.3})",
            killer_team,
            self.clock.current(),
            win_reward
        );

        self.scoreboard.record_win(killer_team);
        self.terminate(
            EpisodeState::AllEliminated,
            Termination::AllEliminated { winner: killer_team },
        );
    }

    /// Tick limit reached: decide winner by hp, then by cumulative reward
    fn resolve_timeout(&mut self) {
        let (red_sum, red_mean) = self.team_hp(Team::Red);
        let (yellow_sum, yellow_mean) = self.team_hp(Team::Yellow);

        let winner = if (red_sum - yellow_sum).abs() <= TIE_EPSILON {
            let red_reward = self.team_cumulative_reward(Team::Red);
            let yellow_reward = self.team_cumulative_reward(Team::Yellow);

            if (red_reward - yellow_reward).abs() <= TIE_EPSILON {
                None
            } else if red_reward > yellow_reward {
                Some(Team::Red)
            } else {
                Some(Team::Yellow)
            }
        } else if red_sum > yellow_sum {
            Some(Team::Red)
        } else {
            Some(Team::Yellow)
        };

        match winner {
            None => {
                for agent in &mut self.agents {
                    agent.set_reward(0.0);
                }
                for group in &mut self.groups {
                    group.set_group_reward(0.0);
                }
                tracing::info!("[timeout] draw at tick {}", self.clock.current());
            }
            Some(team) => {
                let (win_mean, lose_mean) = match team {
                    Team::Red => (red_mean, yellow_mean),
                    Team::Yellow => (yellow_mean, red_mean),
                };
                for agent in &mut self.agents {
                    let hp = agent.hp();
                    if agent.team == team {
                        agent.set_reward(hp);
                    } else {
                        agent.set_reward(-1.0 + hp);
                    }
                }
                self.groups[team.index()].set_group_reward(win_mean);
                self.groups[team.opponent().index()].set_group_reward(-1.0 + lose_mean);
                self.scoreboard.record_win(team);

                tracing::info!(
                    "[timeout] {:?} wins at tick {} (group rewards {:.3} / {:.3})",
                    team,
                    self.clock.current(),
                    win_mean,
                    -1.0 + lose_mean
                );
            }
        }

        self.terminate(EpisodeState::TimedOut, Termination::TimedOut { winner });
    }

    fn terminate(&mut self, state: EpisodeState, termination: Termination) {
        self.state = state;
        let signal = termination.group_signal();
        for group in &mut self.groups {
            group.end_episode(signal);
        }

        self.pending_end = Some(EpisodeEnd {
            termination,
            tick: self.clock.current(),
            episode: self.completed_episodes,
            team_rewards: [self.groups[0].episode_reward(), self.groups[1].episode_reward()],
        });
        self.completed_episodes += 1;
    }

    /// Hp sum and mean over every member of a team, dead ones included
    fn team_hp(&self, team: Team) -> (f32, f32) {
        let members = self.groups[team.index()].members();
        let sum: f32 = members.iter().map(|&id| self.agents[id].hp()).sum();
        // Groups are never empty: construction rejects empty teams
        (sum, sum / members.len() as f32)
    }

    fn team_cumulative_reward(&self, team: Team) -> f32 {
        self.groups[team.index()]
            .members()
            .iter()
            .map(|&id| self.agents[id].cumulative_reward())
            .sum()
    }

    // ========================================================================
    // RESET
    // ========================================================================

    /// Start a fresh episode; the scoreboard is left alone
    ///
    /// Rewards not yet collected by `end_tick` are discarded, as are
    /// collaborator requests queued during the finished episode.
    pub fn reset(&mut self) {
        self.commands.clear();

        for id in 0..self.agents.len() {
            let pose = if self.config.random_spawn {
                self.sample_spawn(id)
            } else {
                self.agents[id].spawn
            };
            self.agents[id].reset(pose);
            self.commands.push(EngineCommand::PlaceAgent { agent: id, pose });
            self.commands.push(EngineCommand::ClearCombatVisuals { agent: id });
        }

        self.clock.reset();
        for group in &mut self.groups {
            group.reset();
        }
        self.state = EpisodeState::Running;

        tracing::debug!("episode reset ({} completed)", self.completed_episodes);
    }

    /// Rejection-sample a spawn point clear of every other agent
    ///
    /// After `max_spawn_attempts` misses the fixed spawn pose is used, so
    /// separation is not guaranteed for that agent.
    fn sample_spawn(&mut self, id: AgentId) -> Pose {
        let extent = self.config.spawn_half_extent;
        let separation = self.config.min_spawn_separation;

        for _ in 0..self.config.max_spawn_attempts {
            let x = self.rng.gen_range(-extent..=extent);
            let z = self.rng.gen_range(-extent..=extent);
            let candidate = Vec3::new(x, 0.0, z);

            let clear = self
                .agents
                .iter()
                .filter(|other| other.id != id)
                .all(|other| other.pose.position.distance_to(candidate) > separation);

            if clear {
                return Pose::new(candidate, Vec3::FORWARD);
            }
        }

        tracing::warn!(
            "no clear spawn for {} after {} attempts, using fixed pose",
            self.agents[id].name,
            self.config.max_spawn_attempts
        );
        self.agents[id].spawn
    }

    // ========================================================================
    // PRESENTATION
    // ========================================================================

    /// Snapshot for the display sink
    pub fn display_frame(&self) -> DisplayFrame {
        let tick = self.clock.current();
        DisplayFrame {
            agents: self
                .agents
                .iter()
                .map(|a| AgentDisplay {
                    name: a.name.clone(),
                    team: a.team,
                    hp: a.hp(),
                    stamina: a.stamina(),
                    dead: a.dead,
                    flashing: a.is_flashing(tick),
                    pose: a.pose,
                })
                .collect(),
            remaining_ticks: self.clock.remaining(),
            red_score: self.scoreboard.display(Team::Red),
            yellow_score: self.scoreboard.display(Team::Yellow),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
