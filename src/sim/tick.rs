//! Per-frame simulation driver
//!
//! `ThrowingSession` owns everything the throwing screen simulates: the NPC,
//! sockballs in flight and score popups. The host calls `update` once per
//! rendered frame and drains events afterwards.

use glam::Vec2;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::boundary::BoundaryGuardian;
use super::catch_zone::{CatchTarget, CatchZoneResolver, ZoneOutcome};
use super::hit::{CatchResolution, HitResponseController, PointPopup};
use super::npc::{MotionParams, NpcController, NpcSetup, NpcState};
use super::projectile::{Flight, Projectile, ProjectileSimulator};
use super::rng::{MotionRng, seeded};
use super::state::{CoreEvent, MissReason, NpcLifecycle};
use crate::clamp_dt;
use crate::consts::*;
use crate::error::CoreError;
use crate::tuning::{ArenaConfig, DifficultyProfile, LevelConfig, LevelTable};

/// Input commands for a single frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Aim point of a throw made this frame (pointer, touch or reticle)
    pub throw_target: Option<Vec2>,
    /// Throw a cosmetic bonus sockball instead of a counted one
    pub bonus: bool,
}

/// Serializable view of a session, for debugging and replay checks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub level_index: Option<usize>,
    pub difficulty: DifficultyProfile,
    pub time_ticks: u64,
    pub npc: NpcState,
    pub projectiles: Vec<Projectile>,
    pub popups: Vec<PointPopup>,
    pub available_sockballs: u32,
    pub time_remaining_ms: f32,
}

/// The throwing screen's simulation core
pub struct ThrowingSession<R: MotionRng = Pcg32> {
    rng: R,
    arena: ArenaConfig,
    levels: LevelTable,
    level_index: Option<usize>,
    level: LevelConfig,
    /// Difficulty with the level's own multipliers folded in
    difficulty: DifficultyProfile,
    npc: NpcController,
    simulator: ProjectileSimulator,
    hits: HitResponseController,
    projectiles: Vec<Projectile>,
    popups: Vec<PointPopup>,
    available_sockballs: u32,
    time_remaining_ms: f32,
    events: Vec<CoreEvent>,
    next_projectile_id: u32,
    time_ticks: u64,
}

impl ThrowingSession<Pcg32> {
    /// Session with a seeded PCG generator
    pub fn new(arena: ArenaConfig, levels: LevelTable, seed: u64) -> Self {
        Self::with_rng(arena, levels, seeded(seed))
    }
}

impl<R: MotionRng> ThrowingSession<R> {
    pub fn with_rng(arena: ArenaConfig, levels: LevelTable, rng: R) -> Self {
        let guardian = BoundaryGuardian::new(arena.restricted_zone);
        Self {
            rng,
            npc: NpcController::new(arena.bounds, guardian),
            simulator: ProjectileSimulator::new(arena.bounds),
            arena,
            levels,
            level_index: None,
            level: LevelConfig::default(),
            difficulty: DifficultyProfile::default(),
            hits: HitResponseController::default(),
            projectiles: Vec::new(),
            popups: Vec::new(),
            available_sockballs: 0,
            time_remaining_ms: 0.0,
            events: Vec::new(),
            next_projectile_id: 1,
            time_ticks: 0,
        }
    }

    /// Reset all core state for `level_index` at New Game+ `tier`.
    /// An unknown level leaves the session untouched.
    pub fn setup(&mut self, level_index: usize, tier: u8) -> Result<(), CoreError> {
        let level = match self.levels.get(level_index) {
            Ok(level) => level.clone(),
            Err(err) => {
                log::warn!("Level setup ignored: {err}");
                return Err(err);
            }
        };
        let base = DifficultyProfile::for_tier(tier);
        let difficulty = level.resolve(&base);

        let setup = NpcSetup {
            motion: MotionParams {
                base_speed: level.base_speed * difficulty.speed_multiplier,
                time_multiplier: level.time_multiplier,
                available_patterns: level.available_patterns.clone(),
            },
            wanted: level.wanted_hit_count,
            size: difficulty.npc_size(),
            nominal_half_width: NPC_NOMINAL_WIDTH * 0.5,
        };
        self.npc.setup(setup, &mut self.rng);

        self.projectiles.clear();
        self.popups.clear();
        self.events.clear();
        self.available_sockballs = level.sockballs;
        self.time_remaining_ms = level.time_limit(&base);
        self.time_ticks = 0;
        self.level_index = Some(level_index);
        self.difficulty = difficulty;

        log::info!(
            "Level {} \"{}\" (tier {}): want {}, {} sockballs, {:.0}s",
            level_index,
            level.name,
            difficulty.tier,
            level.wanted_hit_count,
            level.sockballs,
            self.time_remaining_ms / 1000.0
        );
        self.level = level;
        Ok(())
    }

    /// Re-run setup for the current level
    pub fn restart(&mut self) -> Result<(), CoreError> {
        match self.level_index {
            Some(index) => self.setup(index, self.difficulty.tier),
            None => {
                log::warn!("Restart requested before any level was set up");
                Err(CoreError::InvalidLevel {
                    index: 0,
                    available: self.levels.len(),
                })
            }
        }
    }

    /// Throw a counted sockball at `target`. Returns the projectile id.
    pub fn throw_at(&mut self, target: Vec2) -> Result<u32, CoreError> {
        if self.available_sockballs == 0 {
            return Err(CoreError::NoAmmo);
        }
        let id = self.launch(target, false)?;
        self.available_sockballs -= 1;
        Ok(id)
    }

    /// Throw a cosmetic sockball that never counts toward the quota
    pub fn throw_bonus_at(&mut self, target: Vec2) -> Result<u32, CoreError> {
        self.launch(target, true)
    }

    fn launch(&mut self, target: Vec2, bonus: bool) -> Result<u32, CoreError> {
        let id = self.next_projectile_id;
        let mut projectile =
            match Projectile::aimed(id, self.arena.launch_point, target, self.arena.launch_speed) {
                Ok(p) => p,
                Err(err) => {
                    log::warn!("Throw rejected: {err}");
                    return Err(err);
                }
            };
        projectile.bonus = bonus;
        self.next_projectile_id += 1;
        self.projectiles.push(projectile);
        Ok(id)
    }

    /// Advance the whole core by one frame. Returns the catches confirmed this frame.
    pub fn update(&mut self, dt_ms: f32) -> Vec<CatchResolution> {
        let dt = clamp_dt(dt_ms);
        self.time_ticks += 1;

        if self.npc.state.lifecycle.is_confined() {
            self.time_remaining_ms = (self.time_remaining_ms - dt).max(0.0);
        }

        self.npc.update(dt, &mut self.rng, &mut self.events);

        let mut catches = Vec::new();
        for projectile in self.projectiles.iter_mut() {
            let miss = match self.simulator.step(projectile, dt) {
                Flight::FellOut => Some(MissReason::FellOut),
                Flight::Expired => Some(MissReason::Expired),
                Flight::Airborne => {
                    let target = CatchTarget {
                        center: self.npc.state.center(),
                        nominal_half_width: self.npc.state.nominal_half_width,
                        catchable: self.npc.state.is_catchable(),
                    };
                    match CatchZoneResolver::evaluate(projectile, &target, &self.difficulty) {
                        ZoneOutcome::Caught(quality) => {
                            let resolution = self.hits.on_catch(
                                &mut self.npc,
                                projectile.id,
                                projectile.pos,
                                quality,
                                projectile.bonus,
                                &mut self.events,
                            );
                            self.popups.push(resolution.popup.clone());
                            catches.push(resolution);
                            None
                        }
                        ZoneOutcome::Escaped => Some(MissReason::LeftZone),
                        ZoneOutcome::Outside | ZoneOutcome::InZone(_) => None,
                    }
                }
            };

            if let Some(reason) = miss {
                if projectile.retire() {
                    log::debug!("Sockball #{} missed ({reason:?})", projectile.id);
                    self.events.push(CoreEvent::ProjectileMissed {
                        projectile_id: projectile.id,
                        reason,
                    });
                }
            }
        }
        self.projectiles.retain(|p| p.active);
        self.popups.retain_mut(|popup| popup.tick(dt));

        catches
    }

    /// Send the NPC off screen (quota met or out of sockballs)
    pub fn start_exit(&mut self, success: bool) -> Result<(), CoreError> {
        self.npc
            .start_exit(success, &mut self.rng, &mut self.events)
            .inspect_err(|err| log::warn!("Exit ignored: {err}"))
    }

    /// Bring the NPC back (more sockballs available)
    pub fn start_enter(&mut self) -> Result<(), CoreError> {
        self.npc
            .start_enter()
            .inspect_err(|err| log::warn!("Enter ignored: {err}"))
    }

    pub fn add_sockballs(&mut self, count: u32) {
        self.available_sockballs = self.available_sockballs.saturating_add(count);
    }

    /// Take every event emitted since the last drain, in order
    pub fn drain_events(&mut self) -> Vec<CoreEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn npc(&self) -> &NpcState {
        &self.npc.state
    }

    pub fn npc_position(&self) -> Vec2 {
        self.npc.state.position
    }

    pub fn npc_size(&self) -> Vec2 {
        self.npc.state.size
    }

    pub fn lifecycle(&self) -> NpcLifecycle {
        self.npc.state.lifecycle
    }

    pub fn collected_count(&self) -> u32 {
        self.npc.state.collected
    }

    pub fn wanted_count(&self) -> u32 {
        self.npc.state.wanted
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn popups(&self) -> &[PointPopup] {
        &self.popups
    }

    pub fn available_sockballs(&self) -> u32 {
        self.available_sockballs
    }

    pub fn level(&self) -> &LevelConfig {
        &self.level
    }

    pub fn level_index(&self) -> Option<usize> {
        self.level_index
    }

    pub fn difficulty(&self) -> &DifficultyProfile {
        &self.difficulty
    }

    pub fn arena(&self) -> &ArenaConfig {
        &self.arena
    }

    pub fn time_remaining_ms(&self) -> f32 {
        self.time_remaining_ms
    }

    pub fn time_expired(&self) -> bool {
        self.level_index.is_some() && self.time_remaining_ms <= 0.0
    }

    pub fn quota_met(&self) -> bool {
        self.npc.state.quota_met()
    }

    /// No sockballs in hand and none left in flight
    pub fn out_of_ammo(&self) -> bool {
        self.available_sockballs == 0 && self.projectiles.is_empty()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            level_index: self.level_index,
            difficulty: self.difficulty,
            time_ticks: self.time_ticks,
            npc: self.npc.state.clone(),
            projectiles: self.projectiles.clone(),
            popups: self.popups.clone(),
            available_sockballs: self.available_sockballs,
            time_remaining_ms: self.time_remaining_ms,
        }
    }
}

/// Apply one frame of input and advance the session
pub fn tick<R: MotionRng>(
    session: &mut ThrowingSession<R>,
    input: &TickInput,
    dt_ms: f32,
) -> Vec<CatchResolution> {
    if let Some(target) = input.throw_target {
        let thrown = if input.bonus {
            session.throw_bonus_at(target)
        } else {
            session.throw_at(target)
        };
        if let Err(err) = thrown {
            log::debug!("Frame throw dropped: {err}");
        }
    }
    session.update(dt_ms)
}
