//! The roaming NPC ("Martha") and her lifecycle
//!
//! `NpcController::update` runs once per frame: scheduler → pattern engine →
//! boundary guardian while on screen, the recovery override while pinned,
//! and a fixed-speed walk while exiting or entering.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::boundary::{BoundaryEffect, BoundaryGuardian, Bounds};
use super::pattern::{MotionInput, MotionPattern, MotionPatternEngine, PatternMemory, PatternStart};
use super::rng::MotionRng;
use super::scheduler::PatternScheduler;
use super::state::{CoreEvent, Facing, NpcLifecycle, RecoveryCause};
use crate::consts::*;
use crate::error::CoreError;
use crate::{frame_scale, with_magnitude};

/// Timed extraction from a wall or corner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recovery {
    /// Heading away from the wall (not necessarily unit length)
    pub direction: Vec2,
    pub elapsed_ms: f32,
    pub duration_ms: f32,
    pub speed_multiplier: f32,
    pub cause: RecoveryCause,
}

impl Recovery {
    pub fn new(direction: Vec2, speed_multiplier: f32, cause: RecoveryCause) -> Self {
        Self {
            direction,
            elapsed_ms: 0.0,
            duration_ms: RECOVERY_DURATION_MS,
            speed_multiplier,
            cause,
        }
    }

    pub fn velocity(&self, base_speed: f32) -> Vec2 {
        let speed = (base_speed * self.speed_multiplier).clamp(0.0, MAX_NPC_SPEED);
        with_magnitude(self.direction, speed, Vec2::X)
    }

    pub fn finished(&self) -> bool {
        self.elapsed_ms >= self.duration_ms
    }
}

/// Speed inputs fixed for a level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionParams {
    /// Level base speed × level and difficulty speed multipliers
    pub base_speed: f32,
    pub time_multiplier: f32,
    pub available_patterns: Vec<MotionPattern>,
}

impl Default for MotionParams {
    fn default() -> Self {
        Self {
            base_speed: 2.0,
            time_multiplier: 1.0,
            available_patterns: vec![MotionPattern::Horizontal],
        }
    }
}

/// Level setup for the NPC
#[derive(Debug, Clone)]
pub struct NpcSetup {
    pub motion: MotionParams,
    pub wanted: u32,
    /// Rendered sprite size (difficulty-scaled)
    pub size: Vec2,
    /// Configured half-width used for catch grading
    pub nominal_half_width: f32,
}

/// Which way the NPC leaves / comes back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn sign(&self) -> f32 {
        match self {
            Side::Left => -1.0,
            Side::Right => 1.0,
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpcState {
    /// Top-left corner of the sprite box
    pub position: Vec2,
    pub size: Vec2,
    pub nominal_half_width: f32,
    pub velocity: Vec2,
    pub current_pattern: MotionPattern,
    pub memory: PatternMemory,
    /// Travel direction sign (+1 / -1)
    pub direction: f32,
    pub facing: Facing,
    pub last_facing_flip_ms: Option<f32>,
    /// Time accumulated across updates
    pub clock_ms: f32,
    pub bounds: Bounds,
    pub lifecycle: NpcLifecycle,
    pub recovery: Option<Recovery>,
    /// Residual hit displacement per nominal frame
    pub knockback: Vec2,
    pub collected: u32,
    pub wanted: u32,
    pub scheduler: PatternScheduler,
    pub motion: MotionParams,
    /// Side the NPC walked off through
    pub exit_side: Option<Side>,
    /// Side the NPC is walking in from
    pub enter_side: Option<Side>,
    pub success_sound_played: bool,
    pub failure_sound_played: bool,
}

impl NpcState {
    pub fn new(bounds: Bounds) -> Self {
        let size = Vec2::new(NPC_NOMINAL_WIDTH, NPC_NOMINAL_WIDTH * 1.3);
        Self {
            position: bounds.center() - size * 0.5,
            size,
            nominal_half_width: NPC_NOMINAL_WIDTH * 0.5,
            velocity: Vec2::ZERO,
            current_pattern: MotionPattern::Horizontal,
            memory: PatternMemory::Axis { vertical: false },
            direction: 1.0,
            facing: Facing::Right,
            last_facing_flip_ms: None,
            clock_ms: 0.0,
            bounds,
            lifecycle: NpcLifecycle::OnScreen,
            recovery: None,
            knockback: Vec2::ZERO,
            collected: 0,
            wanted: 0,
            scheduler: PatternScheduler::new(),
            motion: MotionParams::default(),
            exit_side: None,
            enter_side: None,
            success_sound_played: false,
            failure_sound_played: false,
        }
    }

    pub fn center(&self) -> Vec2 {
        self.position + self.size * 0.5
    }

    /// Recovery / exit speed basis (pattern multiplier excluded)
    pub fn base_speed(&self) -> f32 {
        self.motion.base_speed * self.motion.time_multiplier
    }

    /// Whether sockballs can currently be caught
    pub fn is_catchable(&self) -> bool {
        self.lifecycle.is_confined()
    }

    pub fn quota_met(&self) -> bool {
        self.wanted > 0 && self.collected >= self.wanted
    }

    fn pattern_start(&self) -> PatternStart {
        PatternStart {
            npc_center: self.center(),
            arena_center: self.bounds.center(),
            arena_size: self.bounds.size(),
            direction: self.direction,
        }
    }
}

/// Drives the NPC state machine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpcController {
    pub state: NpcState,
    pub guardian: BoundaryGuardian,
}

impl NpcController {
    pub fn new(bounds: Bounds, guardian: BoundaryGuardian) -> Self {
        Self {
            state: NpcState::new(bounds),
            guardian,
        }
    }

    /// Full reset for a (re)started level
    pub fn setup<R: MotionRng + ?Sized>(&mut self, setup: NpcSetup, rng: &mut R) {
        let bounds = self.state.bounds;
        let mut state = NpcState::new(bounds);
        state.size = setup.size;
        state.nominal_half_width = setup.nominal_half_width;
        state.position = bounds.clamp_position(bounds.center() - setup.size * 0.5, setup.size);
        state.wanted = setup.wanted;
        state.motion = setup.motion;
        if state.motion.available_patterns.is_empty() {
            log::warn!("Level has no motion patterns; holding default horizontal motion");
        }
        self.state = state;
        self.begin_pattern(rng);
        log::info!(
            "NPC setup: {}x{} at ({:.0}, {:.0}), pattern {}, wanted {}",
            self.state.size.x,
            self.state.size.y,
            self.state.position.x,
            self.state.position.y,
            self.state.current_pattern.as_str(),
            self.state.wanted
        );
    }

    /// Advance the NPC by `dt_ms` (already clamped by the caller)
    pub fn update<R: MotionRng + ?Sized>(
        &mut self,
        dt_ms: f32,
        rng: &mut R,
        events: &mut Vec<CoreEvent>,
    ) {
        let scale = frame_scale(dt_ms);
        self.state.clock_ms += dt_ms;

        match self.state.lifecycle {
            NpcLifecycle::OnScreen => self.update_on_screen(dt_ms, scale, rng, events),
            NpcLifecycle::Recovering => self.update_recovering(dt_ms, scale, rng, events),
            NpcLifecycle::Exiting => self.update_exiting(scale),
            NpcLifecycle::Entering => self.update_entering(scale, rng, events),
            NpcLifecycle::OffScreen => {
                self.state.velocity = Vec2::ZERO;
            }
        }

        if self.state.lifecycle.is_confined() {
            self.apply_knockback(scale);
            let s = &mut self.state;
            s.position = s.bounds.clamp_position(s.position, s.size);
        }

        self.update_facing();
    }

    fn update_on_screen<R: MotionRng + ?Sized>(
        &mut self,
        dt_ms: f32,
        scale: f32,
        rng: &mut R,
        events: &mut Vec<CoreEvent>,
    ) {
        if self.state.scheduler.tick(dt_ms) {
            self.switch_pattern(rng, events);
        }

        let input = MotionInput {
            base_speed: self.state.motion.base_speed,
            pattern_speed: self.state.current_pattern.speed_multiplier(),
            time_multiplier: self.state.motion.time_multiplier,
            direction: self.state.direction,
            scale,
        };
        let proposed = MotionPatternEngine::evaluate(&mut self.state.memory, &input, rng);
        let outcome = self.guardian.apply(&mut self.state, proposed, scale);

        self.state.position = outcome.position;
        self.state.velocity = outcome.velocity.clamp_length_max(MAX_NPC_SPEED);

        match outcome.effect {
            BoundaryEffect::Recovery(recovery) => self.start_recovery(recovery, events),
            BoundaryEffect::Bounced { flip_x, flip_y } => {
                log::trace!("Bounce off wall (flip_x={flip_x}, flip_y={flip_y})");
            }
            BoundaryEffect::None => {}
        }
    }

    fn update_recovering<R: MotionRng + ?Sized>(
        &mut self,
        dt_ms: f32,
        scale: f32,
        rng: &mut R,
        events: &mut Vec<CoreEvent>,
    ) {
        let base = self.state.base_speed();
        let Some(recovery) = self.state.recovery.as_mut() else {
            self.state.lifecycle = NpcLifecycle::OnScreen;
            return;
        };
        recovery.elapsed_ms += dt_ms;
        let velocity = recovery.velocity(base);
        let finished = recovery.finished();

        self.state.velocity = velocity;
        self.state.position += velocity * scale;

        if finished {
            log::debug!("Recovery finished");
            self.state.recovery = None;
            self.state.lifecycle = NpcLifecycle::OnScreen;
            self.switch_pattern(rng, events);
        }
    }

    fn update_exiting(&mut self, scale: f32) {
        let side = self.state.exit_side.unwrap_or(Side::Right);
        self.state.velocity = Vec2::new(side.sign() * EXIT_SPEED, 0.0);
        self.state.position += self.state.velocity * scale;

        let s = &self.state;
        let gone = match side {
            Side::Right => s.position.x >= s.bounds.right,
            Side::Left => s.position.x + s.size.x <= s.bounds.left,
        };
        if gone {
            log::info!("NPC off screen ({side:?})");
            self.state.lifecycle = NpcLifecycle::OffScreen;
            self.state.velocity = Vec2::ZERO;
        }
    }

    fn update_entering<R: MotionRng + ?Sized>(
        &mut self,
        scale: f32,
        rng: &mut R,
        events: &mut Vec<CoreEvent>,
    ) {
        let side = self.state.enter_side.unwrap_or(Side::Left);
        let target_x = self.enter_target_x(side);
        // Walking in from `side` means heading toward the opposite one
        let heading = side.opposite().sign();
        self.state.velocity = Vec2::new(heading * EXIT_SPEED, 0.0);
        self.state.position += self.state.velocity * scale;

        let arrived = match side {
            Side::Left => self.state.position.x >= target_x,
            Side::Right => self.state.position.x <= target_x,
        };
        if arrived {
            self.state.position.x = target_x;
            self.state.position = self.state.bounds.clamp_position(self.state.position, self.state.size);
            self.state.lifecycle = NpcLifecycle::OnScreen;
            self.state.enter_side = None;
            log::info!("NPC back on screen");
            events.push(CoreEvent::EnterCompleted);
            self.switch_pattern(rng, events);
        }
    }

    fn enter_target_x(&self, side: Side) -> f32 {
        let s = &self.state;
        let max = s.bounds.max_position(s.size);
        match side {
            Side::Left => (s.bounds.left + ENTER_INSET).min(max.x),
            Side::Right => (max.x - ENTER_INSET).max(s.bounds.left),
        }
    }

    /// Suspend the pattern and start extracting the NPC
    pub fn start_recovery(&mut self, recovery: Recovery, events: &mut Vec<CoreEvent>) {
        log::debug!(
            "Recovery {:?} x{} heading ({:.1}, {:.1})",
            recovery.cause,
            recovery.speed_multiplier,
            recovery.direction.x,
            recovery.direction.y
        );
        events.push(CoreEvent::RecoveryStarted {
            cause: recovery.cause,
            speed_multiplier: recovery.speed_multiplier,
        });
        self.state.velocity = recovery.velocity(self.state.base_speed());
        self.state.recovery = Some(recovery);
        self.state.lifecycle = NpcLifecycle::Recovering;
    }

    /// Pick a new pattern, wipe pattern memory and re-roll the direction
    pub fn switch_pattern<R: MotionRng + ?Sized>(&mut self, rng: &mut R, events: &mut Vec<CoreEvent>) {
        let from = self.state.current_pattern;
        if self.begin_pattern(rng) {
            let to = self.state.current_pattern;
            log::debug!("Pattern {} -> {}", from.as_str(), to.as_str());
            events.push(CoreEvent::PatternChanged { from, to });
        }
    }

    fn begin_pattern<R: MotionRng + ?Sized>(&mut self, rng: &mut R) -> bool {
        let s = &mut self.state;
        let Some(next) = s.scheduler.choose(&s.motion.available_patterns, rng) else {
            s.scheduler.elapsed_ms = 0.0;
            return false;
        };
        s.current_pattern = next;
        s.direction = rng.sign();
        s.memory = PatternMemory::start(next, &s.pattern_start(), rng);
        true
    }

    /// Begin walking off the canvas (quota met or out of sockballs)
    pub fn start_exit<R: MotionRng + ?Sized>(
        &mut self,
        success: bool,
        rng: &mut R,
        events: &mut Vec<CoreEvent>,
    ) -> Result<(), CoreError> {
        if !self.state.lifecycle.is_confined() {
            return Err(CoreError::InvalidTransition {
                action: "exit",
                state: self.state.lifecycle.as_str(),
            });
        }
        let side = if rng.chance(0.5) { Side::Right } else { Side::Left };
        let s = &mut self.state;
        s.exit_side = Some(side);
        s.recovery = None;
        s.knockback = Vec2::ZERO;
        s.lifecycle = NpcLifecycle::Exiting;

        let flag = if success {
            &mut s.success_sound_played
        } else {
            &mut s.failure_sound_played
        };
        let play_sound = !*flag;
        *flag = true;

        log::info!("NPC exiting {side:?} (success={success})");
        events.push(CoreEvent::ExitStarted { success, play_sound });
        Ok(())
    }

    /// Walk back in through the side the NPC left by
    pub fn start_enter(&mut self) -> Result<(), CoreError> {
        if self.state.lifecycle != NpcLifecycle::OffScreen {
            return Err(CoreError::InvalidTransition {
                action: "enter",
                state: self.state.lifecycle.as_str(),
            });
        }
        let side = self.state.exit_side.unwrap_or(Side::Right);
        let s = &mut self.state;
        s.enter_side = Some(side);
        s.position.x = match side {
            Side::Right => s.bounds.right,
            Side::Left => s.bounds.left - s.size.x,
        };
        let max = s.bounds.max_position(s.size);
        s.position.y = s.position.y.clamp(s.bounds.top, max.y);
        s.lifecycle = NpcLifecycle::Entering;
        log::info!("NPC entering from {side:?}");
        Ok(())
    }

    fn apply_knockback(&mut self, scale: f32) {
        let s = &mut self.state;
        if s.knockback == Vec2::ZERO {
            return;
        }
        // Recovery owns the motion; the knock still fades meanwhile
        if s.lifecycle != NpcLifecycle::Recovering {
            s.position += s.knockback * scale;
        }
        s.knockback *= KNOCKBACK_DECAY.powf(scale);
        if s.knockback.length() < KNOCKBACK_EPSILON {
            s.knockback = Vec2::ZERO;
        }
    }

    fn update_facing(&mut self) {
        let s = &mut self.state;
        let deadzone = match s.lifecycle {
            NpcLifecycle::OnScreen => s.current_pattern.facing_deadzone(),
            _ => MotionPattern::Horizontal.facing_deadzone(),
        };
        if s.velocity.x.abs() <= deadzone {
            return;
        }
        let wanted = if s.velocity.x > 0.0 { Facing::Right } else { Facing::Left };
        if wanted == s.facing {
            return;
        }
        let cooled = s
            .last_facing_flip_ms
            .is_none_or(|at| s.clock_ms - at >= FACING_COOLDOWN_MS);
        if cooled {
            s.facing = wanted;
            s.last_facing_flip_ms = Some(s.clock_ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::rng::seeded;
    use crate::sim::state::Edge;

    fn controller(patterns: Vec<MotionPattern>) -> (NpcController, rand_pcg::Pcg32) {
        let mut rng = seeded(21);
        let mut npc = NpcController::new(Bounds::new(0.0, 0.0, 800.0, 600.0), BoundaryGuardian::default());
        npc.setup(
            NpcSetup {
                motion: MotionParams {
                    base_speed: 2.0,
                    time_multiplier: 1.0,
                    available_patterns: patterns,
                },
                wanted: 3,
                size: Vec2::new(100.0, 130.0),
                nominal_half_width: 50.0,
            },
            &mut rng,
        );
        (npc, rng)
    }

    #[test]
    fn test_setup_centers_npc() {
        let (npc, _) = controller(vec![MotionPattern::Circular]);
        assert_eq!(npc.state.center(), Vec2::new(400.0, 300.0));
        assert_eq!(npc.state.lifecycle, NpcLifecycle::OnScreen);
        assert_eq!(npc.state.current_pattern, MotionPattern::Circular);
        assert_eq!(npc.state.scheduler.history().len(), 1);
    }

    #[test]
    fn test_edge_hit_starts_recovery() {
        let (mut npc, mut rng) = controller(vec![MotionPattern::Horizontal]);
        npc.state.direction = -1.0;
        npc.state.position = Vec2::new(1.0, 200.0);
        let mut events = Vec::new();
        npc.update(NOMINAL_FRAME_MS, &mut rng, &mut events);
        assert_eq!(npc.state.lifecycle, NpcLifecycle::Recovering);
        assert_eq!(npc.state.position.x, 0.0);
        let recovery = npc.state.recovery.clone().unwrap();
        assert_eq!(recovery.cause, RecoveryCause::Edge(Edge::Left));
        assert_eq!(recovery.speed_multiplier, EDGE_RECOVERY_MULTIPLIER);
        assert_eq!(recovery.direction, Vec2::new(1.0, 0.5));
    }

    #[test]
    fn test_recovery_completes_and_switches_pattern() {
        let (mut npc, mut rng) = controller(vec![MotionPattern::Horizontal, MotionPattern::Wave]);
        let mut events = Vec::new();
        npc.start_recovery(
            Recovery::new(Vec2::new(1.0, 0.0), 2.0, RecoveryCause::Edge(Edge::Left)),
            &mut events,
        );
        let before = npc.state.scheduler.history().len();
        for _ in 0..70 {
            npc.update(NOMINAL_FRAME_MS, &mut rng, &mut events);
        }
        assert_eq!(npc.state.lifecycle, NpcLifecycle::OnScreen);
        assert!(npc.state.recovery.is_none());
        assert!(npc.state.scheduler.history().len() > before);
    }

    #[test]
    fn test_exit_and_enter_round_trip() {
        let (mut npc, mut rng) = controller(vec![MotionPattern::Horizontal]);
        let mut events = Vec::new();
        npc.start_exit(true, &mut rng, &mut events).unwrap();
        assert!(npc.start_exit(true, &mut rng, &mut events).is_err());
        for _ in 0..400 {
            npc.update(NOMINAL_FRAME_MS, &mut rng, &mut events);
        }
        assert_eq!(npc.state.lifecycle, NpcLifecycle::OffScreen);
        let exit_side = npc.state.exit_side.unwrap();

        npc.start_enter().unwrap();
        for _ in 0..400 {
            npc.update(NOMINAL_FRAME_MS, &mut rng, &mut events);
            if npc.state.lifecycle != NpcLifecycle::Entering {
                break;
            }
        }
        assert!(npc.state.lifecycle.is_confined());
        assert!(events.contains(&CoreEvent::EnterCompleted));
        // Came back through the side it left by
        let near_left = npc.state.position.x < 400.0;
        assert_eq!(near_left, exit_side == Side::Left);
    }

    #[test]
    fn test_exit_sound_once_per_outcome() {
        let (mut npc, mut rng) = controller(vec![MotionPattern::Horizontal]);
        let mut events = Vec::new();
        npc.start_exit(false, &mut rng, &mut events).unwrap();
        npc.state.lifecycle = NpcLifecycle::OnScreen;
        npc.start_exit(false, &mut rng, &mut events).unwrap();
        npc.state.lifecycle = NpcLifecycle::OnScreen;
        npc.start_exit(true, &mut rng, &mut events).unwrap();
        let sounds: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                CoreEvent::ExitStarted { success, play_sound } => Some((*success, *play_sound)),
                _ => None,
            })
            .collect();
        assert_eq!(sounds, vec![(false, true), (false, false), (true, true)]);
    }

    #[test]
    fn test_facing_flip_cooldown() {
        let (mut npc, _) = controller(vec![MotionPattern::Horizontal]);
        npc.state.clock_ms = 1000.0;
        npc.state.velocity = Vec2::new(-2.0, 0.0);
        npc.update_facing();
        assert_eq!(npc.state.facing, Facing::Left);

        npc.state.clock_ms = 1100.0;
        npc.state.velocity = Vec2::new(2.0, 0.0);
        npc.update_facing();
        assert_eq!(npc.state.facing, Facing::Left);

        npc.state.clock_ms = 1200.0;
        npc.update_facing();
        assert_eq!(npc.state.facing, Facing::Right);
    }

    #[test]
    fn test_facing_ignores_deadzone() {
        let (mut npc, _) = controller(vec![MotionPattern::Circular]);
        npc.state.velocity = Vec2::new(-0.4, 3.0);
        npc.update_facing();
        assert_eq!(npc.state.facing, Facing::Right);
    }

    #[test]
    fn test_knockback_suppressed_while_recovering() {
        let (mut npc, mut rng) = controller(vec![MotionPattern::Horizontal]);
        let mut events = Vec::new();
        npc.start_recovery(
            Recovery::new(Vec2::new(0.0, 1.0), 2.0, RecoveryCause::Corner),
            &mut events,
        );
        npc.state.knockback = Vec2::new(20.0, 0.0);
        let x = npc.state.position.x;
        npc.update(NOMINAL_FRAME_MS, &mut rng, &mut events);
        assert!((npc.state.position.x - x).abs() < 1e-4);
        assert!(npc.state.knockback.x < 20.0);
    }

    #[test]
    fn test_knockback_moves_and_decays_on_screen() {
        let (mut npc, mut rng) = controller(vec![MotionPattern::Horizontal]);
        npc.state.direction = 1.0;
        npc.state.memory = PatternMemory::Axis { vertical: false };
        npc.state.knockback = Vec2::new(10.0, 0.0);
        let mut events = Vec::new();

        let x = npc.state.position.x;
        npc.update(NOMINAL_FRAME_MS, &mut rng, &mut events);
        // Pattern step (2 px) plus the knock
        assert!((npc.state.position.x - x - 12.0).abs() < 1e-3);
        assert!((npc.state.knockback.x - 10.0 * KNOCKBACK_DECAY).abs() < 1e-4);

        npc.update(NOMINAL_FRAME_MS, &mut rng, &mut events);
        assert!((npc.state.knockback.x - 10.0 * KNOCKBACK_DECAY * KNOCKBACK_DECAY).abs() < 1e-4);
    }

    #[test]
    fn test_no_patterns_holds_default_motion() {
        let (mut npc, mut rng) = controller(Vec::new());
        assert_eq!(npc.state.current_pattern, MotionPattern::Horizontal);
        let mut events = Vec::new();
        npc.update(NOMINAL_FRAME_MS, &mut rng, &mut events);
        assert!(npc.state.velocity.length() > 0.0);
        npc.switch_pattern(&mut rng, &mut events);
        assert!(events.is_empty());
    }
}
