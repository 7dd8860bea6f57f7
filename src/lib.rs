//! Sockball core - the throwing-screen simulation of a sock-matching arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (NPC motion, projectiles, catch zones)
//! - `tuning`: Data-driven level and difficulty balance
//! - `schedule`: Host-owned cancellable delayed tasks
//! - `error`: Recoverable core faults

pub mod error;
pub mod schedule;
pub mod sim;
pub mod tuning;

pub use error::CoreError;
pub use sim::ThrowingSession;
pub use tuning::{ArenaConfig, DifficultyProfile, LevelConfig, LevelTable};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Nominal frame interval; velocities are expressed per nominal frame
    pub const NOMINAL_FRAME_MS: f32 = 16.67;
    /// Largest dt accepted by a single update (3 nominal frames)
    pub const MAX_DT_MS: f32 = NOMINAL_FRAME_MS * 3.0;

    /// On-screen time between scheduled pattern switches
    pub const PATTERN_SWITCH_INTERVAL_MS: f32 = 9000.0;
    /// A pattern may not repeat more than this many times in a row
    pub const MAX_CONSECUTIVE_PATTERNS: usize = 2;
    /// Pattern history ring buffer length
    pub const PATTERN_HISTORY_LEN: usize = 10;
    /// Per-tick chance the random pattern picks a new heading
    pub const RANDOM_REROLL_CHANCE: f64 = 0.004;

    /// Minimum time between facing flips
    pub const FACING_COOLDOWN_MS: f32 = 200.0;

    /// Recovery (wall/corner extraction) timing and speed
    pub const RECOVERY_DURATION_MS: f32 = 1000.0;
    pub const EDGE_RECOVERY_MULTIPLIER: f32 = 2.0;
    pub const CORNER_RECOVERY_MULTIPLIER: f32 = 3.0;
    pub const HIT_CORNER_RECOVERY_MULTIPLIER: f32 = 4.0;

    /// Below this speed the NPC is nudged back into motion (away from edges)
    pub const MIN_NPC_SPEED: f32 = 1.0;
    /// Distance from an edge inside which the minimum-speed nudge is skipped
    pub const EDGE_THRESHOLD: f32 = 10.0;
    /// Hard cap on NPC velocity magnitude (px per nominal frame)
    pub const MAX_NPC_SPEED: f32 = 40.0;

    /// Restricted zone around the launch corner
    pub const RESTRICTED_ZONE_RADIUS: f32 = 160.0;
    /// Velocity correction applied each tick while heading into the restricted zone
    pub const RESTRICTED_ZONE_PUSH: f32 = 0.35;

    /// Exit/enter walk speed, independent of difficulty
    pub const EXIT_SPEED: f32 = 6.0;
    /// Distance inside the canvas edge where an entering NPC stops
    pub const ENTER_INSET: f32 = 40.0;

    /// Nominal NPC sprite width before difficulty scaling
    pub const NPC_NOMINAL_WIDTH: f32 = 100.0;

    /// Knockback applied on a confirmed catch
    pub const KNOCKBACK_BASE: f32 = 8.0;
    pub const KNOCKBACK_DECAY: f32 = 0.9;
    pub const KNOCKBACK_WALL_AMPLIFY: f32 = 2.5;
    pub const KNOCKBACK_CORNER_AMPLIFY: f32 = 3.0;
    pub const MAX_KNOCKBACK: f32 = 30.0;
    /// Knockback below this length is dropped
    pub const KNOCKBACK_EPSILON: f32 = 0.01;

    /// Sockball defaults
    pub const SOCKBALL_RADIUS: f32 = 12.0;
    pub const LAUNCH_SPEED: f32 = 18.0;
    pub const SOCKBALL_GRAVITY: f32 = 0.25;
    pub const BOUNCE_DAMPING: f32 = 0.7;
    pub const MAX_PROJECTILE_SPEED: f32 = 60.0;
    pub const PROJECTILE_LIFETIME_MS: f32 = 8000.0;
    /// Throws shorter than this are rejected
    pub const MIN_THROW_DISTANCE: f32 = 0.001;

    /// Catch zone geometry (multiples of the NPC nominal half-width)
    pub const CATCH_RADIUS_MULTIPLIER: f32 = 2.6;
    pub const PERFECT_ZONE: f32 = 0.6;
    pub const GOOD_ZONE: f32 = 1.2;

    /// Point popup lifetime
    pub const POPUP_DURATION_MS: f32 = 1000.0;
}

/// Wrap a phase angle to [0, 2π)
#[inline]
pub fn wrap_phase(phase: f32) -> f32 {
    let wrapped = phase.rem_euclid(std::f32::consts::TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= std::f32::consts::TAU { 0.0 } else { wrapped }
}

/// Scale `raw` to `magnitude`, using `fallback` when `raw` has no direction
#[inline]
pub fn with_magnitude(raw: Vec2, magnitude: f32, fallback: Vec2) -> Vec2 {
    let dir = raw.try_normalize().or_else(|| fallback.try_normalize()).unwrap_or(Vec2::X);
    dir * magnitude
}

/// Convert a millisecond delta into nominal-frame units
#[inline]
pub fn frame_scale(dt_ms: f32) -> f32 {
    dt_ms / consts::NOMINAL_FRAME_MS
}

/// Sanitize a host-supplied delta time (non-finite → 0, clamp to [0, MAX_DT_MS])
#[inline]
pub fn clamp_dt(dt_ms: f32) -> f32 {
    if dt_ms.is_finite() {
        dt_ms.clamp(0.0, consts::MAX_DT_MS)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_phase() {
        use std::f32::consts::{PI, TAU};
        assert!((wrap_phase(TAU + 0.5) - 0.5).abs() < 1e-5);
        assert!((wrap_phase(-PI) - PI).abs() < 1e-5);
        assert!(wrap_phase(-1e-9) < TAU);
    }

    #[test]
    fn test_with_magnitude_falls_back() {
        let v = with_magnitude(Vec2::ZERO, 3.0, Vec2::new(-1.0, 0.0));
        assert_eq!(v, Vec2::new(-3.0, 0.0));
        let v = with_magnitude(Vec2::new(3.0, 4.0), 10.0, Vec2::X);
        assert!((v - Vec2::new(6.0, 8.0)).length() < 1e-5);
    }

    #[test]
    fn test_clamp_dt() {
        assert_eq!(clamp_dt(f32::NAN), 0.0);
        assert_eq!(clamp_dt(-5.0), 0.0);
        assert_eq!(clamp_dt(1000.0), consts::MAX_DT_MS);
        assert_eq!(clamp_dt(16.0), 16.0);
    }
}
