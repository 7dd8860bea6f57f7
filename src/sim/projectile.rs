//! Sockball flight
//!
//! Frame-rate independent Euler integration with gravity, damped bounces off
//! the side walls and ceiling, and removal once the ball drops out of the
//! arena or outlives its flight time.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::boundary::Bounds;
use super::catch_zone::CatchZone;
use crate::consts::*;
use crate::error::CoreError;
use crate::frame_scale;

/// A thrown sockball
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    pub pos: Vec2,
    /// Velocity per nominal frame
    pub vel: Vec2,
    pub radius: f32,
    pub gravity: f32,
    pub bounced: bool,
    pub active: bool,
    pub previous_distance: Option<f32>,
    pub entered_zone: bool,
    pub best_zone: CatchZone,
    /// Cosmetic throw that doesn't count toward the quota
    pub bonus: bool,
    pub age_ms: f32,
}

impl Projectile {
    pub fn new(id: u32, pos: Vec2, vel: Vec2) -> Self {
        Self {
            id,
            pos,
            vel: vel.clamp_length_max(MAX_PROJECTILE_SPEED),
            radius: SOCKBALL_RADIUS,
            gravity: SOCKBALL_GRAVITY,
            bounced: false,
            active: true,
            previous_distance: None,
            entered_zone: false,
            best_zone: CatchZone::None,
            bonus: false,
            age_ms: 0.0,
        }
    }

    /// Launch from `launch` toward `target` at `speed`.
    /// Rejects throws whose target coincides with the launch point.
    pub fn aimed(id: u32, launch: Vec2, target: Vec2, speed: f32) -> Result<Self, CoreError> {
        let delta = target - launch;
        if !delta.is_finite() || delta.length() < MIN_THROW_DISTANCE {
            return Err(CoreError::ZeroDistanceThrow);
        }
        Ok(Self::new(id, launch, delta.normalize() * speed))
    }

    /// Flip `active` off. Returns false if it was already off.
    pub fn retire(&mut self) -> bool {
        std::mem::replace(&mut self.active, false)
    }
}

/// Result of one integration step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flight {
    Airborne,
    FellOut,
    Expired,
}

/// Integrates sockballs inside an arena
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectileSimulator {
    pub bounds: Bounds,
    pub damping: f32,
    pub lifetime_ms: f32,
}

impl ProjectileSimulator {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            bounds,
            damping: BOUNCE_DAMPING,
            lifetime_ms: PROJECTILE_LIFETIME_MS,
        }
    }

    /// Advance one sockball by `dt_ms`
    pub fn step(&self, p: &mut Projectile, dt_ms: f32) -> Flight {
        if !p.active {
            return Flight::Airborne;
        }
        let scale = frame_scale(dt_ms);

        p.pos += p.vel * scale;
        p.vel.y += p.gravity * scale;

        let b = &self.bounds;
        if p.pos.x - p.radius < b.left {
            p.pos.x = b.left + p.radius;
            p.vel.x = p.vel.x.abs() * self.damping;
            p.bounced = true;
        } else if p.pos.x + p.radius > b.right {
            p.pos.x = b.right - p.radius;
            p.vel.x = -p.vel.x.abs() * self.damping;
            p.bounced = true;
        }
        if p.pos.y - p.radius < b.top {
            p.vel.y = p.vel.y.abs() * self.damping;
            p.bounced = true;
        }

        p.vel = p.vel.clamp_length_max(MAX_PROJECTILE_SPEED);
        p.age_ms += dt_ms;

        if p.pos.y > b.bottom + p.radius {
            Flight::FellOut
        } else if p.age_ms >= self.lifetime_ms {
            Flight::Expired
        } else {
            Flight::Airborne
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sim() -> ProjectileSimulator {
        ProjectileSimulator::new(Bounds::new(0.0, 0.0, 800.0, 600.0))
    }

    #[test]
    fn test_zero_distance_throw_rejected() {
        let at = Vec2::new(100.0, 500.0);
        assert!(matches!(
            Projectile::aimed(1, at, at, LAUNCH_SPEED),
            Err(CoreError::ZeroDistanceThrow)
        ));
        assert!(Projectile::aimed(1, at, Vec2::new(f32::NAN, 0.0), LAUNCH_SPEED).is_err());
    }

    #[test]
    fn test_aimed_velocity() {
        let p = Projectile::aimed(1, Vec2::ZERO, Vec2::new(3.0, -4.0), 10.0).unwrap();
        assert!((p.vel - Vec2::new(6.0, -8.0)).length() < 1e-5);
        assert!(p.active);
    }

    #[test]
    fn test_gravity_is_frame_rate_independent() {
        let sim = sim();
        let mut a = Projectile::new(1, Vec2::new(400.0, 100.0), Vec2::ZERO);
        let mut b = a.clone();
        sim.step(&mut a, NOMINAL_FRAME_MS * 2.0);
        sim.step(&mut b, NOMINAL_FRAME_MS);
        sim.step(&mut b, NOMINAL_FRAME_MS);
        assert!((a.vel.y - b.vel.y).abs() < 1e-5);
    }

    #[test]
    fn test_wall_bounce_damps() {
        let sim = sim();
        let mut p = Projectile::new(1, Vec2::new(790.0, 300.0), Vec2::new(10.0, 0.0));
        p.gravity = 0.0;
        sim.step(&mut p, NOMINAL_FRAME_MS);
        assert!(p.bounced);
        assert_eq!(p.pos.x, 800.0 - p.radius);
        assert!((p.vel.x + 10.0 * BOUNCE_DAMPING).abs() < 1e-5);
    }

    #[test]
    fn test_ceiling_reflects_vertical() {
        let sim = sim();
        let mut p = Projectile::new(1, Vec2::new(400.0, 15.0), Vec2::new(0.0, -10.0));
        p.gravity = 0.0;
        sim.step(&mut p, NOMINAL_FRAME_MS);
        assert!(p.vel.y > 0.0);
        assert!(p.bounced);
    }

    #[test]
    fn test_falls_out_and_expires() {
        let sim = sim();
        let mut p = Projectile::new(1, Vec2::new(400.0, 610.0), Vec2::new(0.0, 5.0));
        assert_eq!(sim.step(&mut p, NOMINAL_FRAME_MS), Flight::FellOut);

        let mut p = Projectile::new(2, Vec2::new(400.0, 300.0), Vec2::ZERO);
        p.gravity = 0.0;
        p.age_ms = PROJECTILE_LIFETIME_MS;
        assert_eq!(sim.step(&mut p, 1.0), Flight::Expired);
    }

    #[test]
    fn test_retire_once() {
        let mut p = Projectile::new(1, Vec2::ZERO, Vec2::X);
        assert!(p.retire());
        assert!(!p.retire());
    }

    #[test]
    fn test_extreme_velocity_clamped() {
        let p = Projectile::new(1, Vec2::ZERO, Vec2::new(1e9, 1e9));
        assert!(p.vel.length() <= MAX_PROJECTILE_SPEED + 1e-3);
    }
}
