//! Catch-zone grading with approach/recede hysteresis
//!
//! A sockball is graded by the best band it reaches around the NPC, but a
//! catch is only confirmed on the first tick its distance starts growing
//! again. That keeps a fast ball from being credited mid-approach and makes
//! a second confirmation impossible.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::projectile::Projectile;
use crate::consts::*;
use crate::tuning::DifficultyProfile;

/// Concentric quality bands. Ordering is the ranking: Perfect > Good > Regular > None.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum CatchZone {
    #[default]
    None,
    Regular,
    Good,
    Perfect,
}

impl CatchZone {
    /// Grade a distance expressed in NPC half-widths
    pub fn classify(normalized_distance: f32) -> Self {
        if normalized_distance <= PERFECT_ZONE {
            CatchZone::Perfect
        } else if normalized_distance <= GOOD_ZONE {
            CatchZone::Good
        } else {
            CatchZone::Regular
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CatchZone::None => "none",
            CatchZone::Regular => "regular",
            CatchZone::Good => "good",
            CatchZone::Perfect => "perfect",
        }
    }
}

/// What happened to one sockball this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoneOutcome {
    /// Not near the NPC
    Outside,
    /// Inside the acceptance radius, still closing in
    InZone(CatchZone),
    /// Confirmed catch with the best band reached
    Caught(CatchZone),
    /// Entered the zone earlier and has now left it uncaught
    Escaped,
}

/// NPC-side inputs to an evaluation
#[derive(Debug, Clone, Copy)]
pub struct CatchTarget {
    pub center: Vec2,
    /// Configured (not difficulty-scaled) half-width
    pub nominal_half_width: f32,
    /// Whether a catch may be confirmed right now
    pub catchable: bool,
}

pub struct CatchZoneResolver;

impl CatchZoneResolver {
    /// Outer radius inside which a ball counts as "in zone"
    pub fn acceptance_radius(nominal_half_width: f32, difficulty: &DifficultyProfile) -> f32 {
        nominal_half_width * CATCH_RADIUS_MULTIPLIER * difficulty.catch_radius_multiplier
    }

    /// Grade and possibly confirm one sockball. Marks it inactive on a catch.
    pub fn evaluate(
        projectile: &mut Projectile,
        target: &CatchTarget,
        difficulty: &DifficultyProfile,
    ) -> ZoneOutcome {
        if !projectile.active || target.nominal_half_width <= 0.0 {
            return ZoneOutcome::Outside;
        }

        let distance = projectile.pos.distance(target.center);
        let acceptance = Self::acceptance_radius(target.nominal_half_width, difficulty);
        let inside = distance <= acceptance + projectile.radius;

        if inside {
            projectile.entered_zone = true;
            let zone = CatchZone::classify(distance / target.nominal_half_width);
            if zone > projectile.best_zone {
                projectile.best_zone = zone;
            }
        }

        let receding = projectile
            .previous_distance
            .is_some_and(|previous| distance > previous);
        projectile.previous_distance = Some(distance);

        if target.catchable && receding && projectile.best_zone != CatchZone::None {
            projectile.active = false;
            return ZoneOutcome::Caught(projectile.best_zone);
        }

        if inside {
            ZoneOutcome::InZone(projectile.best_zone)
        } else if projectile.entered_zone {
            ZoneOutcome::Escaped
        } else {
            ZoneOutcome::Outside
        }
    }
}
