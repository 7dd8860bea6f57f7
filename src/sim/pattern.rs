//! Motion patterns for the roaming NPC
//!
//! Every pattern produces a raw direction (an axis, a tangent, the derivative
//! of a parametric curve) which is then rescaled so the returned velocity
//! always has magnitude `base_speed * pattern_speed * time_multiplier`.
//! Pattern-specific working data lives in `PatternMemory`, one variant per
//! pattern, rebuilt from scratch on every switch.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::rng::MotionRng;
use crate::consts::*;
use crate::{wrap_phase, with_magnitude};

/// Circle/spiral radius floor used for angular rate (avoids huge spins near center)
const MIN_ORBIT_RADIUS: f32 = 20.0;
/// Parametric phase advance per nominal frame
const FIGURE_EIGHT_RATE: f32 = 0.03;
const ZIGZAG_RATE: f32 = 0.05;
const WAVE_RATE: f32 = 0.04;
const SPIRAL_BREATH_RATE: f32 = 0.015;
/// Vertical share of zigzag / wave motion relative to the forward axis
const ZIGZAG_SLOPE: f32 = 0.8;
const WAVE_AMPLITUDE: f32 = 0.75;
/// How strongly the spiral drifts in and out relative to its orbit
const SPIRAL_RADIAL_SHARE: f32 = 0.5;
/// Square side length as a share of the smaller arena dimension
const SQUARE_SIDE_SHARE: f32 = 0.3;
const MIN_SQUARE_SIDE: f32 = 40.0;

/// Motion pattern kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MotionPattern {
    Horizontal,
    Vertical,
    Diagonal,
    Circular,
    Random,
    FigureEight,
    Zigzag,
    Spiral,
    Wave,
    Square,
    Bounce,
}

impl MotionPattern {
    pub const ALL: [MotionPattern; 11] = [
        MotionPattern::Horizontal,
        MotionPattern::Vertical,
        MotionPattern::Diagonal,
        MotionPattern::Circular,
        MotionPattern::Random,
        MotionPattern::FigureEight,
        MotionPattern::Zigzag,
        MotionPattern::Spiral,
        MotionPattern::Wave,
        MotionPattern::Square,
        MotionPattern::Bounce,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MotionPattern::Horizontal => "horizontal",
            MotionPattern::Vertical => "vertical",
            MotionPattern::Diagonal => "diagonal",
            MotionPattern::Circular => "circular",
            MotionPattern::Random => "random",
            MotionPattern::FigureEight => "figure-eight",
            MotionPattern::Zigzag => "zigzag",
            MotionPattern::Spiral => "spiral",
            MotionPattern::Wave => "wave",
            MotionPattern::Square => "square",
            MotionPattern::Bounce => "bounce",
        }
    }

    /// Speed multiplier applied on top of the level base speed
    pub fn speed_multiplier(&self) -> f32 {
        match self {
            MotionPattern::Horizontal | MotionPattern::Vertical => 1.0,
            MotionPattern::Diagonal => 1.1,
            MotionPattern::Circular => 1.2,
            MotionPattern::Random => 1.0,
            MotionPattern::FigureEight => 1.3,
            MotionPattern::Zigzag => 1.4,
            MotionPattern::Spiral => 1.2,
            MotionPattern::Wave => 1.1,
            MotionPattern::Square => 1.0,
            MotionPattern::Bounce => 1.6,
        }
    }

    /// Minimum |vx| before the sprite is allowed to turn around.
    /// Curved patterns spend a lot of time near vx = 0, so they get a wider band.
    pub fn facing_deadzone(&self) -> f32 {
        match self {
            MotionPattern::Circular | MotionPattern::Spiral | MotionPattern::FigureEight => 0.5,
            MotionPattern::Zigzag | MotionPattern::Wave | MotionPattern::Random => 0.3,
            _ => 0.1,
        }
    }
}

/// Where the NPC is when a pattern starts
#[derive(Debug, Clone, Copy)]
pub struct PatternStart {
    pub npc_center: Vec2,
    pub arena_center: Vec2,
    pub arena_size: Vec2,
    /// Travel direction sign (+1 / -1)
    pub direction: f32,
}

/// Pattern-specific working data. A variant is only ever read by its own pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PatternMemory {
    /// Horizontal and vertical need nothing beyond the direction sign
    Axis { vertical: bool },
    Diagonal { heading: Vec2 },
    Circular { center: Vec2, radius: f32, angle: f32 },
    Random { heading: Vec2 },
    FigureEight { phase: f32 },
    Zigzag { phase: f32 },
    Spiral { center: Vec2, radius: f32, angle: f32, breath: f32 },
    Wave { phase: f32 },
    Square { side: u8, progress: f32, side_length: f32 },
    Bounce { heading: Vec2 },
}

impl PatternMemory {
    /// Fresh memory for `pattern`, seeded from the NPC's current placement
    pub fn start<R: MotionRng + ?Sized>(
        pattern: MotionPattern,
        at: &PatternStart,
        rng: &mut R,
    ) -> Self {
        let offset = at.npc_center - at.arena_center;
        // Current polar placement around the arena center, so orbits begin where the NPC is
        let radius = offset.length();
        let angle = if radius > f32::EPSILON {
            wrap_phase(offset.y.atan2(offset.x))
        } else {
            0.0
        };

        match pattern {
            MotionPattern::Horizontal => PatternMemory::Axis { vertical: false },
            MotionPattern::Vertical => PatternMemory::Axis { vertical: true },
            MotionPattern::Diagonal => PatternMemory::Diagonal {
                heading: Vec2::new(at.direction, rng.sign()).normalize(),
            },
            MotionPattern::Circular => PatternMemory::Circular {
                center: at.arena_center,
                radius,
                angle,
            },
            MotionPattern::Random => {
                let a = rng.angle();
                PatternMemory::Random {
                    heading: Vec2::new(a.cos(), a.sin()),
                }
            }
            MotionPattern::FigureEight => PatternMemory::FigureEight { phase: 0.0 },
            MotionPattern::Zigzag => PatternMemory::Zigzag { phase: 0.0 },
            MotionPattern::Spiral => PatternMemory::Spiral {
                center: at.arena_center,
                radius,
                angle,
                breath: 0.0,
            },
            MotionPattern::Wave => PatternMemory::Wave { phase: 0.0 },
            MotionPattern::Square => PatternMemory::Square {
                side: 0,
                progress: 0.0,
                side_length: (at.arena_size.min_element() * SQUARE_SIDE_SHARE)
                    .max(MIN_SQUARE_SIDE),
            },
            MotionPattern::Bounce => PatternMemory::Bounce {
                heading: Vec2::new(at.direction, rng.sign()).normalize(),
            },
        }
    }

    /// Which pattern owns this memory
    pub fn pattern(&self) -> MotionPattern {
        match self {
            PatternMemory::Axis { vertical: false } => MotionPattern::Horizontal,
            PatternMemory::Axis { vertical: true } => MotionPattern::Vertical,
            PatternMemory::Diagonal { .. } => MotionPattern::Diagonal,
            PatternMemory::Circular { .. } => MotionPattern::Circular,
            PatternMemory::Random { .. } => MotionPattern::Random,
            PatternMemory::FigureEight { .. } => MotionPattern::FigureEight,
            PatternMemory::Zigzag { .. } => MotionPattern::Zigzag,
            PatternMemory::Spiral { .. } => MotionPattern::Spiral,
            PatternMemory::Wave { .. } => MotionPattern::Wave,
            PatternMemory::Square { .. } => MotionPattern::Square,
            PatternMemory::Bounce { .. } => MotionPattern::Bounce,
        }
    }

    /// Mirror a stored heading after a wall bounce. No-op for patterns without one.
    pub fn reflect(&mut self, flip_x: bool, flip_y: bool) {
        if let PatternMemory::Bounce { heading } = self {
            if flip_x {
                heading.x = -heading.x;
            }
            if flip_y {
                heading.y = -heading.y;
            }
        }
    }
}

/// Speed and timing inputs for one evaluation
#[derive(Debug, Clone, Copy)]
pub struct MotionInput {
    /// Level base speed, already scaled by level and difficulty speed multipliers
    pub base_speed: f32,
    pub pattern_speed: f32,
    pub time_multiplier: f32,
    /// Travel direction sign (+1 / -1)
    pub direction: f32,
    /// Elapsed time in nominal frames
    pub scale: f32,
}

impl MotionInput {
    /// Required velocity magnitude for this tick
    pub fn target_speed(&self) -> f32 {
        let speed = self.base_speed * self.pattern_speed * self.time_multiplier;
        if speed.is_finite() {
            speed.clamp(0.0, MAX_NPC_SPEED)
        } else {
            0.0
        }
    }
}

/// Pure velocity generator: (memory, input) → velocity, advancing the memory's phase
pub struct MotionPatternEngine;

impl MotionPatternEngine {
    pub fn evaluate<R: MotionRng + ?Sized>(
        memory: &mut PatternMemory,
        input: &MotionInput,
        rng: &mut R,
    ) -> Vec2 {
        let speed = input.target_speed();
        let dir = if input.direction < 0.0 { -1.0 } else { 1.0 };
        let fallback = Vec2::new(dir, 0.0);

        let raw = match memory {
            PatternMemory::Axis { vertical } => {
                if *vertical {
                    Vec2::new(0.0, dir)
                } else {
                    Vec2::new(dir, 0.0)
                }
            }

            PatternMemory::Diagonal { heading } | PatternMemory::Bounce { heading } => *heading,

            PatternMemory::Circular { radius, angle, .. } => {
                let orbit = radius.max(MIN_ORBIT_RADIUS);
                *angle = wrap_phase(*angle + dir * speed * input.scale / orbit);
                Vec2::new(-angle.sin(), angle.cos()) * dir
            }

            PatternMemory::Random { heading } => {
                if rng.chance(RANDOM_REROLL_CHANCE) {
                    let a = rng.angle();
                    *heading = Vec2::new(a.cos(), a.sin());
                }
                *heading
            }

            PatternMemory::FigureEight { phase } => {
                *phase = wrap_phase(*phase + FIGURE_EIGHT_RATE * input.scale);
                // d/dt [sin t, sin(2t)/2]
                Vec2::new(phase.cos() * dir, (2.0 * *phase).cos())
            }

            PatternMemory::Zigzag { phase } => {
                *phase = wrap_phase(*phase + ZIGZAG_RATE * input.scale);
                // Triangle wave: constant slope whose sign follows the carrier
                let slope = if phase.sin() >= 0.0 { ZIGZAG_SLOPE } else { -ZIGZAG_SLOPE };
                Vec2::new(dir, slope)
            }

            PatternMemory::Spiral {
                radius,
                angle,
                breath,
                ..
            } => {
                let orbit = radius.max(MIN_ORBIT_RADIUS);
                *angle = wrap_phase(*angle + dir * speed * input.scale / orbit);
                *breath = wrap_phase(*breath + SPIRAL_BREATH_RATE * input.scale);
                let radial_rate = breath.sin() * SPIRAL_RADIAL_SHARE;
                *radius = (*radius + radial_rate * speed * input.scale).max(0.0);
                let radial = Vec2::new(angle.cos(), angle.sin());
                let tangent = Vec2::new(-angle.sin(), angle.cos()) * dir;
                tangent + radial * radial_rate
            }

            PatternMemory::Wave { phase } => {
                *phase = wrap_phase(*phase + WAVE_RATE * input.scale);
                // d/dt sin(t)
                Vec2::new(dir, phase.cos() * WAVE_AMPLITUDE)
            }

            PatternMemory::Square {
                side,
                progress,
                side_length,
            } => {
                let raw = square_side(*side, dir);
                *progress += speed * input.scale;
                let length = side_length.max(MIN_SQUARE_SIDE);
                while *progress >= length {
                    *progress -= length;
                    *side = (*side + 1) % 4;
                }
                raw
            }
        };

        with_magnitude(raw, speed, fallback)
    }
}

/// Square traversal leg. Reversed direction walks the square the other way round.
fn square_side(side: u8, dir: f32) -> Vec2 {
    let legs = [Vec2::X, Vec2::Y, Vec2::NEG_X, Vec2::NEG_Y];
    let leg = legs[(side % 4) as usize];
    if dir < 0.0 { Vec2::new(-leg.x, leg.y) } else { leg }
}
