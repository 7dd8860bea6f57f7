//! Shared simulation enums and the events the core emits
//!
//! Events are collected in order during a single `update` and drained by the
//! host for audio, scoring, HUD and achievement side effects.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::catch_zone::CatchZone;
use super::pattern::MotionPattern;

/// NPC lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NpcLifecycle {
    /// Roaming under the active pattern
    OnScreen,
    /// Temporary extraction from a wall or corner
    Recovering,
    /// Walking off the canvas
    Exiting,
    /// Walking back in
    Entering,
    /// Waiting off the canvas
    OffScreen,
}

impl NpcLifecycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            NpcLifecycle::OnScreen => "on-screen",
            NpcLifecycle::Recovering => "recovering",
            NpcLifecycle::Exiting => "exiting",
            NpcLifecycle::Entering => "entering",
            NpcLifecycle::OffScreen => "off-screen",
        }
    }

    /// States in which the NPC must stay inside the arena
    pub fn is_confined(&self) -> bool {
        matches!(self, NpcLifecycle::OnScreen | NpcLifecycle::Recovering)
    }
}

/// Arena edges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

/// Why a recovery started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecoveryCause {
    Edge(Edge),
    Corner,
    /// Caught a sockball while pinned in a corner
    HitCornered,
}

/// Why a sockball was dropped without a catch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissReason {
    /// Fell past the bottom of the arena
    FellOut,
    /// Left the catch radius after entering it without being caught
    LeftZone,
    /// Outlived its flight time
    Expired,
}

/// Sprite facing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

/// Discrete events for the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CoreEvent {
    /// A sockball was caught. `collected` is the quota count after this catch.
    Catch {
        projectile_id: u32,
        quality: CatchZone,
        collected: u32,
        bonus: bool,
        at: Vec2,
    },
    /// The NPC began walking off. `play_sound` is set the first time each
    /// outcome happens after level setup.
    ExitStarted { success: bool, play_sound: bool },
    EnterCompleted,
    RecoveryStarted {
        cause: RecoveryCause,
        speed_multiplier: f32,
    },
    PatternChanged {
        from: MotionPattern,
        to: MotionPattern,
    },
    ProjectileMissed { projectile_id: u32, reason: MissReason },
}
