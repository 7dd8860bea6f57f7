//! What happens to the NPC when she catches a sockball
//!
//! Counts the catch, knocks her back along the ball's exit direction (harder
//! against a wall, hardest in a corner where she is also forced into a
//! recovery) and builds the popup the renderer floats over her head.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::boundary::EdgeContact;
use super::catch_zone::CatchZone;
use super::npc::{NpcController, NpcState, Recovery};
use super::state::{CoreEvent, RecoveryCause};
use crate::consts::*;

/// Transient score text for the rendering layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointPopup {
    pub text: String,
    /// 0xRRGGBB
    pub color: u32,
    pub position: Vec2,
    pub remaining_ms: f32,
    pub duration_ms: f32,
}

impl PointPopup {
    pub fn for_catch(quality: CatchZone, bonus: bool, position: Vec2) -> Self {
        let (text, color) = if bonus {
            ("Bonus!", 0xF48FB1)
        } else {
            match quality {
                CatchZone::Perfect => ("Perfect!", 0xFFD54F),
                CatchZone::Good => ("Good!", 0x81C784),
                CatchZone::Regular | CatchZone::None => ("Nice", 0xFFFFFF),
            }
        };
        Self {
            text: text.to_string(),
            color,
            position,
            remaining_ms: POPUP_DURATION_MS,
            duration_ms: POPUP_DURATION_MS,
        }
    }

    /// Count down; false once expired
    pub fn tick(&mut self, dt_ms: f32) -> bool {
        self.remaining_ms = (self.remaining_ms - dt_ms).max(0.0);
        self.remaining_ms > 0.0
    }

    /// Fade factor 1 → 0 over the popup's life
    pub fn alpha(&self) -> f32 {
        if self.duration_ms <= 0.0 {
            0.0
        } else {
            self.remaining_ms / self.duration_ms
        }
    }
}

/// Everything the host needs for scoring one catch
#[derive(Debug, Clone, PartialEq)]
pub struct CatchResolution {
    pub quality: CatchZone,
    pub collected: u32,
    pub bonus: bool,
    pub popup: PointPopup,
    pub forced_recovery: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HitResponseController {
    pub knockback_base: f32,
    pub wall_amplify: f32,
    pub corner_amplify: f32,
    pub max_knockback: f32,
}

impl Default for HitResponseController {
    fn default() -> Self {
        Self {
            knockback_base: KNOCKBACK_BASE,
            wall_amplify: KNOCKBACK_WALL_AMPLIFY,
            corner_amplify: KNOCKBACK_CORNER_AMPLIFY,
            max_knockback: MAX_KNOCKBACK,
        }
    }
}

impl HitResponseController {
    /// Apply a confirmed catch to the NPC
    pub fn on_catch(
        &self,
        npc: &mut NpcController,
        projectile_id: u32,
        ball_pos: Vec2,
        quality: CatchZone,
        bonus: bool,
        events: &mut Vec<CoreEvent>,
    ) -> CatchResolution {
        // Bonus catches are cosmetic and leave the NPC alone
        let cornered = if bonus {
            None
        } else {
            npc.state.collected += 1;
            let (knockback, cornered) = self.knockback(&npc.state, ball_pos);
            npc.state.knockback = (npc.state.knockback + knockback).clamp_length_max(self.max_knockback);
            cornered
        };

        events.push(CoreEvent::Catch {
            projectile_id,
            quality,
            collected: npc.state.collected,
            bonus,
            at: ball_pos,
        });

        let forced_recovery = cornered.is_some();
        if let Some(away) = cornered {
            npc.start_recovery(
                Recovery::new(away, HIT_CORNER_RECOVERY_MULTIPLIER, RecoveryCause::HitCornered),
                events,
            );
        }

        log::debug!(
            "Catch #{projectile_id} {} (collected {}/{}, bonus={bonus})",
            quality.as_str(),
            npc.state.collected,
            npc.state.wanted
        );

        let popup_at = Vec2::new(npc.state.center().x, npc.state.position.y);
        CatchResolution {
            quality,
            collected: npc.state.collected,
            bonus,
            popup: PointPopup::for_catch(quality, bonus, popup_at),
            forced_recovery,
        }
    }

    /// Knockback for a catch at `ball_pos`, plus the away-from-corner heading
    /// when the NPC is cornered
    pub fn knockback(&self, npc: &NpcState, ball_pos: Vec2) -> (Vec2, Option<Vec2>) {
        let dir = (ball_pos - npc.center()).try_normalize().unwrap_or(Vec2::NEG_Y);
        let mut knockback = dir * self.knockback_base;

        let near = EdgeContact::near(&npc.bounds, npc.position, npc.size, npc.nominal_half_width);
        let away = near.away();

        if near.is_corner() {
            let knockback = away.normalize() * self.knockback_base * self.corner_amplify;
            return (knockback.clamp_length_max(self.max_knockback), Some(away));
        }

        // Off a single wall the perpendicular component springs back out
        if near.horizontal.is_some() {
            knockback.x = away.x * knockback.x.abs() * self.wall_amplify;
        } else if near.vertical.is_some() {
            knockback.y = away.y * knockback.y.abs() * self.wall_amplify;
        }

        (knockback.clamp_length_max(self.max_knockback), None)
    }
}
