//! Arena bounds, restricted zone and wall/corner handling
//!
//! The guardian looks at where the pattern wants to take the NPC this tick.
//! Corners win over edges. Non-bounce patterns are pulled off the wall with a
//! timed recovery; the bounce pattern just mirrors its heading.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::npc::{NpcState, Recovery};
use super::pattern::MotionPattern;
use super::state::{Edge, RecoveryCause};
use crate::consts::*;

/// Share of the along-wall axis in an edge recovery heading
const EDGE_RECOVERY_ALONG: f32 = 0.5;

/// Axis-aligned arena rectangle (screen coordinates, y down)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Bounds {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width(), self.height())
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.left + self.right) * 0.5,
            (self.top + self.bottom) * 0.5,
        )
    }

    /// Largest valid top-left corner for a box of `size`
    pub fn max_position(&self, size: Vec2) -> Vec2 {
        Vec2::new(
            (self.right - size.x).max(self.left),
            (self.bottom - size.y).max(self.top),
        )
    }

    /// Clamp a box's top-left corner so the box stays inside
    pub fn clamp_position(&self, position: Vec2, size: Vec2) -> Vec2 {
        position.clamp(Vec2::new(self.left, self.top), self.max_position(size))
    }

    pub fn contains_box(&self, position: Vec2, size: Vec2) -> bool {
        let max = self.max_position(size);
        position.x >= self.left && position.x <= max.x && position.y >= self.top && position.y <= max.y
    }
}

/// Soft no-go area around the throwing corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RestrictedZone {
    pub center: Vec2,
    pub radius: f32,
    /// Velocity correction per tick, in px per nominal frame
    pub push: f32,
}

impl RestrictedZone {
    /// Extra velocity pushing the NPC back out, when it is heading into the zone.
    /// Added to a per-frame velocity, so it is not scaled by dt.
    pub fn push_for(&self, npc_center: Vec2, velocity: Vec2) -> Vec2 {
        let to_zone = self.center - npc_center;
        let dist = to_zone.length();
        if dist >= self.radius || velocity.dot(to_zone) <= 0.0 {
            return Vec2::ZERO;
        }
        let away = (-to_zone).try_normalize().unwrap_or(Vec2::NEG_Y);
        away * self.push
    }
}

/// Which edges a box touches or crosses
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EdgeContact {
    pub horizontal: Option<Edge>,
    pub vertical: Option<Edge>,
}

impl EdgeContact {
    /// Strict crossing test for a proposed position
    pub fn crossing(bounds: &Bounds, position: Vec2, size: Vec2) -> Self {
        let max = bounds.max_position(size);
        Self {
            horizontal: if position.x < bounds.left {
                Some(Edge::Left)
            } else if position.x > max.x {
                Some(Edge::Right)
            } else {
                None
            },
            vertical: if position.y < bounds.top {
                Some(Edge::Top)
            } else if position.y > max.y {
                Some(Edge::Bottom)
            } else {
                None
            },
        }
    }

    /// Proximity test: within `threshold` of an edge
    pub fn near(bounds: &Bounds, position: Vec2, size: Vec2, threshold: f32) -> Self {
        let max = bounds.max_position(size);
        Self {
            horizontal: if position.x - bounds.left <= threshold {
                Some(Edge::Left)
            } else if max.x - position.x <= threshold {
                Some(Edge::Right)
            } else {
                None
            },
            vertical: if position.y - bounds.top <= threshold {
                Some(Edge::Top)
            } else if max.y - position.y <= threshold {
                Some(Edge::Bottom)
            } else {
                None
            },
        }
    }

    pub fn is_corner(&self) -> bool {
        self.horizontal.is_some() && self.vertical.is_some()
    }

    pub fn any(&self) -> bool {
        self.horizontal.is_some() || self.vertical.is_some()
    }

    /// Unit-axis signs pointing back into the arena (0 on untouched axes)
    pub fn away(&self) -> Vec2 {
        Vec2::new(
            match self.horizontal {
                Some(Edge::Left) => 1.0,
                Some(Edge::Right) => -1.0,
                _ => 0.0,
            },
            match self.vertical {
                Some(Edge::Top) => 1.0,
                Some(Edge::Bottom) => -1.0,
                _ => 0.0,
            },
        )
    }
}

/// What the guardian did this tick
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryEffect {
    None,
    /// Bounce pattern mirrored off a wall
    Bounced { flip_x: bool, flip_y: bool },
    /// Pattern suspended; the NPC is being extracted
    Recovery(Recovery),
}

/// Result of guarding one proposed move
#[derive(Debug, Clone, PartialEq)]
pub struct GuardOutcome {
    pub velocity: Vec2,
    /// Resolved position for this tick (snapped on contact)
    pub position: Vec2,
    pub effect: BoundaryEffect,
}

/// Edge/corner avoidance and the soft restricted zone
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundaryGuardian {
    pub restricted_zone: Option<RestrictedZone>,
    pub edge_threshold: f32,
    pub min_speed: f32,
}

impl Default for BoundaryGuardian {
    fn default() -> Self {
        Self {
            restricted_zone: None,
            edge_threshold: EDGE_THRESHOLD,
            min_speed: MIN_NPC_SPEED,
        }
    }
}

impl BoundaryGuardian {
    pub fn new(restricted_zone: Option<RestrictedZone>) -> Self {
        Self {
            restricted_zone,
            ..Self::default()
        }
    }

    /// Guard a proposed pattern velocity for an on-screen NPC
    pub fn apply(&self, npc: &mut NpcState, proposed: Vec2, scale: f32) -> GuardOutcome {
        let push = self
            .restricted_zone
            .map_or(Vec2::ZERO, |zone| zone.push_for(npc.center(), proposed));
        let mut velocity = proposed + push;

        let next = npc.position + velocity * scale;
        let contact = EdgeContact::crossing(&npc.bounds, next, npc.size);
        let bounce = npc.current_pattern == MotionPattern::Bounce;

        if contact.is_corner() {
            let position = snap(&npc.bounds, next, npc.size, &contact);
            let away = contact.away();
            if bounce {
                let flip_x = velocity.x * away.x < 0.0;
                let flip_y = velocity.y * away.y < 0.0;
                npc.memory.reflect(flip_x, flip_y);
                velocity = Vec2::new(away.x * velocity.x.abs(), away.y * velocity.y.abs());
                return GuardOutcome {
                    velocity,
                    position,
                    effect: BoundaryEffect::Bounced { flip_x, flip_y },
                };
            }
            let recovery = Recovery::new(away, CORNER_RECOVERY_MULTIPLIER, RecoveryCause::Corner);
            return GuardOutcome {
                velocity: recovery.velocity(npc.base_speed()),
                position,
                effect: BoundaryEffect::Recovery(recovery),
            };
        }

        if contact.any() {
            let position = snap(&npc.bounds, next, npc.size, &contact);
            let away = contact.away();
            if bounce {
                let flip_x = contact.horizontal.is_some() && velocity.x * away.x < 0.0;
                let flip_y = contact.vertical.is_some() && velocity.y * away.y < 0.0;
                npc.memory.reflect(flip_x, flip_y);
                if flip_x {
                    velocity.x = -velocity.x;
                }
                if flip_y {
                    velocity.y = -velocity.y;
                }
                return GuardOutcome {
                    velocity,
                    position,
                    effect: BoundaryEffect::Bounced { flip_x, flip_y },
                };
            }
            let edge = contact.horizontal.or(contact.vertical).unwrap_or(Edge::Left);
            let direction = edge_recovery_direction(&npc.bounds, npc.center(), edge);
            let recovery =
                Recovery::new(direction, EDGE_RECOVERY_MULTIPLIER, RecoveryCause::Edge(edge));
            return GuardOutcome {
                velocity: recovery.velocity(npc.base_speed()),
                position,
                effect: BoundaryEffect::Recovery(recovery),
            };
        }

        // Stalled in open space: nudge back into motion. A zone push is allowed to slow the NPC.
        let near = EdgeContact::near(&npc.bounds, npc.position, npc.size, self.edge_threshold);
        if push == Vec2::ZERO && proposed.length() < self.min_speed && !near.any() {
            velocity = Vec2::new(npc.direction.signum(), 0.0) * self.min_speed;
            return GuardOutcome {
                velocity,
                position: npc.position + velocity * scale,
                effect: BoundaryEffect::None,
            };
        }

        GuardOutcome {
            velocity,
            position: next,
            effect: BoundaryEffect::None,
        }
    }
}

/// Clamp only the axes in contact; the free axis keeps its proposed value
fn snap(bounds: &Bounds, next: Vec2, size: Vec2, contact: &EdgeContact) -> Vec2 {
    let max = bounds.max_position(size);
    let mut position = next;
    match contact.horizontal {
        Some(Edge::Left) => position.x = bounds.left,
        Some(Edge::Right) => position.x = max.x,
        _ => {}
    }
    match contact.vertical {
        Some(Edge::Top) => position.y = bounds.top,
        Some(Edge::Bottom) => position.y = max.y,
        _ => {}
    }
    bounds.clamp_position(position, size)
}

/// Away from the wall, drifting toward the midline of the other axis so the
/// NPC doesn't slide into a corner or straight across into the opposite wall
pub fn edge_recovery_direction(bounds: &Bounds, npc_center: Vec2, edge: Edge) -> Vec2 {
    let mid = bounds.center();
    let toward_mid_x = if npc_center.x < mid.x { 1.0 } else { -1.0 };
    let toward_mid_y = if npc_center.y < mid.y { 1.0 } else { -1.0 };
    match edge {
        Edge::Left => Vec2::new(1.0, toward_mid_y * EDGE_RECOVERY_ALONG),
        Edge::Right => Vec2::new(-1.0, toward_mid_y * EDGE_RECOVERY_ALONG),
        Edge::Top => Vec2::new(toward_mid_x * EDGE_RECOVERY_ALONG, 1.0),
        Edge::Bottom => Vec2::new(toward_mid_x * EDGE_RECOVERY_ALONG, -1.0),
    }
}
