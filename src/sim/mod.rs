//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Host-supplied dt only, clamped per frame
//! - Injected, seedable RNG only
//! - Stable iteration order (projectiles by throw order)
//! - No rendering, audio or platform dependencies

pub mod boundary;
pub mod catch_zone;
pub mod hit;
pub mod npc;
pub mod pattern;
pub mod projectile;
pub mod rng;
pub mod scheduler;
pub mod state;
pub mod tick;

pub use boundary::{BoundaryEffect, BoundaryGuardian, Bounds, EdgeContact, RestrictedZone};
pub use catch_zone::{CatchTarget, CatchZone, CatchZoneResolver, ZoneOutcome};
pub use hit::{CatchResolution, HitResponseController, PointPopup};
pub use npc::{MotionParams, NpcController, NpcSetup, NpcState, Recovery};
pub use pattern::{MotionInput, MotionPattern, MotionPatternEngine, PatternMemory};
pub use projectile::{Flight, Projectile, ProjectileSimulator};
pub use rng::{MotionRng, seeded};
pub use scheduler::PatternScheduler;
pub use state::{CoreEvent, Edge, Facing, MissReason, NpcLifecycle, RecoveryCause};
pub use tick::{SessionSnapshot, ThrowingSession, TickInput, tick};
