//! Data-driven game balance
//!
//! Levels and arena layout are plain serde data so balance can be tweaked in
//! JSON without touching the simulation. Difficulty tiers ("New Game+") are a
//! fixed table of multipliers.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::CoreError;
use crate::sim::boundary::{Bounds, RestrictedZone};
use crate::sim::pattern::MotionPattern;

/// Highest New Game+ tier
pub const MAX_DIFFICULTY_TIER: u8 = 4;

/// Per-tier multipliers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyProfile {
    pub tier: u8,
    pub speed_multiplier: f32,
    pub time_limit_multiplier: f32,
    pub catch_radius_multiplier: f32,
    /// Rendered sprite width relative to the nominal width
    pub sprite_scale: f32,
    /// Sprite width / height of the art used at this tier
    pub sprite_aspect: f32,
}

impl DifficultyProfile {
    /// Profile for a tier; tiers above the table clamp to the hardest one
    pub fn for_tier(tier: u8) -> Self {
        if tier > MAX_DIFFICULTY_TIER {
            log::warn!("Difficulty tier {tier} out of range, using {MAX_DIFFICULTY_TIER}");
        }
        let tier = tier.min(MAX_DIFFICULTY_TIER);
        let (speed, time_limit, catch_radius, scale, aspect) = match tier {
            0 => (1.0, 1.0, 1.0, 1.0, 0.75),
            1 => (1.1, 0.95, 0.95, 0.95, 0.75),
            2 => (1.2, 0.9, 0.9, 0.9, 0.8),
            3 => (1.35, 0.85, 0.85, 0.85, 0.8),
            _ => (1.5, 0.8, 0.8, 0.8, 0.85),
        };
        Self {
            tier,
            speed_multiplier: speed,
            time_limit_multiplier: time_limit,
            catch_radius_multiplier: catch_radius,
            sprite_scale: scale,
            sprite_aspect: aspect,
        }
    }

    /// Rendered NPC size at this tier
    pub fn npc_size(&self) -> Vec2 {
        let width = NPC_NOMINAL_WIDTH * self.sprite_scale;
        Vec2::new(width, width / self.sprite_aspect.max(0.1))
    }
}

impl Default for DifficultyProfile {
    fn default() -> Self {
        Self::for_tier(0)
    }
}

/// One level's tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    pub name: String,
    /// NPC speed in px per nominal frame before multipliers
    pub base_speed: f32,
    pub available_patterns: Vec<MotionPattern>,
    pub wanted_hit_count: u32,
    pub speed_multiplier: f32,
    pub time_multiplier: f32,
    pub catch_radius_multiplier: f32,
    /// Sockballs available at level start
    pub sockballs: u32,
    pub time_limit_ms: f32,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            name: String::from("Level"),
            base_speed: 1.5,
            available_patterns: vec![MotionPattern::Horizontal],
            wanted_hit_count: 3,
            speed_multiplier: 1.0,
            time_multiplier: 1.0,
            catch_radius_multiplier: 1.0,
            sockballs: 6,
            time_limit_ms: 60_000.0,
        }
    }
}

impl LevelConfig {
    /// Fold the level's own multipliers into a difficulty profile
    pub fn resolve(&self, difficulty: &DifficultyProfile) -> DifficultyProfile {
        DifficultyProfile {
            speed_multiplier: difficulty.speed_multiplier * self.speed_multiplier,
            catch_radius_multiplier: difficulty.catch_radius_multiplier * self.catch_radius_multiplier,
            ..*difficulty
        }
    }

    /// Time limit after the difficulty multiplier
    pub fn time_limit(&self, difficulty: &DifficultyProfile) -> f32 {
        self.time_limit_ms * difficulty.time_limit_multiplier
    }
}

/// Ordered level list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelTable {
    pub levels: Vec<LevelConfig>,
}

impl LevelTable {
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let table: LevelTable = serde_json::from_str(json)?;
        log::info!("Loaded {} levels", table.levels.len());
        Ok(table)
    }

    pub fn to_json(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn get(&self, index: usize) -> Result<&LevelConfig, CoreError> {
        self.levels.get(index).ok_or(CoreError::InvalidLevel {
            index,
            available: self.levels.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

impl Default for LevelTable {
    /// Built-in progression: more patterns, more catches and a faster NPC each level
    fn default() -> Self {
        use MotionPattern::*;
        let level = |name: &str, base_speed: f32, patterns: &[MotionPattern], wanted: u32, sockballs: u32| {
            LevelConfig {
                name: name.to_string(),
                base_speed,
                available_patterns: patterns.to_vec(),
                wanted_hit_count: wanted,
                sockballs,
                ..LevelConfig::default()
            }
        };
        Self {
            levels: vec![
                level("Laundry Day", 1.0, &[Horizontal], 3, 6),
                level("Spin Cycle", 1.2, &[Horizontal, Vertical], 4, 7),
                level("Tumble Dry", 1.3, &[Horizontal, Diagonal, Circular], 5, 8),
                level("Lint Trap", 1.4, &[Circular, Wave, Zigzag], 6, 9),
                level("Static Cling", 1.5, &[Diagonal, Random, Bounce], 7, 10),
                level("Odd Sock Out", 1.5, &[FigureEight, Spiral, Square, Wave], 8, 11),
                level("Fold Frenzy", 1.6, &[Zigzag, Bounce, Random, Circular, Square], 9, 12),
                level("The Great Pairing", 1.8, &MotionPattern::ALL, 10, 14),
            ],
        }
    }
}

/// Arena layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub bounds: Bounds,
    /// Where sockballs leave the thrower's hand
    pub launch_point: Vec2,
    pub launch_speed: f32,
    /// Soft keep-out area around the throwing corner
    pub restricted_zone: Option<RestrictedZone>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        let bounds = Bounds::new(0.0, 0.0, 800.0, 600.0);
        Self {
            bounds,
            launch_point: Vec2::new(bounds.left + 60.0, bounds.bottom - 60.0),
            launch_speed: LAUNCH_SPEED,
            restricted_zone: Some(RestrictedZone {
                center: Vec2::new(bounds.left, bounds.bottom),
                radius: RESTRICTED_ZONE_RADIUS,
                push: RESTRICTED_ZONE_PUSH,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_table() {
        let top = DifficultyProfile::for_tier(4);
        assert_eq!(top.speed_multiplier, 1.5);
        assert_eq!(DifficultyProfile::for_tier(9), top);
        assert!(DifficultyProfile::for_tier(0).npc_size().x > top.npc_size().x);
    }

    #[test]
    fn test_level_multipliers_fold_in() {
        let level = LevelConfig {
            speed_multiplier: 2.0,
            catch_radius_multiplier: 0.5,
            ..LevelConfig::default()
        };
        let resolved = level.resolve(&DifficultyProfile::for_tier(4));
        assert_eq!(resolved.speed_multiplier, 3.0);
        assert_eq!(resolved.catch_radius_multiplier, 0.4);
        assert_eq!(level.time_limit(&DifficultyProfile::for_tier(4)), 48_000.0);
    }

    #[test]
    fn test_json_defaults_missing_fields() {
        let table = LevelTable::from_json(
            r#"{ "levels": [ { "base_speed": 2.5, "available_patterns": ["figure-eight", "bounce"] } ] }"#,
        )
        .unwrap();
        let level = table.get(0).unwrap();
        assert_eq!(level.base_speed, 2.5);
        assert_eq!(level.available_patterns, vec![MotionPattern::FigureEight, MotionPattern::Bounce]);
        assert_eq!(level.wanted_hit_count, LevelConfig::default().wanted_hit_count);
    }

    #[test]
    fn test_bad_json_and_index() {
        assert!(matches!(LevelTable::from_json("{"), Err(CoreError::Config(_))));
        let table = LevelTable::default();
        assert!(matches!(
            table.get(99),
            Err(CoreError::InvalidLevel { index: 99, .. })
        ));
    }

    #[test]
    fn test_default_table_round_trips() {
        let table = LevelTable::default();
        let json = table.to_json().unwrap();
        assert_eq!(LevelTable::from_json(&json).unwrap(), table);
    }
}
