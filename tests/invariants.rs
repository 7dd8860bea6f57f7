//! Property tests for the simulation's standing guarantees

use std::collections::HashMap;

use glam::Vec2;
use proptest::prelude::*;

use sockball_core::consts::*;
use sockball_core::sim::pattern::PatternStart;
use sockball_core::sim::scheduler::tail_repeats;
use sockball_core::sim::{
    CatchTarget, CatchZone, CatchZoneResolver, CoreEvent, MotionInput, MotionPattern,
    MotionPatternEngine, PatternMemory, PatternScheduler, Projectile, seeded,
};
use sockball_core::{ArenaConfig, DifficultyProfile, LevelTable, ThrowingSession};

fn any_pattern() -> impl Strategy<Value = MotionPattern> {
    prop::sample::select(MotionPattern::ALL.to_vec())
}

fn session(seed: u64, level: usize, tier: u8) -> ThrowingSession {
    let mut s = ThrowingSession::new(ArenaConfig::default(), LevelTable::default(), seed);
    s.setup(level, tier).unwrap();
    s
}

proptest! {
    #[test]
    fn pattern_velocity_has_target_magnitude(
        pattern in any_pattern(),
        base in 0.1f32..6.0,
        time in 0.5f32..2.0,
        forward in any::<bool>(),
        seed in any::<u64>(),
        steps in 1usize..120,
    ) {
        let mut rng = seeded(seed);
        let direction = if forward { 1.0 } else { -1.0 };
        let start = PatternStart {
            npc_center: Vec2::new(250.0, 180.0),
            arena_center: Vec2::new(400.0, 300.0),
            arena_size: Vec2::new(800.0, 600.0),
            direction,
        };
        let mut memory = PatternMemory::start(pattern, &start, &mut rng);
        let input = MotionInput {
            base_speed: base,
            pattern_speed: pattern.speed_multiplier(),
            time_multiplier: time,
            direction,
            scale: 1.0,
        };
        let expected = (base * pattern.speed_multiplier() * time).min(MAX_NPC_SPEED);

        for _ in 0..steps {
            let v = MotionPatternEngine::evaluate(&mut memory, &input, &mut rng);
            prop_assert!((v.length() - expected).abs() < 1e-3 * expected.max(1.0));
            prop_assert_eq!(memory.pattern(), pattern);
        }
    }

    #[test]
    fn confined_npc_stays_inside_bounds(
        seed in any::<u64>(),
        level in 0usize..8,
        tier in 0u8..5,
        dts in prop::collection::vec(0.0f32..60.0, 50..400),
    ) {
        let mut s = session(seed, level, tier);
        let bounds = s.arena().bounds;
        for (frame, dt) in dts.iter().enumerate() {
            if frame % 15 == 0 {
                let _ = s.throw_at(s.npc().center());
            }
            s.update(*dt);
            prop_assert!(s.npc().velocity.length() <= MAX_NPC_SPEED + 1e-3);
            if s.lifecycle().is_confined() {
                prop_assert!(
                    bounds.contains_box(s.npc_position(), s.npc_size()),
                    "NPC at {:?} escaped {:?}", s.npc_position(), bounds
                );
            }
        }
    }

    #[test]
    fn no_pattern_runs_more_than_the_limit(
        seed in any::<u64>(),
        available in prop::sample::subsequence(MotionPattern::ALL.to_vec(), 2..=11),
        picks in 1usize..200,
    ) {
        let mut rng = seeded(seed);
        let mut scheduler = PatternScheduler::new();
        for _ in 0..picks {
            let picked = scheduler.choose(&available, &mut rng).unwrap();
            prop_assert!(available.contains(&picked));
            prop_assert!(tail_repeats(scheduler.history(), picked) <= MAX_CONSECUTIVE_PATTERNS);
            prop_assert!(scheduler.history().len() <= PATTERN_HISTORY_LEN);
        }
    }

    #[test]
    fn every_sockball_resolves_exactly_once(
        seed in any::<u64>(),
        targets in prop::collection::vec((0.0f32..800.0, 0.0f32..600.0), 1..6),
    ) {
        let mut s = session(seed, 2, 0);
        let mut thrown = Vec::new();
        let mut events = Vec::new();
        for (x, y) in targets {
            if let Ok(id) = s.throw_at(Vec2::new(x, y)) {
                thrown.push(id);
            }
            for _ in 0..10 {
                s.update(NOMINAL_FRAME_MS);
            }
            events.extend(s.drain_events());
        }
        // Longer than any sockball's lifetime
        for _ in 0..600 {
            s.update(NOMINAL_FRAME_MS);
        }
        events.extend(s.drain_events());
        prop_assert!(s.projectiles().is_empty());

        let mut resolutions: HashMap<u32, usize> = HashMap::new();
        for event in &events {
            match event {
                CoreEvent::Catch { projectile_id, .. }
                | CoreEvent::ProjectileMissed { projectile_id, .. } => {
                    *resolutions.entry(*projectile_id).or_default() += 1;
                }
                _ => {}
            }
        }
        for id in thrown {
            prop_assert_eq!(resolutions.get(&id).copied(), Some(1), "sockball #{}", id);
        }
    }

    #[test]
    fn best_zone_never_decreases(distances in prop::collection::vec(0.0f32..400.0, 1..60)) {
        let difficulty = DifficultyProfile::default();
        let target = CatchTarget {
            center: Vec2::ZERO,
            nominal_half_width: 50.0,
            catchable: false,
        };
        let mut ball = Projectile::new(1, Vec2::ZERO, Vec2::ZERO);
        let mut best = CatchZone::None;
        for d in distances {
            ball.pos = Vec2::new(d, 0.0);
            CatchZoneResolver::evaluate(&mut ball, &target, &difficulty);
            prop_assert!(ball.best_zone >= best);
            best = ball.best_zone;
        }
    }

    #[test]
    fn same_seed_same_game(
        seed in any::<u64>(),
        script in prop::collection::vec((0.0f32..40.0, prop::option::of((0.0f32..800.0, 0.0f32..600.0))), 10..200),
    ) {
        let run = || {
            let mut s = session(seed, 4, 2);
            let mut events = Vec::new();
            for (dt, throw) in &script {
                if let Some((x, y)) = throw {
                    let _ = s.throw_at(Vec2::new(*x, *y));
                }
                s.update(*dt);
                events.extend(s.drain_events());
            }
            (serde_json::to_string(&s.snapshot()).unwrap(), events)
        };
        let (snapshot_a, events_a) = run();
        let (snapshot_b, events_b) = run();
        prop_assert_eq!(snapshot_a, snapshot_b);
        prop_assert_eq!(events_a, events_b);
    }
}
