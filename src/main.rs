//! Sockball headless simulator
//!
//! Plays one level with a simple aiming bot and logs every core event.
//! Useful for balance checks: `RUST_LOG=debug sockball-sim [seed] [level] [tier] [levels.json]`

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use glam::Vec2;

    use sockball_core::consts::*;
    use sockball_core::schedule::TaskQueue;
    use sockball_core::sim::{CoreEvent, NpcLifecycle, TickInput, tick};
    use sockball_core::{ArenaConfig, CoreError, LevelTable, ThrowingSession};

    /// Frames between bot throws
    const THROW_EVERY_FRAMES: u32 = 40;
    /// Refill granted once after running dry
    const REFILL_SOCKBALLS: u32 = 3;
    const REENTER_DELAY_MS: f32 = 1500.0;
    /// Safety stop for the demo loop
    const MAX_FRAMES: u32 = 60 * 60 * 5;

    /// Deferred host actions
    #[derive(Debug)]
    enum HostTask {
        Reenter,
    }

    pub struct Options {
        pub seed: u64,
        pub level: usize,
        pub tier: u8,
        pub levels_path: Option<String>,
    }

    impl Options {
        pub fn from_args() -> Self {
            let args: Vec<String> = std::env::args().skip(1).collect();
            let seed = args
                .first()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(rand::random::<u64>);
            Self {
                seed,
                level: args.get(1).and_then(|s| s.parse().ok()).unwrap_or(0),
                tier: args.get(2).and_then(|s| s.parse().ok()).unwrap_or(0),
                levels_path: args.get(3).cloned(),
            }
        }
    }

    fn load_levels(path: Option<&str>) -> Result<LevelTable, Box<dyn std::error::Error>> {
        match path {
            Some(path) => {
                let json = std::fs::read_to_string(path)?;
                Ok(LevelTable::from_json(&json)?)
            }
            None => Ok(LevelTable::default()),
        }
    }

    /// Aim where the NPC will be when a sockball launched now gets there
    fn lead_target(session: &ThrowingSession) -> Vec2 {
        let npc = session.npc();
        let launch = session.arena().launch_point;
        let frames = launch.distance(npc.center()) / session.arena().launch_speed;
        // Gravity drops the ball roughly g*t²/2 over the flight
        let drop = 0.5 * SOCKBALL_GRAVITY * frames * frames;
        npc.center() + npc.velocity * frames - Vec2::new(0.0, drop)
    }

    pub fn run(options: Options) -> Result<(), Box<dyn std::error::Error>> {
        let levels = load_levels(options.levels_path.as_deref())?;
        log::info!(
            "Sockball sim: seed {}, level {}, tier {}",
            options.seed,
            options.level,
            options.tier
        );

        let mut session = ThrowingSession::new(ArenaConfig::default(), levels, options.seed);
        session.setup(options.level, options.tier)?;

        let mut tasks: TaskQueue<HostTask> = TaskQueue::new();
        let mut refilled = false;
        let mut exit_success = None;
        let mut best_catches = [0u32; 4];

        for frame in 0..MAX_FRAMES {
            let confined = session.lifecycle().is_confined();
            let input = TickInput {
                throw_target: (confined
                    && exit_success.is_none()
                    && frame % THROW_EVERY_FRAMES == 0
                    && session.available_sockballs() > 0)
                    .then(|| lead_target(&session)),
                bonus: false,
            };

            for catch in tick(&mut session, &input, NOMINAL_FRAME_MS) {
                best_catches[catch.quality as usize] += 1;
                println!(
                    "{:>6} {:<9} {}/{}",
                    frame,
                    catch.popup.text,
                    catch.collected,
                    session.wanted_count()
                );
            }

            for event in session.drain_events() {
                match event {
                    CoreEvent::Catch { .. } => {}
                    CoreEvent::ProjectileMissed { projectile_id, reason } => {
                        log::info!("Sockball #{projectile_id} missed: {reason:?}");
                    }
                    other => log::debug!("{other:?}"),
                }
            }

            for task in tasks.advance(NOMINAL_FRAME_MS) {
                match task {
                    HostTask::Reenter => {
                        session.add_sockballs(REFILL_SOCKBALLS);
                        exit_success = None;
                        if let Err(err) = session.start_enter() {
                            log::warn!("Re-enter failed: {err}");
                        }
                    }
                }
            }

            if session.lifecycle().is_confined() && exit_success.is_none() {
                if session.quota_met() {
                    session.start_exit(true)?;
                    exit_success = Some(true);
                } else if session.out_of_ammo() || session.time_expired() {
                    session.start_exit(false)?;
                    exit_success = Some(false);
                }
            }

            if session.lifecycle() == NpcLifecycle::OffScreen && tasks.is_empty() {
                match exit_success {
                    Some(false) if !refilled && !session.time_expired() => {
                        refilled = true;
                        tasks.schedule(REENTER_DELAY_MS, HostTask::Reenter);
                    }
                    _ => break,
                }
            }
        }
        tasks.clear();

        let outcome = match exit_success {
            Some(true) => "quota met",
            Some(false) => "failed",
            None => "unfinished",
        };
        println!(
            "Level \"{}\" {}: {}/{} collected ({} perfect, {} good, {} regular), {:.1}s left",
            session.level().name,
            outcome,
            session.collected_count(),
            session.wanted_count(),
            best_catches[3],
            best_catches[2],
            best_catches[1],
            session.time_remaining_ms() / 1000.0
        );
        Ok(())
    }

    /// Map setup errors to a readable message
    pub fn describe(err: &(dyn std::error::Error + 'static)) -> String {
        match err.downcast_ref::<CoreError>() {
            Some(CoreError::InvalidLevel { index, available }) => {
                format!("level {index} does not exist ({available} levels loaded)")
            }
            _ => err.to_string(),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    let options = headless::Options::from_args();
    if let Err(err) = headless::run(options) {
        log::error!("{}", headless::describe(&*err));
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The core is driven by the host page; nothing to run here
}
