//! Bounce Race entry point
//!
//! Native builds run one headless race and log the outcome. The browser
//! build is driven from JavaScript through `bounce_race::web`.

#[cfg(not(target_arch = "wasm32"))]
use bounce_race::RaceConfig;
#[cfg(not(target_arch = "wasm32"))]
use bounce_race::sim::{LevelData, PlayerColor, RaceEvent, RacePhase, Simulation};

/// Give up after two simulated minutes
#[cfg(not(target_arch = "wasm32"))]
const MAX_TICKS: u32 = 60 * 120;

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Bounce Race (native) starting...");

    let mut sim = Simulation::new(RaceConfig::default());

    if let Some(path) = std::env::args().nth(1) {
        match LevelData::load(&path) {
            Ok(level) => sim.load_level(level),
            Err(e) => log::error!("Could not load {}: {}, using the built-in level", path, e),
        }
    }

    sim.on_win(|color| println!("🏆 {} wins!", color));
    sim.spawn_players(&PlayerColor::defaults());

    let mut ticks = 0;
    while ticks < MAX_TICKS && is_running(sim.phase()) {
        sim.tick();
        ticks += 1;
        for event in sim.drain_events() {
            match event {
                RaceEvent::PlayerEliminated { color, cause } => {
                    log::info!("{} eliminated ({:?}) at {:.1}s", color, cause, ticks as f32 / 60.0)
                }
                RaceEvent::Collision { .. } => {}
                other => log::debug!("{:?}", other),
            }
        }
    }

    if sim.phase() != RacePhase::Finished {
        sim.force_end();
    }
    match &sim.race().winner {
        Some(winner) => log::info!("Race over after {} ticks, winner: {}", ticks, winner),
        None => log::info!("Race over after {} ticks, no winner", ticks),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn is_running(phase: RacePhase) -> bool {
    matches!(
        phase,
        RacePhase::Racing | RacePhase::HazardWarning | RacePhase::Survival
    )
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is web::start, this is just to satisfy the compiler
}
