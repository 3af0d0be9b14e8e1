//! Race controller
//!
//! `Simulation` owns the arena, the race state and the configuration. The
//! host drives it with `tick()` at a fixed 60 Hz and reads `snapshot()`.

use glam::Vec2;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::collision::handle_collisions;
use super::level::LevelData;
use super::physics::{BodyDesc, Layer};
use super::snapshot::{Snapshot, capture};
use super::state::{Arena, EntityMeta, Player, PlayerColor, RaceEvent, RacePhase, RaceState};
use super::step;
use super::world::{LevelSource, build_world};
use crate::config::{CUSTOM_LEVEL_ID, ConfigUpdate, RaceConfig};
use crate::consts::*;
use crate::scoreboard::Scoreboard;

/// Called once with the winner's color name
pub type WinCallback = Box<dyn FnMut(&str)>;

/// Default start zone width when a level has none
pub const DEFAULT_START_WIDTH: f32 = 400.0;

/// Player body material
const PLAYER_RESTITUTION: f32 = 0.9;
const PLAYER_FRICTION: f32 = 0.001;

/// The race simulation
pub struct Simulation {
    arena: Arena,
    config: RaceConfig,
    /// Level installed through `load_level`
    custom_level: Option<LevelData>,
    /// Level the arena was last built from
    level: LevelData,
    race: RaceState,
    scoreboard: Scoreboard,
    events: Vec<RaceEvent>,
    on_win: Option<WinCallback>,
    rng: Pcg32,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(RaceConfig::default())
    }
}

impl Simulation {
    /// Create a simulation with an entropy-seeded spawn RNG
    pub fn new(config: RaceConfig) -> Self {
        Self::with_seed(config, rand::random())
    }

    /// Create a simulation with a fixed spawn RNG seed (deterministic spawns)
    pub fn with_seed(config: RaceConfig, seed: u64) -> Self {
        let mut sim = Self {
            arena: Arena::new(),
            config,
            custom_level: None,
            level: LevelData::new("", ""),
            race: RaceState::default(),
            scoreboard: Scoreboard::new(),
            events: Vec::new(),
            on_win: None,
            rng: Pcg32::seed_from_u64(seed),
        };
        sim.rebuild();
        sim
    }

    /// Register the win callback (replaces any previous one)
    pub fn on_win(&mut self, callback: impl FnMut(&str) + 'static) {
        self.on_win = Some(Box::new(callback));
    }

    /// Merge a partial configuration. A level switch rebuilds the arena
    /// unless a race is running.
    pub fn update_config(&mut self, update: ConfigUpdate) {
        let level_changed = self.config.apply(update);
        if level_changed && !self.race.active {
            self.rebuild();
        }
    }

    /// Install a custom level and switch to it, ending any running race
    pub fn load_level(&mut self, level: LevelData) {
        log::info!("Loading level '{}' ({} objects)", level.name, level.objects.len());
        self.race.active = false;
        self.config.active_level = CUSTOM_LEVEL_ID.to_string();
        self.custom_level = Some(level);
        self.rebuild();
    }

    /// Rebuild the arena and launch one player per color from the start zone
    pub fn spawn_players(&mut self, colors: &[PlayerColor]) {
        self.rebuild();
        self.events.clear();
        if colors.is_empty() {
            log::warn!("No players to spawn");
            return;
        }

        let mut colors = colors.to_vec();
        colors.shuffle(&mut self.rng);

        let (center, zone_width) = match self.level.start_zone() {
            Some(zone) => (zone.position(), zone.size().x),
            None => (
                Vec2::new(GAME_WIDTH / 2.0, GAME_HEIGHT - START_ZONE_OFFSET),
                DEFAULT_START_WIDTH,
            ),
        };
        let n = colors.len();
        let spacing = SPAWN_SPACING.min(zone_width / n as f32);
        let first_x = center.x - (n - 1) as f32 * spacing / 2.0;
        let radius = self.config.player_radius();
        let target_speed = self.config.target_speed;

        for (i, color) in colors.iter().enumerate() {
            let jitter = (self.rng.random::<f32>() - 0.5) * SPAWN_JITTER;
            let x = (first_x + i as f32 * spacing + jitter)
                .clamp(center.x - zone_width / 2.0, center.x + zone_width / 2.0);
            let angle =
                -std::f32::consts::FRAC_PI_2 + (self.rng.random::<f32>() - 0.5) * LAUNCH_SPREAD;

            let handle = self.arena.physics.insert(
                BodyDesc::circle(Vec2::new(x, center.y), radius)
                    .velocity(Vec2::from_angle(angle) * target_speed)
                    .restitution(PLAYER_RESTITUTION)
                    .friction(PLAYER_FRICTION)
                    .friction_air(0.0)
                    .layer(Layer::Player)
                    .ccd(true),
            );
            self.arena
                .entities
                .insert(handle, EntityMeta::player(Player::new(color), radius));
        }

        self.race.start(self.arena.physics.timestamp(), n);
        self.events.push(RaceEvent::RaceStarted { players: n });
        log::info!("Race started with {} players on '{}'", n, self.level.name);
    }

    /// Advance one fixed 60 Hz step
    pub fn tick(&mut self) {
        let elapsed = self.race.elapsed(self.arena.physics.timestamp());

        step::animate_obstacles(&mut self.arena, &mut self.events);
        step::update_hazards(&mut self.arena, elapsed);
        if self.race.active {
            step::eliminate_submerged(&mut self.arena, &mut self.events);
            step::enforce_speed(&mut self.arena, self.config.target_speed);
        }

        let starts = self.arena.physics.step();
        let winner = handle_collisions(
            &mut self.arena,
            &mut self.race,
            &starts,
            self.config.target_speed,
            &mut self.events,
        );

        if let Some(color) = winner {
            let wins = self.scoreboard.record_win(&color);
            log::info!("{} wins! ({} total)", color, wins);
            if let Some(callback) = self.on_win.as_mut() {
                callback(&color);
            }
        } else if self.race.active && self.race.spawned > 0 && self.arena.player_count() == 0 {
            self.race.active = false;
            self.race.no_contest = true;
            self.events.push(RaceEvent::NoContest);
            log::info!("Every player was eliminated, no winner");
        }
    }

    /// End a running race without a winner
    pub fn force_end(&mut self) {
        if self.race.active {
            self.race.active = false;
            self.events.push(RaceEvent::Aborted);
            log::info!("Race ended early");
        }
    }

    /// Tear everything down; the simulation stays usable but empty
    pub fn cleanup(&mut self) {
        self.arena.clear();
        self.race = RaceState::default();
        self.events.clear();
        self.on_win = None;
    }

    pub fn phase(&self) -> RacePhase {
        let delay = self
            .arena
            .hazards
            .values()
            .map(|h| h.move_delay)
            .min_by(f64::total_cmp);
        RacePhase::of(&self.race, self.arena.physics.timestamp(), delay)
    }

    pub fn snapshot(&self) -> Snapshot {
        let (bodies, players) = capture(&self.arena);
        Snapshot {
            timestamp: self.arena.physics.timestamp(),
            phase: self.phase(),
            race_title: self.config.race_title.clone(),
            level_name: self.level.name.clone(),
            winner: self.race.winner.clone(),
            bodies,
            players,
        }
    }

    /// Take the events raised since the last drain
    pub fn drain_events(&mut self) -> Vec<RaceEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn config(&self) -> &RaceConfig {
        &self.config
    }

    pub fn race(&self) -> &RaceState {
        &self.race
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn level(&self) -> &LevelData {
        &self.level
    }

    pub fn scoreboard(&self) -> &Scoreboard {
        &self.scoreboard
    }

    pub fn scoreboard_mut(&mut self) -> &mut Scoreboard {
        &mut self.scoreboard
    }

    fn rebuild(&mut self) {
        let source = match &self.custom_level {
            Some(level) if self.config.is_custom_level() => LevelSource::Custom(level),
            _ => LevelSource::Builtin(&self.config.active_level),
        };
        self.level = build_world(&mut self.arena, source, &self.config, WALL_THICKNESS);
    }
}
