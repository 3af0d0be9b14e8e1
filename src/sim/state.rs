//! Simulation state and core gameplay types
//!
//! Gameplay data lives beside the physics world, keyed by body handle,
//! rather than on the engine bodies themselves.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::level::{HazardMode, LevelObject, ObjectKind};
use super::physics::{Aabb, BodyHandle, PhysicsWorld};
use crate::consts::{FLOOR_WARNING_MS, GAME_HEIGHT, GAME_WIDTH};

/// What a body is, for collision dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "type", rename_all = "camelCase")]
pub enum EntityKind {
    /// Arena frame wall
    Boundary,
    /// Body built from a level object
    Object(ObjectKind),
    Player,
}

/// A racer's identity, as supplied by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerColor {
    pub name: String,
    pub hex: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl PlayerColor {
    pub fn new(name: impl Into<String>, hex: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hex: hex.into(),
            symbol: symbol.into(),
            image: None,
        }
    }

    /// The stock roster
    pub fn defaults() -> Vec<PlayerColor> {
        vec![
            PlayerColor::new("Burger", "#FF3B30", "🍔"),
            PlayerColor::new("Salad", "#4CD964", "🥗"),
            PlayerColor::new("Ice Cream", "#007AFF", "🍦"),
            PlayerColor::new("Banana", "#FFCC00", "🍌"),
            PlayerColor::new("Pizza", "#AF52DE", "🍕"),
        ]
    }
}

/// A racer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub color_name: String,
    pub color_hex: String,
    pub symbol: String,
    pub image_path: Option<String>,
    /// Applied to the target speed; decays toward 1.0 every tick
    pub current_speed_mult: f32,
    pub is_shrinked: bool,
}

impl Player {
    pub fn new(color: &PlayerColor) -> Self {
        Self {
            color_name: color.name.clone(),
            color_hex: color.hex.clone(),
            symbol: color.symbol.clone(),
            image_path: color.image.clone(),
            current_speed_mult: 1.0,
            is_shrinked: false,
        }
    }
}

/// Dimensions at creation time (scaling mutates the live shape)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OriginalSize {
    pub radius: f32,
    pub width: f32,
    pub height: f32,
}

/// Type-specific live state
#[derive(Debug, Clone, PartialEq)]
pub enum EntityState {
    Inert,
    Breakable {
        health: u32,
        max_health: u32,
        /// Render opacity, health / max_health floored at 0.3
        opacity: f32,
    },
    SpeedPad {
        mult: f32,
    },
    Spinner {
        initial_angle: f32,
        speed: f32,
        direction: f32,
    },
    Player(Player),
}

/// Gameplay metadata attached to one body
#[derive(Debug, Clone, PartialEq)]
pub struct EntityMeta {
    pub kind: EntityKind,
    /// Originating level object (never re-derived from the body)
    pub object: Option<LevelObject>,
    pub original: OriginalSize,
    pub state: EntityState,
}

impl EntityMeta {
    pub fn boundary() -> Self {
        Self {
            kind: EntityKind::Boundary,
            object: None,
            original: OriginalSize::default(),
            state: EntityState::Inert,
        }
    }

    pub fn player(player: Player, radius: f32) -> Self {
        Self {
            kind: EntityKind::Player,
            object: None,
            original: OriginalSize {
                radius,
                width: radius * 2.0,
                height: radius * 2.0,
            },
            state: EntityState::Player(player),
        }
    }

    pub fn as_player(&self) -> Option<&Player> {
        match &self.state {
            EntityState::Player(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_player_mut(&mut self) -> Option<&mut Player> {
        match &mut self.state {
            EntityState::Player(p) => Some(p),
            _ => None,
        }
    }

    pub fn object_id(&self) -> Option<&str> {
        self.object.as_ref().map(|o| o.id.as_str())
    }
}

/// Scripted motion state of one moving hazard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardState {
    pub handle: BodyHandle,
    pub mode: HazardMode,
    /// Velocity per tick before wall clamping
    pub velocity: Vec2,
    pub move_limit: f32,
    /// ms after race start
    pub move_delay: f64,
    pub hide_until_start: bool,
    pub start: Vec2,
    pub start_size: Vec2,
    /// Current footprint (grows in grow mode)
    pub size: Vec2,
    pub distance_travelled: f32,
}

impl HazardState {
    pub fn is_capped(&self) -> bool {
        self.distance_travelled >= self.move_limit
    }
}

/// Race lifecycle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RaceState {
    pub active: bool,
    pub winner: Option<String>,
    /// Physics timestamp (ms) when the race started
    pub start_timestamp: f64,
    /// Players launched this race
    pub spawned: usize,
    /// Set when a race ends without a winner
    pub no_contest: bool,
}

impl RaceState {
    /// Arm a new race
    pub fn start(&mut self, timestamp: f64, spawned: usize) {
        self.active = true;
        self.winner = None;
        self.start_timestamp = timestamp;
        self.spawned = spawned;
        self.no_contest = false;
    }

    /// Latch the winner. Returns false if the race is not accepting a winner.
    pub fn latch_winner(&mut self, color_name: &str) -> bool {
        if !self.active || self.winner.is_some() {
            return false;
        }
        self.winner = Some(color_name.to_string());
        self.active = false;
        true
    }

    pub fn elapsed(&self, timestamp: f64) -> Option<f64> {
        self.active.then(|| timestamp - self.start_timestamp)
    }
}

/// Race phase, as shown by the banner above the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RacePhase {
    /// No race running (before the first spawn, or after `force_end`)
    Idle,
    Racing,
    /// The first hazard starts moving soon
    HazardWarning,
    /// Hazards are moving
    Survival,
    /// Won, or ended with no one left
    Finished,
}

impl RacePhase {
    /// Phase at `timestamp` given the earliest hazard delay (ms after start)
    pub fn of(race: &RaceState, timestamp: f64, hazard_delay: Option<f64>) -> Self {
        if race.winner.is_some() || race.no_contest {
            return RacePhase::Finished;
        }
        let Some(elapsed) = race.elapsed(timestamp) else {
            return RacePhase::Idle;
        };
        match hazard_delay {
            Some(delay) if elapsed >= delay => RacePhase::Survival,
            Some(delay) if elapsed >= delay - FLOOR_WARNING_MS => RacePhase::HazardWarning,
            _ => RacePhase::Racing,
        }
    }
}

/// Why a player left the race
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EliminationCause {
    /// Touched an instant-kill hazard
    Hazard,
    /// Swallowed by a solid moving hazard
    Submerged,
}

/// Events raised during a tick, drained by the host (sound, effects, UI)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RaceEvent {
    RaceStarted { players: usize },
    /// A player touched something; intensity is the relative impact speed
    Collision { intensity: f32 },
    Teleported { color: String, to: Vec2 },
    Resized { color: String, shrunk: bool },
    SpeedChanged { color: String, mult: f32 },
    BreakableHit { object_id: String, health: u32 },
    BreakableDestroyed { object_id: String },
    ObstacleSwallowed { object_id: String },
    PlayerEliminated { color: String, cause: EliminationCause },
    Win { color: String },
    /// Every player was eliminated before anyone finished
    NoContest,
    /// Ended through `force_end`
    Aborted,
}

/// The live arena: physics bodies plus gameplay side tables
#[derive(Debug)]
pub struct Arena {
    pub physics: PhysicsWorld,
    pub entities: BTreeMap<BodyHandle, EntityMeta>,
    /// Keyed by the originating level object id
    pub hazards: BTreeMap<String, HazardState>,
    pub size: Vec2,
    pub margin: f32,
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl Arena {
    pub fn new() -> Self {
        Self {
            physics: PhysicsWorld::new(),
            entities: BTreeMap::new(),
            hazards: BTreeMap::new(),
            size: Vec2::new(GAME_WIDTH, GAME_HEIGHT),
            margin: 0.0,
        }
    }

    /// Drop every body and side-table entry
    pub fn clear(&mut self) {
        self.physics.clear();
        self.entities.clear();
        self.hazards.clear();
    }

    /// Remove one body and its metadata. Returns false if already gone.
    pub fn remove(&mut self, handle: BodyHandle) -> bool {
        let removed = self.physics.remove(handle);
        self.entities.remove(&handle);
        self.hazards.retain(|_, h| h.handle != handle);
        removed
    }

    /// Playable area: canvas inset by the margin
    pub fn inner_bounds(&self) -> Aabb {
        Aabb::new(Vec2::splat(self.margin), self.size - Vec2::splat(self.margin))
    }

    pub fn kind(&self, handle: BodyHandle) -> Option<EntityKind> {
        self.entities.get(&handle).map(|m| m.kind)
    }

    pub fn player(&self, handle: BodyHandle) -> Option<&Player> {
        self.entities.get(&handle).and_then(EntityMeta::as_player)
    }

    pub fn player_mut(&mut self, handle: BodyHandle) -> Option<&mut Player> {
        self.entities.get_mut(&handle).and_then(EntityMeta::as_player_mut)
    }

    /// Live player handles, in spawn order
    pub fn player_handles(&self) -> Vec<BodyHandle> {
        self.entities
            .iter()
            .filter(|(_, m)| m.kind == EntityKind::Player)
            .map(|(h, _)| *h)
            .collect()
    }

    pub fn player_count(&self) -> usize {
        self.entities
            .values()
            .filter(|m| m.kind == EntityKind::Player)
            .count()
    }

    /// Handle of the live player with this color
    pub fn find_player(&self, color_name: &str) -> Option<BodyHandle> {
        self.entities
            .iter()
            .find(|(_, m)| m.as_player().is_some_and(|p| p.color_name == color_name))
            .map(|(h, _)| *h)
    }

    /// Handles of bodies built from objects of `kind`
    pub fn handles_of(&self, kind: ObjectKind) -> Vec<BodyHandle> {
        self.entities
            .iter()
            .filter(|(_, m)| m.kind == EntityKind::Object(kind))
            .map(|(h, _)| *h)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::physics::BodyDesc;

    #[test]
    fn test_winner_latches_once() {
        let mut race = RaceState::default();
        assert!(!race.latch_winner("Burger"));

        race.start(100.0, 3);
        assert!(race.latch_winner("Burger"));
        assert!(!race.latch_winner("Salad"));
        assert_eq!(race.winner.as_deref(), Some("Burger"));
        assert!(!race.active);
    }

    #[test]
    fn test_elapsed_only_while_active() {
        let mut race = RaceState::default();
        assert_eq!(race.elapsed(500.0), None);
        race.start(100.0, 1);
        assert_eq!(race.elapsed(600.0), Some(500.0));
    }

    #[test]
    fn test_phase_progression() {
        let mut race = RaceState::default();
        assert_eq!(RacePhase::of(&race, 0.0, Some(5000.0)), RacePhase::Idle);

        race.start(1000.0, 2);
        assert_eq!(RacePhase::of(&race, 2000.0, Some(5000.0)), RacePhase::Racing);
        assert_eq!(RacePhase::of(&race, 4500.0, Some(5000.0)), RacePhase::HazardWarning);
        assert_eq!(RacePhase::of(&race, 6000.0, Some(5000.0)), RacePhase::Survival);
        assert_eq!(RacePhase::of(&race, 60_000.0, None), RacePhase::Racing);

        race.latch_winner("Salad");
        assert_eq!(RacePhase::of(&race, 6000.0, Some(5000.0)), RacePhase::Finished);
    }

    #[test]
    fn test_arena_remove_drops_side_tables() {
        let mut arena = Arena::new();
        let handle = arena.physics.insert(BodyDesc::circle(Vec2::ZERO, 20.0));
        let color = PlayerColor::new("Pizza", "#AF52DE", "🍕");
        arena
            .entities
            .insert(handle, EntityMeta::player(Player::new(&color), 20.0));

        assert_eq!(arena.find_player("Pizza"), Some(handle));
        assert!(arena.remove(handle));
        assert!(!arena.remove(handle));
        assert_eq!(arena.player_count(), 0);
    }
}
