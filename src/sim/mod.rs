//! Deterministic race simulation
//!
//! All gameplay logic lives here. Given the same seed, level and config:
//! - Fixed timestep only
//! - Seeded spawn RNG only
//! - Stable iteration order (by body handle)
//! - No rendering or platform dependencies

pub mod builtin;
pub mod collision;
pub mod factory;
pub mod level;
pub mod physics;
pub mod race;
pub mod snapshot;
pub mod state;
pub mod step;
pub mod world;

pub use builtin::{BUILTIN_LEVEL_IDS, builtin_level, builtin_level_or_default};
pub use collision::handle_collisions;
pub use factory::create_body;
pub use level::{HazardMode, LevelData, LevelError, LevelObject, LevelSettings, ObjectKind, ObjectProperties};
pub use physics::{BodyDesc, BodyHandle, PhysicsWorld};
pub use race::{Simulation, WinCallback};
pub use snapshot::{BodySnapshot, Outline, PlayerSnapshot, Snapshot};
pub use state::{
    Arena, EliminationCause, EntityKind, EntityMeta, EntityState, HazardState, Player, PlayerColor,
    RaceEvent, RacePhase, RaceState,
};
pub use world::{DEFAULT_FINISH_ID, LevelSource, RISING_FLOOR_ID, build_world};
