//! World builder
//!
//! Rebuilds the arena from scratch: frame walls, level objects, the implicit
//! rising floor and the default finish line.

use glam::Vec2;

use super::builtin::builtin_level_or_default;
use super::factory::create_body;
use super::level::{LevelData, LevelObject, ObjectKind, ObjectProperties};
use super::physics::{BodyDesc, BodyHandle};
use super::state::{Arena, EntityMeta, EntityState};
use crate::config::RaceConfig;
use crate::consts::*;

/// Reserved object id of the implicit rising floor
pub const RISING_FLOOR_ID: &str = "__rising_floor";
/// Reserved object id of the default finish line
pub const DEFAULT_FINISH_ID: &str = "__finish";

/// Where the level content comes from
#[derive(Debug, Clone, Copy)]
pub enum LevelSource<'a> {
    /// A level installed by the host
    Custom(&'a LevelData),
    /// A built-in level id (unknown ids fall back to the default level)
    Builtin(&'a str),
}

/// Clear the arena and build it from `source`.
///
/// Returns the level that was built, so callers can look up its start zone.
pub fn build_world(
    arena: &mut Arena,
    source: LevelSource<'_>,
    config: &RaceConfig,
    wall_thickness: f32,
) -> LevelData {
    let (level, is_builtin) = match source {
        LevelSource::Custom(level) => (level.clone(), false),
        LevelSource::Builtin(id) => (builtin_level_or_default(id), true),
    };

    arena.clear();
    arena.size = Vec2::new(GAME_WIDTH, GAME_HEIGHT);
    arena.margin = level.settings.world_margin.max(0.0);

    add_boundary(arena, wall_thickness);

    let mut spinner_index = 0;
    for obj in &level.objects {
        let handle = create_body(arena, obj);
        if obj.kind == ObjectKind::Spinner {
            if is_builtin {
                set_spinner_direction(arena, handle, spinner_index);
            }
            spinner_index += 1;
        }
    }

    if arena.hazards.is_empty() && config.floor_enabled {
        create_body(arena, &rising_floor(config));
    }

    if !level.has_finish() {
        create_body(arena, &default_finish());
    }

    log::info!(
        "Built level '{}' ({} bodies, {} hazards)",
        level.name,
        arena.physics.len(),
        arena.hazards.len()
    );

    level
}

/// Four solid frame walls inset by the arena margin
fn add_boundary(arena: &mut Arena, t: f32) {
    let m = arena.margin;
    let Vec2 { x: w, y: h } = arena.size;
    let walls = [
        (Vec2::new(m + t / 2.0, h / 2.0), Vec2::new(t, h - 2.0 * m)),
        (Vec2::new(w - m - t / 2.0, h / 2.0), Vec2::new(t, h - 2.0 * m)),
        (Vec2::new(w / 2.0, m + t / 2.0), Vec2::new(w - 2.0 * m, t)),
        (Vec2::new(w / 2.0, h - m - t / 2.0), Vec2::new(w - 2.0 * m, t)),
    ];
    for (pos, size) in walls {
        let handle = arena.physics.insert(
            BodyDesc::rect(pos, size.x, size.y)
                .fixed()
                .friction(0.0)
                .restitution(1.0),
        );
        arena.entities.insert(handle, EntityMeta::boundary());
    }
}

fn set_spinner_direction(arena: &mut Arena, handle: BodyHandle, index: usize) {
    if let Some(EntityState::Spinner { direction, .. }) =
        arena.entities.get_mut(&handle).map(|m| &mut m.state)
    {
        *direction = if index % 2 == 0 { 1.0 } else { -1.0 };
    }
}

/// Full-width slab parked below the arena, rising after the floor delay
fn rising_floor(config: &RaceConfig) -> LevelObject {
    LevelObject::new(
        RISING_FLOOR_ID,
        ObjectKind::MovingHazard,
        GAME_WIDTH / 2.0,
        GAME_HEIGHT + FLOOR_HEIGHT / 2.0,
    )
    .with_size(GAME_WIDTH, FLOOR_HEIGHT)
    .with_properties(ObjectProperties {
        move_speed_x: Some(0.0),
        move_speed_y: Some(-config.floor_speed.abs()),
        move_limit: Some(GAME_HEIGHT),
        move_delay: Some(config.floor_delay),
        hide_until_start: Some(false),
        ..Default::default()
    })
}

fn default_finish() -> LevelObject {
    LevelObject::new(DEFAULT_FINISH_ID, ObjectKind::Finish, GAME_WIDTH / 2.0, FINISH_Y)
        .with_size(FINISH_WIDTH, FINISH_HEIGHT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::EntityKind;

    fn custom_level() -> LevelData {
        LevelData::new("custom-1", "Custom")
            .with_margin(20.0)
            .with_object(LevelObject::new("f", ObjectKind::Finish, 225.0, 60.0))
            .with_object(
                LevelObject::new("lava", ObjectKind::MovingHazard, 225.0, 760.0).with_size(410.0, 40.0),
            )
    }

    #[test]
    fn test_builtin_gets_floor_and_finish() {
        let mut arena = Arena::new();
        let config = RaceConfig::default();
        let level = build_world(&mut arena, LevelSource::Builtin("basic"), &config, WALL_THICKNESS);

        assert_eq!(level.id, "basic");
        assert!(arena.hazards.contains_key(RISING_FLOOR_ID));
        assert_eq!(arena.handles_of(ObjectKind::Finish).len(), 1);

        let floor = &arena.hazards[RISING_FLOOR_ID];
        assert_eq!(floor.velocity, Vec2::new(0.0, -config.floor_speed));
        assert_eq!(floor.move_delay, config.floor_delay);
        // Top edge flush with the bottom of the canvas
        let bounds = arena.physics.bounds(floor.handle).unwrap();
        assert!((bounds.min.y - GAME_HEIGHT).abs() < 1e-3);
        assert!(!arena.physics.body(floor.handle).unwrap().is_sensor);
    }

    #[test]
    fn test_floor_disabled() {
        let mut arena = Arena::new();
        let config = RaceConfig {
            floor_enabled: false,
            ..RaceConfig::default()
        };
        build_world(&mut arena, LevelSource::Builtin("basic"), &config, WALL_THICKNESS);
        assert!(arena.hazards.is_empty());
    }

    #[test]
    fn test_explicit_hazard_suppresses_floor_and_finish() {
        let mut arena = Arena::new();
        let level = custom_level();
        build_world(&mut arena, LevelSource::Custom(&level), &RaceConfig::default(), WALL_THICKNESS);

        assert_eq!(arena.hazards.len(), 1);
        assert!(arena.hazards.contains_key("lava"));
        assert_eq!(arena.handles_of(ObjectKind::Finish).len(), 1);
        assert_eq!(arena.margin, 20.0);
    }

    #[test]
    fn test_boundary_respects_margin() {
        let mut arena = Arena::new();
        let level = custom_level();
        build_world(&mut arena, LevelSource::Custom(&level), &RaceConfig::default(), WALL_THICKNESS);

        let walls: Vec<_> = arena
            .entities
            .iter()
            .filter(|(_, m)| m.kind == EntityKind::Boundary)
            .map(|(h, _)| arena.physics.bounds(*h).unwrap())
            .collect();
        assert_eq!(walls.len(), 4);
        let min_x = walls.iter().map(|b| b.min.x).fold(f32::MAX, f32::min);
        let max_y = walls.iter().map(|b| b.max.y).fold(f32::MIN, f32::max);
        assert!((min_x - 20.0).abs() < 1e-3);
        assert!((max_y - (GAME_HEIGHT - 20.0)).abs() < 1e-3);
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let mut arena = Arena::new();
        let config = RaceConfig::default();
        build_world(&mut arena, LevelSource::Builtin("high_flow"), &config, WALL_THICKNESS);
        let first = arena.physics.len();
        build_world(&mut arena, LevelSource::Builtin("high_flow"), &config, WALL_THICKNESS);
        assert_eq!(arena.physics.len(), first);
        assert_eq!(arena.entities.len(), first);
    }

    #[test]
    fn test_builtin_spinners_alternate() {
        let mut arena = Arena::new();
        build_world(
            &mut arena,
            LevelSource::Builtin("high_flow"),
            &RaceConfig::default(),
            WALL_THICKNESS,
        );
        let directions: Vec<f32> = arena
            .handles_of(ObjectKind::Spinner)
            .into_iter()
            .filter_map(|h| match arena.entities[&h].state {
                EntityState::Spinner { direction, .. } => Some(direction),
                _ => None,
            })
            .collect();
        assert_eq!(directions, vec![1.0, -1.0]);
    }
}
