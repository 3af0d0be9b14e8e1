//! Built-in levels
//!
//! Levels that ship with the game. They carry no finish or start objects;
//! the world builder adds the defaults.

use super::level::{LevelData, LevelObject, ObjectKind, ObjectProperties};
use crate::config::DEFAULT_LEVEL_ID;
use crate::consts::{GAME_HEIGHT, GAME_WIDTH};

/// Ids of the built-in levels, in menu order
pub const BUILTIN_LEVEL_IDS: [&str; 2] = ["high_flow", "basic"];

/// Look up a built-in level by id
pub fn builtin_level(id: &str) -> Option<LevelData> {
    match id {
        "high_flow" => Some(high_flow()),
        "basic" => Some(basic()),
        _ => None,
    }
}

/// Look up a built-in level, falling back to the default level
pub fn builtin_level_or_default(id: &str) -> LevelData {
    builtin_level(id).unwrap_or_else(|| {
        log::warn!("Unknown level '{}', using '{}'", id, DEFAULT_LEVEL_ID);
        high_flow()
    })
}

fn spinner(id: &str, x: f32, y: f32) -> LevelObject {
    LevelObject::new(id, ObjectKind::Spinner, x, y)
        .with_size(180.0, 15.0)
        .with_properties(ObjectProperties {
            speed: Some(0.1),
            color: Some("#D946EF".into()),
            ..Default::default()
        })
}

fn high_flow() -> LevelData {
    let w = GAME_WIDTH;
    let h = GAME_HEIGHT;
    LevelData::new("high_flow", "High Flow")
        // Angled bars
        .with_object(
            LevelObject::new("hf-bar-left", ObjectKind::Wall, w * 0.25, h * 0.3)
                .with_size(150.0, 20.0)
                .with_rotation(0.5_f32.to_degrees()),
        )
        .with_object(
            LevelObject::new("hf-bar-right", ObjectKind::Wall, w * 0.75, h * 0.3)
                .with_size(150.0, 20.0)
                .with_rotation((-0.5_f32).to_degrees()),
        )
        .with_object(
            LevelObject::new("hf-bar-center", ObjectKind::Wall, w * 0.5, h * 0.5)
                .with_size(120.0, 20.0)
                .with_rotation(1.57_f32.to_degrees()),
        )
        // Bouncers
        .with_object(LevelObject::new("hf-bouncer-1", ObjectKind::Bouncer, w * 0.2, h * 0.7).with_radius(30.0))
        .with_object(LevelObject::new("hf-bouncer-2", ObjectKind::Bouncer, w * 0.8, h * 0.7).with_radius(30.0))
        .with_object(LevelObject::new("hf-bouncer-3", ObjectKind::Bouncer, w * 0.5, h * 0.2).with_radius(35.0))
        // Spinners
        .with_object(spinner("hf-spinner-1", w * 0.5, h * 0.4))
        .with_object(spinner("hf-spinner-2", w * 0.5, h * 0.6))
}

fn basic() -> LevelData {
    let w = GAME_WIDTH;
    let h = GAME_HEIGHT;
    LevelData::new("basic", "Basic")
        .with_object(LevelObject::new("basic-bouncer", ObjectKind::Bouncer, w / 2.0, h / 2.0).with_radius(50.0))
        .with_object(LevelObject::new("basic-bar-top", ObjectKind::Wall, w / 2.0, h / 4.0).with_size(200.0, 20.0))
        .with_object(
            LevelObject::new("basic-bar-bottom", ObjectKind::Wall, w / 2.0, h * 0.75).with_size(200.0, 20.0),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_builtin_ids_resolve() {
        for id in BUILTIN_LEVEL_IDS {
            let level = builtin_level(id).unwrap();
            assert_eq!(level.id, id);
            assert!(!level.objects.is_empty());
        }
    }

    #[test]
    fn test_unknown_id_falls_back_to_default() {
        let level = builtin_level_or_default("does-not-exist");
        assert_eq!(level.id, DEFAULT_LEVEL_ID);
    }

    #[test]
    fn test_high_flow_layout() {
        let level = builtin_level("high_flow").unwrap();
        let spinners = level.objects.iter().filter(|o| o.kind == ObjectKind::Spinner).count();
        let bouncers = level.objects.iter().filter(|o| o.kind == ObjectKind::Bouncer).count();
        assert_eq!(spinners, 2);
        assert_eq!(bouncers, 3);
        assert!(!level.has_finish());
    }
}
