//! Body factory
//!
//! Turns one level object into a physics body plus its gameplay metadata.
//! Never fails: unrecognized objects become plain static rectangles.

use glam::Vec2;

use super::level::{LevelObject, ObjectKind};
use super::physics::{BodyDesc, BodyHandle, Layer, Shape};
use super::state::{Arena, EntityKind, EntityMeta, EntityState, HazardState, OriginalSize};
use crate::{deg_to_rad, rotate};

/// Breakable durability when the object sets none
pub const DEFAULT_BREAKABLE_HEALTH: u32 = 3;
/// Speed pad multipliers when the object sets none
pub const DEFAULT_BOOST_MULT: f32 = 1.5;
pub const DEFAULT_SLOW_MULT: f32 = 0.6;
/// Spinner angular rate when the object sets none
pub const DEFAULT_SPIN_SPEED: f32 = 0.1;
/// Moving hazard defaults
pub const DEFAULT_HAZARD_SPEED_Y: f32 = -0.5;
pub const DEFAULT_HAZARD_LIMIT: f32 = 1000.0;

/// Create the body for `obj`, register its metadata (and hazard state for
/// moving hazards) in the arena, and return its handle.
pub fn create_body(arena: &mut Arena, obj: &LevelObject) -> BodyHandle {
    let angle = deg_to_rad(obj.rotation);
    let anchor = obj.position();
    let size = obj.size();
    let props = &obj.properties;

    let desc = match obj.kind {
        ObjectKind::Bouncer => BodyDesc::circle(anchor, obj.radius()),
        ObjectKind::Triangle | ObjectKind::TriangleRight => {
            let (shape, offset) = Shape::convex(&triangle_vertices(obj.kind, size));
            // The centroid sits below the box center; carry it into world space
            BodyDesc::new(shape, anchor + rotate(offset, angle))
        }
        ObjectKind::Unknown => {
            log::warn!("Unknown object type for '{}', using a static block", obj.id);
            BodyDesc::rect(anchor, size.x, size.y)
        }
        _ => BodyDesc::rect(anchor, size.x, size.y),
    }
    .angle(angle);

    let desc = match obj.kind {
        ObjectKind::CrateDynamic => desc.friction(0.3).restitution(0.6).friction_air(0.02),
        // Swallows players rather than shoving them into the walls
        ObjectKind::MovingHazard => desc
            .kinematic()
            .layer(Layer::Engulfing)
            .friction(0.0)
            .restitution(1.0)
            .sensor(props.hide_until_start.unwrap_or(false)),
        kind => desc
            .fixed()
            .friction(0.0)
            .restitution(1.0)
            .sensor(kind.is_sensor()),
    };

    let handle = arena.physics.insert(desc);

    let state = match obj.kind {
        ObjectKind::Breakable => {
            let health = props
                .health
                .map(|h| h.round().max(1.0) as u32)
                .unwrap_or(DEFAULT_BREAKABLE_HEALTH);
            EntityState::Breakable {
                health,
                max_health: health,
                opacity: 1.0,
            }
        }
        ObjectKind::SpeedBooster => EntityState::SpeedPad {
            mult: props.speed_mult.unwrap_or(DEFAULT_BOOST_MULT),
        },
        ObjectKind::SpeedSlow => EntityState::SpeedPad {
            mult: props.speed_mult.unwrap_or(DEFAULT_SLOW_MULT),
        },
        ObjectKind::Spinner => EntityState::Spinner {
            initial_angle: angle,
            speed: props.speed.unwrap_or(DEFAULT_SPIN_SPEED),
            direction: 1.0,
        },
        _ => EntityState::Inert,
    };

    if obj.kind == ObjectKind::MovingHazard {
        let position = arena.physics.body(handle).map_or(anchor, |b| b.position);
        arena.hazards.insert(
            obj.id.clone(),
            HazardState {
                handle,
                mode: props.hazard_mode.unwrap_or_default(),
                velocity: Vec2::new(
                    props.move_speed_x.unwrap_or(0.0),
                    props.move_speed_y.unwrap_or(DEFAULT_HAZARD_SPEED_Y),
                ),
                move_limit: props.move_limit.unwrap_or(DEFAULT_HAZARD_LIMIT).max(0.0),
                move_delay: props.move_delay.unwrap_or(0.0),
                hide_until_start: props.hide_until_start.unwrap_or(false),
                start: position,
                start_size: size,
                size,
                distance_travelled: 0.0,
            },
        );
    }

    arena.entities.insert(
        handle,
        EntityMeta {
            kind: EntityKind::Object(obj.kind),
            object: Some(obj.clone()),
            original: OriginalSize {
                radius: obj.radius(),
                width: size.x,
                height: size.y,
            },
            state,
        },
    );

    handle
}

/// Triangle outline relative to the placement anchor (the bounding box center)
fn triangle_vertices(kind: ObjectKind, size: Vec2) -> [Vec2; 3] {
    let hw = size.x / 2.0;
    let hh = size.y / 2.0;
    match kind {
        ObjectKind::TriangleRight => [
            Vec2::new(-hw, -hh),
            Vec2::new(hw, hh),
            Vec2::new(-hw, hh),
        ],
        // Apex up, centered
        _ => [Vec2::new(0.0, -hh), Vec2::new(hw, hh), Vec2::new(-hw, hh)],
    }
}
