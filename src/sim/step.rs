//! Per-tick world corrections
//!
//! Runs once per tick before the physics step: obstacle animation, hazard
//! motion, submersion and the constant-speed rule.

use glam::Vec2;

use super::level::HazardMode;
use super::physics::BodyHandle;
use super::state::{Arena, EliminationCause, EntityKind, EntityState, RaceEvent};
use crate::consts::*;
use crate::rotate;

/// Rotate spinners to their absolute angle for the current timestamp and
/// remove solid obstacles swallowed by a solid hazard.
pub fn animate_obstacles(arena: &mut Arena, events: &mut Vec<RaceEvent>) {
    let timestamp = arena.physics.timestamp();

    for (handle, meta) in &arena.entities {
        if let EntityState::Spinner {
            initial_angle,
            speed,
            direction,
        } = meta.state
        {
            let turn = timestamp * f64::from(speed) * SPIN_SCALE * f64::from(direction);
            arena.physics.set_angle(*handle, initial_angle + turn as f32);
        }
    }

    let hazard_bounds: Vec<_> = arena
        .hazards
        .values()
        .filter_map(|h| arena.physics.body(h.handle))
        .filter(|b| !b.is_sensor)
        .map(|b| b.bounds())
        .collect();
    if hazard_bounds.is_empty() {
        return;
    }

    let swallowed: Vec<BodyHandle> = arena
        .entities
        .iter()
        .filter(|(_, m)| matches!(m.kind, EntityKind::Object(kind) if kind.is_debris()))
        .filter_map(|(h, _)| arena.physics.body(*h))
        .filter(|b| hazard_bounds.iter().any(|bounds| bounds.contains(b.position)))
        .map(|b| b.handle)
        .collect();

    for handle in swallowed {
        let object_id = arena
            .entities
            .get(&handle)
            .and_then(|m| m.object_id())
            .unwrap_or_default()
            .to_string();
        if arena.remove(handle) {
            events.push(RaceEvent::ObstacleSwallowed { object_id });
        }
    }
}

/// Advance moving hazards. `elapsed` is the race time in ms, `None` when no
/// race is running (hazards then hold still).
pub fn update_hazards(arena: &mut Arena, elapsed: Option<f64>) {
    let inner = arena.inner_bounds();

    for (id, hazard) in arena.hazards.iter_mut() {
        let armed = elapsed.is_some_and(|t| t >= hazard.move_delay);
        if hazard.hide_until_start {
            arena.physics.set_sensor(hazard.handle, !armed);
        }
        if !armed || hazard.is_capped() {
            continue;
        }
        let Some(body) = arena.physics.body(hazard.handle) else {
            continue;
        };
        let bounds = body.bounds();
        let position = body.position;
        let angle = body.angle;

        let mut v = hazard.velocity;
        if (v.x < 0.0 && bounds.min.x + v.x < inner.min.x) || (v.x > 0.0 && bounds.max.x + v.x > inner.max.x) {
            v.x = 0.0;
        }
        if (v.y < 0.0 && bounds.min.y + v.y < inner.min.y) || (v.y > 0.0 && bounds.max.y + v.y > inner.max.y) {
            v.y = 0.0;
        }

        let mut len = v.length();
        if len == 0.0 {
            continue;
        }
        let remaining = hazard.move_limit - hazard.distance_travelled;
        if len > remaining {
            v *= remaining / len;
            len = remaining;
        }

        match hazard.mode {
            HazardMode::Move => {
                arena.physics.set_position(hazard.handle, position + v);
            }
            HazardMode::Grow => {
                // `size` is in the hazard's own axes
                let grown = hazard.size + rotate(v, -angle).abs();
                arena.physics.set_position(hazard.handle, position + v / 2.0);
                arena
                    .physics
                    .scale(hazard.handle, grown.x / hazard.size.x, grown.y / hazard.size.y);
                hazard.size = grown;
            }
        }

        hazard.distance_travelled += len;
        if hazard.is_capped() {
            log::debug!("Hazard '{}' reached its limit", id);
        }
    }
}

/// Remove players swallowed by a solid hazard.
pub fn eliminate_submerged(arena: &mut Arena, events: &mut Vec<RaceEvent>) {
    let zones: Vec<_> = arena
        .hazards
        .values()
        .filter_map(|h| arena.physics.body(h.handle))
        .filter(|b| !b.is_sensor)
        .map(|b| {
            let bounds = b.bounds();
            let pad = Vec2::new(
                (bounds.width() * SUBMERSION_PAD_FRACTION).min(SUBMERSION_PAD_MAX),
                (bounds.height() * SUBMERSION_PAD_FRACTION).min(SUBMERSION_PAD_MAX),
            );
            bounds.shrink(pad)
        })
        .collect();
    if zones.is_empty() {
        return;
    }

    let submerged: Vec<BodyHandle> = arena
        .player_handles()
        .into_iter()
        .filter(|h| {
            arena
                .physics
                .body(*h)
                .is_some_and(|b| zones.iter().any(|z| z.contains_strict(b.position)))
        })
        .collect();

    for handle in submerged {
        let color = arena
            .player(handle)
            .map(|p| p.color_name.clone())
            .unwrap_or_default();
        if arena.remove(handle) {
            log::debug!("{} was swallowed", color);
            events.push(RaceEvent::PlayerEliminated {
                color,
                cause: EliminationCause::Submerged,
            });
        }
    }
}

/// Decay every player's speed multiplier and hold each moving player at
/// exactly `target_speed * multiplier`.
pub fn enforce_speed(arena: &mut Arena, target_speed: f32) {
    for handle in arena.player_handles() {
        let Some(player) = arena.player_mut(handle) else {
            continue;
        };
        player.current_speed_mult = decay_speed_mult(player.current_speed_mult);
        let speed = target_speed * player.current_speed_mult;

        if let Some(velocity) = arena.physics.body(handle).map(|b| b.velocity) {
            if let Some(v) = renormalize(velocity, speed) {
                arena.physics.set_velocity(handle, v);
            }
        }
    }
}

/// One tick of multiplier decay toward 1.0
pub fn decay_speed_mult(mult: f32) -> f32 {
    let next = mult - (mult - 1.0) * SPEED_DECAY;
    if (next - 1.0).abs() < SPEED_SNAP { 1.0 } else { next }
}

/// `velocity` rescaled to `speed`; `None` for a stationary body
pub fn renormalize(velocity: Vec2, speed: f32) -> Option<Vec2> {
    (velocity.length_squared() > 0.0).then(|| velocity.normalize() * speed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::factory::create_body;
    use crate::sim::level::{LevelObject, ObjectKind, ObjectProperties};
    use crate::sim::physics::BodyDesc;
    use crate::sim::state::{EntityMeta, Player, PlayerColor};
    use proptest::prelude::*;

    fn add_player(arena: &mut Arena, pos: Vec2, vel: Vec2) -> BodyHandle {
        let handle = arena.physics.insert(
            BodyDesc::circle(pos, 20.0)
                .velocity(vel)
                .friction(0.001)
                .friction_air(0.0)
                .restitution(0.9),
        );
        let color = PlayerColor::new("Banana", "#FFCC00", "🍌");
        arena
            .entities
            .insert(handle, EntityMeta::player(Player::new(&color), 20.0));
        handle
    }

    fn hazard(props: ObjectProperties) -> LevelObject {
        LevelObject::new("lava", ObjectKind::MovingHazard, 225.0, 700.0)
            .with_size(200.0, 40.0)
            .with_properties(props)
    }

    #[test]
    fn test_decay_snaps_to_one() {
        assert_eq!(decay_speed_mult(1.005), 1.0);
        assert_eq!(decay_speed_mult(1.0), 1.0);
        assert!((decay_speed_mult(2.0) - 1.98).abs() < 1e-6);
        assert!((decay_speed_mult(0.5) - 0.51).abs() < 1e-6);
    }

    #[test]
    fn test_stationary_player_is_left_alone() {
        let mut arena = Arena::new();
        let h = add_player(&mut arena, Vec2::new(100.0, 100.0), Vec2::ZERO);
        enforce_speed(&mut arena, 7.0);
        assert_eq!(arena.physics.body(h).unwrap().velocity, Vec2::ZERO);
    }

    #[test]
    fn test_hazard_waits_for_delay() {
        let mut arena = Arena::new();
        let h = create_body(
            &mut arena,
            &hazard(ObjectProperties {
                move_delay: Some(1000.0),
                ..Default::default()
            }),
        );
        let start = arena.physics.body(h).unwrap().position;

        update_hazards(&mut arena, None);
        update_hazards(&mut arena, Some(500.0));
        assert_eq!(arena.physics.body(h).unwrap().position, start);

        update_hazards(&mut arena, Some(1000.0));
        assert!(arena.physics.body(h).unwrap().position.y < start.y);
    }

    #[test]
    fn test_hide_until_start_toggles_sensor() {
        let mut arena = Arena::new();
        let h = create_body(
            &mut arena,
            &hazard(ObjectProperties {
                hide_until_start: Some(true),
                move_delay: Some(100.0),
                ..Default::default()
            }),
        );
        update_hazards(&mut arena, Some(50.0));
        assert!(arena.physics.body(h).unwrap().is_sensor);
        update_hazards(&mut arena, Some(150.0));
        assert!(!arena.physics.body(h).unwrap().is_sensor);
    }

    #[test]
    fn test_wall_clamp_stops_axis() {
        let mut arena = Arena::new();
        // Right edge at 445, moving right into the canvas edge at 450
        let obj = LevelObject::new("h", ObjectKind::MovingHazard, 425.0, 400.0)
            .with_size(40.0, 40.0)
            .with_properties(ObjectProperties {
                move_speed_x: Some(10.0),
                move_speed_y: Some(-1.0),
                ..Default::default()
            });
        let h = create_body(&mut arena, &obj);
        update_hazards(&mut arena, Some(0.0));

        let p = arena.physics.body(h).unwrap().position;
        assert_eq!(p.x, 425.0);
        assert!((p.y - 399.0).abs() < 1e-4);
        assert!((arena.hazards["h"].distance_travelled - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_grow_mode_anchors_trailing_edge() {
        let mut arena = Arena::new();
        let h = create_body(
            &mut arena,
            &hazard(ObjectProperties {
                hazard_mode: Some(HazardMode::Grow),
                move_speed_y: Some(-4.0),
                ..Default::default()
            }),
        );
        let before = arena.physics.bounds(h).unwrap();
        for _ in 0..5 {
            update_hazards(&mut arena, Some(0.0));
        }
        let after = arena.physics.bounds(h).unwrap();

        assert!((after.max.y - before.max.y).abs() < 1e-3);
        assert!((after.min.y - (before.min.y - 20.0)).abs() < 1e-3);
        assert!((arena.hazards["lava"].size.y - 60.0).abs() < 1e-4);
    }

    #[test]
    fn test_rotated_grow_hazard_extends_along_motion() {
        let mut arena = Arena::new();
        // 200x40 turned upright: 40 wide, 200 tall on screen
        let h = create_body(
            &mut arena,
            &hazard(ObjectProperties {
                hazard_mode: Some(HazardMode::Grow),
                move_speed_y: Some(-4.0),
                ..Default::default()
            })
            .with_rotation(90.0),
        );
        let before = arena.physics.bounds(h).unwrap();
        for _ in 0..5 {
            update_hazards(&mut arena, Some(0.0));
        }
        let after = arena.physics.bounds(h).unwrap();

        assert!((after.width() - before.width()).abs() < 1e-2);
        assert!((after.height() - (before.height() + 20.0)).abs() < 1e-2);
        assert!((after.max.y - before.max.y).abs() < 1e-2);
    }

    #[test]
    fn test_submersion_needs_padding() {
        let mut arena = Arena::new();
        // Hazard spans y 680..720 (pad 10) and x 125..325 (pad 20)
        create_body(&mut arena, &hazard(ObjectProperties::default()));
        let grazing = add_player(&mut arena, Vec2::new(225.0, 685.0), Vec2::ZERO);
        let edge = add_player(&mut arena, Vec2::new(225.0, 690.0), Vec2::ZERO);
        let inside = add_player(&mut arena, Vec2::new(225.0, 700.0), Vec2::ZERO);

        let mut events = Vec::new();
        eliminate_submerged(&mut arena, &mut events);

        assert!(arena.physics.contains(grazing));
        assert!(arena.physics.contains(edge));
        assert!(!arena.physics.contains(inside));
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_sensor_hazard_does_not_submerge() {
        let mut arena = Arena::new();
        create_body(
            &mut arena,
            &hazard(ObjectProperties {
                hide_until_start: Some(true),
                ..Default::default()
            }),
        );
        let p = add_player(&mut arena, Vec2::new(225.0, 700.0), Vec2::ZERO);
        let mut events = Vec::new();
        eliminate_submerged(&mut arena, &mut events);
        assert!(arena.physics.contains(p));
    }

    #[test]
    fn test_debris_swallowed_by_solid_hazard() {
        let mut arena = Arena::new();
        create_body(&mut arena, &hazard(ObjectProperties::default()));
        let wall = create_body(&mut arena, &LevelObject::new("w", ObjectKind::Wall, 225.0, 700.0));
        let pad = create_body(&mut arena, &LevelObject::new("p", ObjectKind::SpeedBooster, 225.0, 700.0));
        let outside = create_body(&mut arena, &LevelObject::new("b", ObjectKind::Bouncer, 225.0, 300.0));

        let mut events = Vec::new();
        animate_obstacles(&mut arena, &mut events);

        assert!(!arena.physics.contains(wall));
        assert!(arena.physics.contains(pad));
        assert!(arena.physics.contains(outside));
        assert_eq!(
            events,
            vec![RaceEvent::ObstacleSwallowed {
                object_id: "w".into()
            }]
        );
    }

    #[test]
    fn test_spinner_angle_is_absolute() {
        let mut arena = Arena::new();
        let obj = LevelObject::new("s", ObjectKind::Spinner, 200.0, 200.0).with_rotation(90.0);
        let h = create_body(&mut arena, &obj);
        for _ in 0..3 {
            arena.physics.step();
        }
        let mut events = Vec::new();
        animate_obstacles(&mut arena, &mut events);
        animate_obstacles(&mut arena, &mut events);

        let expected = std::f32::consts::FRAC_PI_2 + (3.0 * TICK_MS * 0.1 * SPIN_SCALE) as f32;
        assert!((arena.physics.body(h).unwrap().angle - expected).abs() < 1e-5);
    }

    proptest! {
        #[test]
        fn prop_speed_matches_target(
            vx in -50.0f32..50.0,
            vy in -50.0f32..50.0,
            mult in 0.3f32..3.0,
            target in 1.0f32..20.0,
        ) {
            prop_assume!(vx.abs() > 1e-3 || vy.abs() > 1e-3);
            let mut arena = Arena::new();
            let h = add_player(&mut arena, Vec2::new(200.0, 400.0), Vec2::new(vx, vy));
            arena.player_mut(h).unwrap().current_speed_mult = mult;

            enforce_speed(&mut arena, target);

            let m = arena.player(h).unwrap().current_speed_mult;
            let speed = arena.physics.body(h).unwrap().speed();
            prop_assert!((speed - target * m).abs() < 1e-3 * target * m.max(1.0));
        }

        #[test]
        fn prop_decay_converges_monotonically(start in 0.1f32..5.0) {
            let mut m = start;
            for _ in 0..1000 {
                let next = decay_speed_mult(m);
                prop_assert!((next - 1.0).abs() <= (m - 1.0).abs());
                m = next;
            }
            prop_assert_eq!(m, 1.0);
        }

        #[test]
        fn prop_hazard_never_exceeds_limit(
            vx in -8.0f32..8.0,
            vy in -8.0f32..8.0,
            limit in 0.0f32..300.0,
        ) {
            let mut arena = Arena::new();
            let obj = LevelObject::new("h", ObjectKind::MovingHazard, 225.0, 400.0)
                .with_size(60.0, 60.0)
                .with_properties(ObjectProperties {
                    move_speed_x: Some(vx),
                    move_speed_y: Some(vy),
                    move_limit: Some(limit),
                    ..Default::default()
                });
            let h = create_body(&mut arena, &obj);
            let start = arena.physics.body(h).unwrap().position;

            for _ in 0..400 {
                update_hazards(&mut arena, Some(0.0));
            }
            let hazard = &arena.hazards["h"];
            prop_assert!(hazard.distance_travelled <= limit + 1e-3);

            let moved = arena.physics.body(h).unwrap().position.distance(start);
            prop_assert!(moved <= limit + 1e-2);

            // Stays inside the arena
            let bounds = arena.physics.bounds(h).unwrap();
            prop_assert!(bounds.min.x >= -1e-3 && bounds.max.x <= GAME_WIDTH + 1e-3);
            prop_assert!(bounds.min.y >= -1e-3 && bounds.max.y <= GAME_HEIGHT + 1e-3);
        }
    }
}
