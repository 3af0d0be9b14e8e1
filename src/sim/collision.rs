//! Gameplay collision handling
//!
//! Applies the effect of every player contact reported by the physics step:
//! portals, size and speed pads, hazards, breakables and the finish line.

use std::collections::HashSet;

use super::level::ObjectKind;
use super::physics::{BodyHandle, CollisionStart};
use super::state::{Arena, EliminationCause, EntityKind, EntityState, RaceEvent, RaceState};
use super::step::renormalize;
use crate::consts::SHRINK_FACTOR;

/// Floor for breakable render opacity
pub const MIN_BREAKABLE_OPACITY: f32 = 0.3;

/// Handle one tick's collision starts.
///
/// Returns the winner's color if this batch decided the race.
pub fn handle_collisions(
    arena: &mut Arena,
    race: &mut RaceState,
    starts: &[CollisionStart],
    target_speed: f32,
    events: &mut Vec<RaceEvent>,
) -> Option<String> {
    let mut seen = HashSet::new();
    let mut winner = None;

    for start in starts {
        let (player, other) = match (arena.kind(start.a), arena.kind(start.b)) {
            (Some(EntityKind::Player), Some(EntityKind::Player)) => {
                events.push(RaceEvent::Collision {
                    intensity: start.speed,
                });
                continue;
            }
            (Some(EntityKind::Player), Some(_)) => (start.a, start.b),
            (Some(_), Some(EntityKind::Player)) => (start.b, start.a),
            // Not a player contact, or one side was removed earlier this batch
            _ => continue,
        };
        if !seen.insert((player, other)) {
            continue;
        }

        if let Some(color) = handle_contact(arena, race, player, other, start.speed, target_speed, events) {
            winner = Some(color);
        }
    }

    winner
}

fn handle_contact(
    arena: &mut Arena,
    race: &mut RaceState,
    player: BodyHandle,
    other: BodyHandle,
    impact: f32,
    target_speed: f32,
    events: &mut Vec<RaceEvent>,
) -> Option<String> {
    let kind = match arena.kind(other)? {
        EntityKind::Object(kind) => kind,
        EntityKind::Boundary | EntityKind::Player => {
            events.push(RaceEvent::Collision { intensity: impact });
            return None;
        }
    };
    let color = arena.player(player)?.color_name.clone();

    match kind {
        ObjectKind::TeleportIn => teleport(arena, player, other, color, events),
        ObjectKind::SizeShrink => resize(arena, player, color, true, events),
        ObjectKind::SizeGrow => resize(arena, player, color, false, events),
        ObjectKind::SpeedBooster | ObjectKind::SpeedSlow => {
            let EntityState::SpeedPad { mult } = arena.entities.get(&other)?.state else {
                return None;
            };
            arena.player_mut(player)?.current_speed_mult = mult;
            if let Some(v) = arena
                .physics
                .body(player)
                .and_then(|b| renormalize(b.velocity, target_speed * mult))
            {
                arena.physics.set_velocity(player, v);
            }
            events.push(RaceEvent::SpeedChanged { color, mult });
        }
        ObjectKind::Hazard => {
            if arena.remove(player) {
                log::debug!("{} hit a hazard", color);
                events.push(RaceEvent::PlayerEliminated {
                    color,
                    cause: EliminationCause::Hazard,
                });
            }
        }
        ObjectKind::Breakable => {
            events.push(RaceEvent::Collision { intensity: impact });
            damage(arena, other, events);
        }
        ObjectKind::Finish => {
            if race.latch_winner(&color) {
                events.push(RaceEvent::Win {
                    color: color.clone(),
                });
                return Some(color);
            }
        }
        ObjectKind::Wall
        | ObjectKind::Bouncer
        | ObjectKind::Spinner
        | ObjectKind::Triangle
        | ObjectKind::TriangleRight
        | ObjectKind::CrateDynamic
        | ObjectKind::MovingHazard
        | ObjectKind::Unknown => {
            events.push(RaceEvent::Collision { intensity: impact });
        }
        ObjectKind::TeleportOut | ObjectKind::Start => {}
    }

    None
}

/// Send the player to the exit portal nearest the entry portal
fn teleport(
    arena: &mut Arena,
    player: BodyHandle,
    entry: BodyHandle,
    color: String,
    events: &mut Vec<RaceEvent>,
) {
    let Some(from) = arena.physics.body(entry).map(|b| b.position) else {
        return;
    };
    let exit = arena
        .handles_of(ObjectKind::TeleportOut)
        .into_iter()
        .filter_map(|h| arena.physics.body(h))
        .map(|b| b.position)
        .min_by(|a, b| a.distance_squared(from).total_cmp(&b.distance_squared(from)));

    match exit {
        Some(to) => {
            arena.physics.set_position(player, to);
            log::debug!("{} teleported to ({:.0}, {:.0})", color, to.x, to.y);
            events.push(RaceEvent::Teleported { color, to });
        }
        None => log::warn!("Teleport entered by {} has no exit", color),
    }
}

/// Shrink once, or grow back only if shrunk
fn resize(arena: &mut Arena, player: BodyHandle, color: String, shrink: bool, events: &mut Vec<RaceEvent>) {
    let Some(state) = arena.player_mut(player) else {
        return;
    };
    if state.is_shrinked == shrink {
        return;
    }
    state.is_shrinked = shrink;

    let factor = if shrink { SHRINK_FACTOR } else { 1.0 / SHRINK_FACTOR };
    arena.physics.scale(player, factor, factor);
    events.push(RaceEvent::Resized { color, shrunk: shrink });
}

/// One hit on a breakable; removed when its health runs out
fn damage(arena: &mut Arena, handle: BodyHandle, events: &mut Vec<RaceEvent>) {
    let Some(meta) = arena.entities.get_mut(&handle) else {
        return;
    };
    let object_id = meta.object_id().unwrap_or_default().to_string();
    let EntityState::Breakable {
        health,
        max_health,
        opacity,
    } = &mut meta.state
    else {
        return;
    };

    *health = health.saturating_sub(1);
    *opacity = (*health as f32 / (*max_health).max(1) as f32).max(MIN_BREAKABLE_OPACITY);
    let remaining = *health;

    if remaining == 0 {
        arena.remove(handle);
        log::debug!("Breakable '{}' destroyed", object_id);
        events.push(RaceEvent::BreakableDestroyed { object_id });
    } else {
        events.push(RaceEvent::BreakableHit {
            object_id,
            health: remaining,
        });
    }
}
