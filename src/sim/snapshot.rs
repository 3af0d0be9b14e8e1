//! Read-only view of the arena for renderers

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::physics::BodyHandle;
use super::state::{Arena, EntityKind, EntityMeta, EntityState, RacePhase};

/// World-space outline of a body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "camelCase")]
pub enum Outline {
    Circle { radius: f32 },
    Polygon { vertices: Vec<Vec2> },
}

/// One non-player body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodySnapshot {
    pub handle: BodyHandle,
    pub kind: EntityKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub position: Vec2,
    pub angle: f32,
    pub outline: Outline,
    pub is_sensor: bool,
    pub opacity: f32,
}

/// One live player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub color_name: String,
    pub color_hex: String,
    pub symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    pub position: Vec2,
    pub radius: f32,
    pub speed_mult: f32,
    pub is_shrinked: bool,
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub timestamp: f64,
    pub phase: RacePhase,
    pub race_title: String,
    pub level_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
    pub bodies: Vec<BodySnapshot>,
    pub players: Vec<PlayerSnapshot>,
}

impl Snapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Collect body and player views from the arena, in handle order
pub(crate) fn capture(arena: &Arena) -> (Vec<BodySnapshot>, Vec<PlayerSnapshot>) {
    let mut bodies = Vec::new();
    let mut players = Vec::new();

    for (handle, meta) in &arena.entities {
        let Some(body) = arena.physics.body(*handle) else {
            continue;
        };
        let outline = match body.shape.radius() {
            Some(radius) => Outline::Circle { radius },
            None => Outline::Polygon {
                vertices: body.shape.world_vertices(body.position, body.angle),
            },
        };

        if let Some(player) = meta.as_player() {
            players.push(PlayerSnapshot {
                color_name: player.color_name.clone(),
                color_hex: player.color_hex.clone(),
                symbol: player.symbol.clone(),
                image_path: player.image_path.clone(),
                position: body.position,
                radius: body.shape.radius().unwrap_or(meta.original.radius),
                speed_mult: player.current_speed_mult,
                is_shrinked: player.is_shrinked,
            });
            continue;
        }

        let props = meta.object.as_ref().map(|o| &o.properties);
        bodies.push(BodySnapshot {
            handle: *handle,
            kind: meta.kind,
            object_id: meta.object_id().map(str::to_string),
            color: props.and_then(|p| p.color.clone()),
            label: props.and_then(|p| p.label.clone()),
            position: body.position,
            angle: body.angle,
            outline,
            is_sensor: body.is_sensor,
            opacity: opacity(meta),
        });
    }

    (bodies, players)
}

fn opacity(meta: &EntityMeta) -> f32 {
    match meta.state {
        EntityState::Breakable { opacity, .. } => opacity,
        _ => 1.0,
    }
}
