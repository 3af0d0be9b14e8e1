//! Level data model
//!
//! The JSON layout written by the level editor. Pure data; the simulation
//! clones a snapshot when a level is loaded and never mutates it.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors at the level data boundary
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("invalid level JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read level file: {0}")]
    Io(#[from] std::io::Error),
}

/// Arena object types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectKind {
    Wall,
    /// Instant-kill sensor
    Hazard,
    Bouncer,
    SizeGrow,
    SizeShrink,
    TeleportIn,
    TeleportOut,
    Breakable,
    SpeedBooster,
    SpeedSlow,
    Spinner,
    Start,
    Finish,
    MovingHazard,
    Triangle,
    TriangleRight,
    CrateDynamic,
    /// Anything the simulation does not recognize
    #[serde(other)]
    Unknown,
}

/// Default footprint of an object type
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultSize {
    Circle(f32),
    Rect(f32, f32),
}

impl ObjectKind {
    pub fn default_size(&self) -> DefaultSize {
        match self {
            ObjectKind::Wall => DefaultSize::Rect(100.0, 20.0),
            ObjectKind::Hazard => DefaultSize::Rect(40.0, 40.0),
            ObjectKind::Bouncer => DefaultSize::Circle(25.0),
            ObjectKind::SizeGrow | ObjectKind::SizeShrink => DefaultSize::Rect(60.0, 60.0),
            ObjectKind::TeleportIn | ObjectKind::TeleportOut => DefaultSize::Rect(50.0, 70.0),
            ObjectKind::Breakable => DefaultSize::Rect(40.0, 40.0),
            ObjectKind::SpeedBooster | ObjectKind::SpeedSlow => DefaultSize::Rect(50.0, 50.0),
            ObjectKind::Spinner => DefaultSize::Rect(140.0, 15.0),
            ObjectKind::Start | ObjectKind::Finish => DefaultSize::Rect(400.0, 50.0),
            ObjectKind::MovingHazard => DefaultSize::Rect(450.0, 40.0),
            ObjectKind::Triangle | ObjectKind::TriangleRight => DefaultSize::Rect(60.0, 60.0),
            ObjectKind::CrateDynamic => DefaultSize::Rect(40.0, 40.0),
            ObjectKind::Unknown => DefaultSize::Rect(40.0, 40.0),
        }
    }

    /// Overlap-only types (no physical response)
    pub fn is_sensor(&self) -> bool {
        matches!(
            self,
            ObjectKind::Hazard
                | ObjectKind::SizeGrow
                | ObjectKind::SizeShrink
                | ObjectKind::TeleportIn
                | ObjectKind::TeleportOut
                | ObjectKind::SpeedBooster
                | ObjectKind::SpeedSlow
                | ObjectKind::Finish
                | ObjectKind::Start
        )
    }

    /// Solid obstacles that a hazard swallows
    pub fn is_debris(&self) -> bool {
        matches!(
            self,
            ObjectKind::Wall
                | ObjectKind::Bouncer
                | ObjectKind::Spinner
                | ObjectKind::Breakable
                | ObjectKind::Triangle
                | ObjectKind::TriangleRight
                | ObjectKind::CrateDynamic
        )
    }
}

/// Moving hazard behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HazardMode {
    /// Advance the leading edge, keep the trailing edge anchored
    Grow,
    /// Translate the whole footprint; also the fallback for unknown modes
    #[default]
    #[serde(other)]
    Move,
}

/// Type-dependent properties; absent keys fall back to per-type defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_mult: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_icon: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hazard_mode: Option<HazardMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_speed_x: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_speed_y: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_limit: Option<f32>,
    /// Activation delay in ms after race start
    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_delay: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hide_until_start: Option<bool>,
}

/// One placed arena element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelObject {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ObjectKind,
    /// Center
    pub x: f32,
    pub y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f32>,
    /// Degrees
    #[serde(default)]
    pub rotation: f32,
    #[serde(default)]
    pub properties: ObjectProperties,
}

impl LevelObject {
    pub fn new(id: impl Into<String>, kind: ObjectKind, x: f32, y: f32) -> Self {
        Self {
            id: id.into(),
            kind,
            x,
            y,
            width: None,
            height: None,
            radius: None,
            rotation: 0.0,
            properties: ObjectProperties::default(),
        }
    }

    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = Some(radius);
        self
    }

    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn with_properties(mut self, properties: ObjectProperties) -> Self {
        self.properties = properties;
        self
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Width/height with per-type defaults (circles report their diameter)
    pub fn size(&self) -> Vec2 {
        match self.kind.default_size() {
            DefaultSize::Circle(r) => Vec2::splat(self.radius.unwrap_or(r) * 2.0),
            DefaultSize::Rect(w, h) => Vec2::new(
                self.width.filter(|v| *v > 0.0).unwrap_or(w),
                self.height.filter(|v| *v > 0.0).unwrap_or(h),
            ),
        }
    }

    /// Radius with per-type default; rectangles report half their smaller side
    pub fn radius(&self) -> f32 {
        match self.kind.default_size() {
            DefaultSize::Circle(r) => self.radius.filter(|v| *v > 0.0).unwrap_or(r),
            DefaultSize::Rect(..) => {
                let size = self.size();
                size.x.min(size.y) / 2.0
            }
        }
    }
}

/// Arena frame settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LevelSettings {
    /// Inset of the boundary walls from the canvas edge
    pub world_margin: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_opacity: Option<f32>,
}

/// A named, timestamped level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelData {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub objects: Vec<LevelObject>,
    #[serde(default)]
    pub created_at: f64,
    #[serde(default)]
    pub updated_at: f64,
    #[serde(default)]
    pub settings: LevelSettings,
}

impl LevelData {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            objects: Vec::new(),
            created_at: 0.0,
            updated_at: 0.0,
            settings: LevelSettings::default(),
        }
    }

    pub fn with_object(mut self, object: LevelObject) -> Self {
        self.objects.push(object);
        self
    }

    pub fn with_margin(mut self, margin: f32) -> Self {
        self.settings.world_margin = margin;
        self
    }

    pub fn has_finish(&self) -> bool {
        self.objects.iter().any(|o| o.kind == ObjectKind::Finish)
    }

    /// First start zone, if the level defines one
    pub fn start_zone(&self) -> Option<&LevelObject> {
        self.objects.iter().find(|o| o.kind == ObjectKind::Start)
    }

    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, LevelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EDITOR_JSON: &str = r##"{
        "id": "lvl-1",
        "name": "Portals",
        "createdAt": 1700000000000,
        "updatedAt": 1700000000500,
        "settings": { "worldMargin": 15, "frameColor": "#1a1a1a" },
        "objects": [
            { "id": "a", "type": "teleport-in", "x": 100, "y": 600 },
            { "id": "b", "type": "bouncer", "x": 200, "y": 300, "radius": 30 },
            { "id": "c", "type": "moving-hazard", "x": 225, "y": 780, "width": 450, "height": 40,
              "properties": { "hazardMode": "grow", "moveSpeedY": -1, "moveLimit": 300,
                              "moveDelay": 2000, "hideUntilStart": true } },
            { "id": "d", "type": "laser-grid", "x": 10, "y": 10, "rotation": 45 }
        ]
    }"##;

    #[test]
    fn test_parse_editor_json() {
        let level = LevelData::from_json(EDITOR_JSON).unwrap();
        assert_eq!(level.objects.len(), 4);
        assert_eq!(level.settings.world_margin, 15.0);
        assert_eq!(level.objects[0].kind, ObjectKind::TeleportIn);

        let hazard = &level.objects[2];
        assert_eq!(hazard.properties.hazard_mode, Some(HazardMode::Grow));
        assert_eq!(hazard.properties.move_delay, Some(2000.0));
        assert_eq!(hazard.properties.hide_until_start, Some(true));
    }

    #[test]
    fn test_unknown_type_deserializes() {
        let level = LevelData::from_json(EDITOR_JSON).unwrap();
        let unknown = &level.objects[3];
        assert_eq!(unknown.kind, ObjectKind::Unknown);
        assert_eq!(unknown.rotation, 45.0);
    }

    #[test]
    fn test_unknown_hazard_mode_falls_back_to_move() {
        let props: ObjectProperties = serde_json::from_str(r#"{ "hazardMode": "spin" }"#).unwrap();
        assert_eq!(props.hazard_mode, Some(HazardMode::Move));
        assert_eq!(HazardMode::default(), HazardMode::Move);
    }

    #[test]
    fn test_default_dimensions() {
        let portal = LevelObject::new("p", ObjectKind::TeleportIn, 0.0, 0.0);
        assert_eq!(portal.size(), Vec2::new(50.0, 70.0));

        let bouncer = LevelObject::new("b", ObjectKind::Bouncer, 0.0, 0.0);
        assert_eq!(bouncer.radius(), 25.0);
        assert_eq!(bouncer.with_radius(30.0).size(), Vec2::splat(60.0));
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(matches!(
            LevelData::from_json("{ not json"),
            Err(LevelError::Parse(_))
        ));
    }

    #[test]
    fn test_json_round_trip_keeps_objects() {
        let level = LevelData::from_json(EDITOR_JSON).unwrap();
        let again = LevelData::from_json(&level.to_json().unwrap()).unwrap();
        assert_eq!(again, level);
        assert!(!again.has_finish());
        assert!(again.start_zone().is_none());
    }
}
