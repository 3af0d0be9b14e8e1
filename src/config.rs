//! Race configuration
//!
//! Set by the host UI and merged in piecemeal through [`ConfigUpdate`].

use serde::{Deserialize, Serialize};

/// Id used for a level installed through `Simulation::load_level`
pub const CUSTOM_LEVEL_ID: &str = "custom";

/// Built-in level used when nothing else is selected
pub const DEFAULT_LEVEL_ID: &str = "high_flow";

/// Race configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RaceConfig {
    /// Spawn an implicit rising floor when the level has no moving hazards
    pub floor_enabled: bool,
    /// Rising floor speed (pixels per tick, upward)
    pub floor_speed: f32,
    /// Delay before the rising floor starts moving (ms after race start)
    pub floor_delay: f64,
    /// Player speed every tick (pixels per tick)
    pub target_speed: f32,
    /// Player diameter
    pub player_size: f32,
    /// Title shown above the arena
    pub race_title: String,
    /// Built-in level id, or [`CUSTOM_LEVEL_ID`]
    pub active_level: String,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            floor_enabled: true,
            floor_speed: 0.5,
            floor_delay: 5000.0,
            target_speed: 7.0,
            player_size: 40.0,
            race_title: "FOOD BATTLE".to_string(),
            active_level: DEFAULT_LEVEL_ID.to_string(),
        }
    }
}

/// Partial configuration; `None` fields keep their current value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigUpdate {
    pub floor_enabled: Option<bool>,
    pub floor_speed: Option<f32>,
    pub floor_delay: Option<f64>,
    pub target_speed: Option<f32>,
    pub player_size: Option<f32>,
    pub race_title: Option<String>,
    pub active_level: Option<String>,
}

impl RaceConfig {
    /// Merge a partial update. Returns true if the active level changed.
    pub fn apply(&mut self, update: ConfigUpdate) -> bool {
        if let Some(v) = update.floor_enabled {
            self.floor_enabled = v;
        }
        if let Some(v) = update.floor_speed {
            self.floor_speed = v;
        }
        if let Some(v) = update.floor_delay {
            self.floor_delay = v;
        }
        if let Some(v) = update.target_speed {
            self.target_speed = v;
        }
        if let Some(v) = update.player_size {
            self.player_size = v;
        }
        if let Some(v) = update.race_title {
            self.race_title = v;
        }
        match update.active_level {
            Some(level) if level != self.active_level => {
                self.active_level = level;
                true
            }
            _ => false,
        }
    }

    /// Player radius derived from the configured diameter
    pub fn player_radius(&self) -> f32 {
        self.player_size / 2.0
    }

    pub fn is_custom_level(&self) -> bool {
        self.active_level == CUSTOM_LEVEL_ID
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl ConfigUpdate {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_merges_only_present_fields() {
        let mut config = RaceConfig::default();
        let changed = config.apply(ConfigUpdate {
            target_speed: Some(9.0),
            ..Default::default()
        });
        assert!(!changed);
        assert_eq!(config.target_speed, 9.0);
        assert_eq!(config.floor_speed, 0.5);
        assert_eq!(config.active_level, DEFAULT_LEVEL_ID);
    }

    #[test]
    fn test_apply_reports_level_change() {
        let mut config = RaceConfig::default();
        assert!(config.apply(ConfigUpdate {
            active_level: Some("basic".into()),
            ..Default::default()
        }));
        // Same level again is not a change
        assert!(!config.apply(ConfigUpdate {
            active_level: Some("basic".into()),
            ..Default::default()
        }));
    }

    #[test]
    fn test_partial_json_update() {
        let update = ConfigUpdate::from_json(r#"{"floorEnabled": false, "raceTitle": "DERBY"}"#)
            .unwrap();
        let mut config = RaceConfig::default();
        config.apply(update);
        assert!(!config.floor_enabled);
        assert_eq!(config.race_title, "DERBY");
        assert_eq!(config.player_radius(), 20.0);
    }

    #[test]
    fn test_config_json_defaults_missing_fields() {
        let config = RaceConfig::from_json(r#"{"targetSpeed": 5}"#).unwrap();
        assert_eq!(config.target_speed, 5.0);
        assert!(config.floor_enabled);
        let back = RaceConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(back, config);
    }
}
