//! Bounce Race - a top-down race of constant-speed bouncing players
//!
//! Core modules:
//! - `sim`: Simulation (physics world, level data, per-tick gameplay, race lifecycle)
//! - `config`: Race configuration and partial updates
//! - `scoreboard`: Win tally across races

pub mod config;
pub mod scoreboard;
pub mod sim;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use config::{ConfigUpdate, RaceConfig};
pub use scoreboard::Scoreboard;
pub use sim::{LevelData, PlayerColor, RaceEvent, Simulation};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Arena dimensions (screen space, y grows downward)
    pub const GAME_WIDTH: f32 = 450.0;
    pub const GAME_HEIGHT: f32 = 800.0;

    /// Fixed simulation timestep in milliseconds (60 Hz)
    pub const TICK_MS: f64 = 1000.0 / 60.0;

    /// Boundary wall thickness
    pub const WALL_THICKNESS: f32 = 10.0;

    /// Player scale applied by a shrink pad (grow pads apply the inverse)
    pub const SHRINK_FACTOR: f32 = 0.6;

    /// Fraction of the excess speed multiplier removed each tick
    pub const SPEED_DECAY: f32 = 0.02;
    /// Multipliers this close to 1.0 snap to exactly 1.0
    pub const SPEED_SNAP: f32 = 0.01;

    /// Submersion padding: min(SUBMERSION_PAD_MAX, extent * SUBMERSION_PAD_FRACTION)
    pub const SUBMERSION_PAD_MAX: f32 = 20.0;
    pub const SUBMERSION_PAD_FRACTION: f32 = 0.25;

    /// Spinner angle = initial + timestamp_ms * speed * SPIN_SCALE * direction
    pub const SPIN_SCALE: f64 = 0.05;

    /// Spawn layout
    pub const SPAWN_SPACING: f32 = 75.0;
    /// Full width of the random x jitter (±SPAWN_JITTER / 2)
    pub const SPAWN_JITTER: f32 = 15.0;
    /// Launch angle spread around straight up (radians, full width)
    pub const LAUNCH_SPREAD: f32 = 0.4;
    /// Distance of the default start zone from the bottom edge
    pub const START_ZONE_OFFSET: f32 = 60.0;

    /// Default finish sensor
    pub const FINISH_Y: f32 = 45.0;
    pub const FINISH_WIDTH: f32 = 120.0;
    pub const FINISH_HEIGHT: f32 = 40.0;

    /// Implicit rising floor (legacy levels without explicit hazards)
    pub const FLOOR_HEIGHT: f32 = 1200.0;

    /// Warning window before a delayed floor starts rising (ms)
    pub const FLOOR_WARNING_MS: f64 = 2000.0;
}

/// Convert degrees to radians
#[inline]
pub fn deg_to_rad(deg: f32) -> f32 {
    deg * std::f32::consts::PI / 180.0
}

/// Rotate a vector by `angle` radians (counter-clockwise in y-up, clockwise on screen)
#[inline]
pub fn rotate(v: Vec2, angle: f32) -> Vec2 {
    let (sin, cos) = angle.sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotate_quarter_turn() {
        let v = rotate(Vec2::new(1.0, 0.0), std::f32::consts::FRAC_PI_2);
        assert!(v.x.abs() < 1e-6);
        assert!((v.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_deg_to_rad() {
        assert!((deg_to_rad(180.0) - std::f32::consts::PI).abs() < 1e-6);
    }
}
