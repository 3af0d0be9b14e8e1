//! Browser bindings
//!
//! A thin `wasm_bindgen` wrapper around [`Simulation`]. Structured arguments
//! and results cross the boundary as JSON strings.

use wasm_bindgen::prelude::*;

use crate::config::{ConfigUpdate, RaceConfig};
use crate::sim::{LevelData, PlayerColor, Simulation};

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    // Fails only when a logger is already installed, which then keeps working
    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        log::warn!("Logger not replaced: {}", e);
    }
    log::info!("Bounce Race starting...");
}

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// A race instance owned by the page
#[wasm_bindgen]
pub struct RaceHandle {
    sim: Simulation,
}

#[wasm_bindgen]
impl RaceHandle {
    /// `config_json` is a full `RaceConfig`; omitted fields take defaults
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<RaceHandle, JsValue> {
        let config = match config_json {
            Some(json) => RaceConfig::from_json(&json).map_err(to_js)?,
            None => RaceConfig::default(),
        };
        // Seeded from the clock so races differ between page loads
        let seed = js_sys::Date::now() as u64;
        Ok(Self {
            sim: Simulation::with_seed(config, seed),
        })
    }

    /// Merge a partial config (`ConfigUpdate` JSON)
    #[wasm_bindgen(js_name = updateConfig)]
    pub fn update_config(&mut self, json: &str) -> Result<(), JsValue> {
        let update = ConfigUpdate::from_json(json).map_err(to_js)?;
        self.sim.update_config(update);
        Ok(())
    }

    /// Install a level written by the editor
    #[wasm_bindgen(js_name = loadLevel)]
    pub fn load_level(&mut self, json: &str) -> Result<(), JsValue> {
        let level = LevelData::from_json(json).map_err(to_js)?;
        self.sim.load_level(level);
        Ok(())
    }

    /// Start a race with a JSON array of `{ name, hex, symbol, image? }`
    #[wasm_bindgen(js_name = spawnPlayers)]
    pub fn spawn_players(&mut self, colors_json: &str) -> Result<(), JsValue> {
        let colors: Vec<PlayerColor> = serde_json::from_str(colors_json).map_err(to_js)?;
        self.sim.spawn_players(&colors);
        Ok(())
    }

    /// `callback(colorName)` is invoked once per race when a player finishes
    #[wasm_bindgen(js_name = onWin)]
    pub fn on_win(&mut self, callback: js_sys::Function) {
        self.sim.on_win(move |color| {
            if let Err(e) = callback.call1(&JsValue::NULL, &JsValue::from_str(color)) {
                log::error!("Win callback failed: {:?}", e);
            }
        });
    }

    pub fn tick(&mut self) {
        self.sim.tick();
    }

    #[wasm_bindgen(js_name = forceEnd)]
    pub fn force_end(&mut self) {
        self.sim.force_end();
    }

    pub fn cleanup(&mut self) {
        self.sim.cleanup();
    }

    /// Current `Snapshot` as JSON
    pub fn snapshot(&self) -> Result<String, JsValue> {
        self.sim.snapshot().to_json().map_err(to_js)
    }

    /// Events since the last call, as a JSON array
    #[wasm_bindgen(js_name = drainEvents)]
    pub fn drain_events(&mut self) -> Result<String, JsValue> {
        serde_json::to_string(&self.sim.drain_events()).map_err(to_js)
    }

    pub fn scoreboard(&self) -> Result<String, JsValue> {
        self.sim.scoreboard().to_json().map_err(to_js)
    }

    /// Restore a scoreboard saved by the page
    #[wasm_bindgen(js_name = loadScoreboard)]
    pub fn load_scoreboard(&mut self, json: &str) -> Result<(), JsValue> {
        *self.sim.scoreboard_mut() = crate::Scoreboard::from_json(json).map_err(to_js)?;
        Ok(())
    }
}
