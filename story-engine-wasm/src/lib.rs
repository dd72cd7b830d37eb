//! WASM bindings for story-engine — drives the browser player.
//!
//! The page owns the DOM, the image loader and `requestAnimationFrame`; it
//! forwards input here, calls `tick` with elapsed milliseconds, and applies
//! the JSON render commands it drains after every call.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use story_engine::core::engine::{AssetError, StoryEngine};
use story_engine::core::input::{InputEvent, Key};
use story_engine::core::particles::{Particle, ParticleField};
use story_engine::core::render::LoadTicket;
use story_engine::schema::config::PlayerConfig;
use story_engine::schema::scene::{MinigameKind, SceneTable};

// ---------------------------------------------------------------------------
// Embedded story data — compiled into the WASM binary
// ---------------------------------------------------------------------------
mod data {
    pub const SCENES: &str = include_str!("../../story_data/scenes.ron");
    pub const PLAYER: &str = include_str!("../../story_data/player.ron");
}

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(Serialize)]
struct ParticleFrame<'a> {
    running: bool,
    generation: u64,
    particles: &'a [Particle],
}

#[derive(Serialize)]
struct StateInfo {
    scene: Option<String>,
    text_index: usize,
    history: Vec<String>,
    waiting_for_choice: bool,
    transitioning: bool,
    intro_showing: bool,
    ending_showing: bool,
    minigame_active: bool,
}

fn parse_game(name: &str) -> Result<MinigameKind, JsError> {
    MinigameKind::from_name(name).ok_or_else(|| JsError::new(&format!("Unknown minigame: {name}")))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsError> {
    serde_json::to_string(value).map_err(|e| JsError::new(&format!("Serialization error: {e}")))
}

// ---------------------------------------------------------------------------
// StoryPlayer — the main exported struct
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct StoryPlayer {
    engine: StoryEngine,
    width: f64,
    height: f64,
}

#[wasm_bindgen]
impl StoryPlayer {
    /// Create a player over the bundled story. `seed` drives the particles.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64) -> Result<StoryPlayer, JsError> {
        #[cfg(feature = "console_error_panic_hook")]
        console_error_panic_hook::set_once();

        let scenes = SceneTable::parse_ron(data::SCENES)
            .map_err(|e| JsError::new(&format!("Scene parse error: {e}")))?;
        let config = PlayerConfig::parse_ron(data::PLAYER)
            .map_err(|e| JsError::new(&format!("Config parse error: {e}")))?;

        let engine = StoryEngine::builder()
            .with_scenes(scenes)
            .with_config(config)
            .particle_seed(seed)
            .build()
            .map_err(|e| JsError::new(&format!("Engine build error: {e}")))?;

        Ok(StoryPlayer {
            engine,
            width: 1280.0,
            height: 720.0,
        })
    }

    /// Render the initial scene. Call once after the page is ready.
    pub fn start(&mut self) {
        self.engine.start();
    }

    /// Forward a `KeyboardEvent.key` (or `.code`). Returns whether it was consumed.
    pub fn key_down(&mut self, key: &str) -> bool {
        self.engine.dispatch(&InputEvent::KeyDown(Key::from_name(key)))
    }

    pub fn pointer_move(&mut self, x: f64) -> bool {
        self.engine.dispatch(&InputEvent::PointerMove {
            x,
            width: self.width,
        })
    }

    pub fn click(&mut self, x: f64) -> bool {
        self.engine.dispatch(&InputEvent::Click {
            x,
            width: self.width,
        })
    }

    pub fn dog_click(&mut self, index: usize) -> bool {
        self.engine.dispatch(&InputEvent::DogClick(index))
    }

    pub fn hotspot_click(&mut self, index: usize) -> bool {
        self.engine.dispatch(&InputEvent::HotspotClick(index))
    }

    /// Minigame restart button. `game` is "sleep", "dogs" or "evidence".
    pub fn minigame_restart(&mut self, game: &str) -> Result<bool, JsError> {
        let kind = parse_game(game)?;
        Ok(self.engine.dispatch(&InputEvent::RestartMinigame(kind)))
    }

    pub fn minigame_skip(&mut self, game: &str) -> Result<bool, JsError> {
        let kind = parse_game(game)?;
        Ok(self.engine.dispatch(&InputEvent::SkipMinigame(kind)))
    }

    pub fn ending_return(&mut self) -> bool {
        self.engine.dispatch(&InputEvent::EndingReturn)
    }

    /// Report the outcome of a `LoadBackground` command. Stale tickets are
    /// ignored; a failed load is logged and the scene continues.
    pub fn background_loaded(&mut self, ticket: u64, ok: bool, path: &str) -> bool {
        let result = if ok {
            Ok(())
        } else {
            Err(AssetError {
                path: path.to_string(),
                reason: "image failed to load".to_string(),
            })
        };
        self.engine.background_loaded(LoadTicket(ticket), result)
    }

    /// Advance virtual time by `ms`, firing due timers and minigame frames.
    pub fn tick(&mut self, ms: u64) {
        self.engine.advance(ms);
    }

    /// Take every render command emitted since the last drain, as a JSON array.
    pub fn drain_commands(&mut self) -> Result<String, JsError> {
        let commands = self.engine.drain_commands();
        to_json(&commands)
    }

    /// Step the particle field one frame and return its snapshot as JSON.
    pub fn particles_frame(&mut self) -> Result<String, JsError> {
        let particles = self.engine.particles_mut();
        particles.step();
        to_json(&ParticleFrame {
            running: particles.is_running(),
            generation: particles.generation(),
            particles: particles.particles(),
        })
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        self.engine.particles_mut().resize(width, height);
    }

    /// Return a JSON summary of the playback state, for debugging overlays.
    pub fn state(&self) -> Result<String, JsError> {
        let state = self.engine.state();
        to_json(&StateInfo {
            scene: state.current_scene.as_ref().map(|id| id.to_string()),
            text_index: state.text_index,
            history: state.history.iter().map(|id| id.to_string()).collect(),
            waiting_for_choice: state.waiting_for_choice,
            transitioning: state.is_transitioning,
            intro_showing: state.intro_showing,
            ending_showing: state.ending_showing,
            minigame_active: state.any_minigame_active(),
        })
    }

    /// Restart the story from the title scene.
    pub fn restart(&mut self) {
        self.engine.restart();
    }

    pub fn viewport_height(&self) -> f64 {
        self.height
    }
}
