/// Player configuration — timing constants and minigame tuning, loaded from RON.
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use super::scene::{Hotspot, SceneId};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Durations in milliseconds of virtual time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    /// Fade-out length before a requested scene is rendered.
    pub transition_ms: u64,
    /// Default display time of an intro image.
    pub intro_show_ms: u64,
    pub intro_fade_ms: u64,
    /// How long a fading intro overlay stays mounted once a transition starts.
    pub intro_overlay_hide_ms: u64,
    /// Fade-in after the background image has loaded.
    pub background_fade_ms: u64,
    /// Fixed timestep of minigame loops.
    pub frame_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            transition_ms: 1000,
            intro_show_ms: 4500,
            intro_fade_ms: 500,
            intro_overlay_hide_ms: 800,
            background_fade_ms: 50,
            frame_ms: 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SleepTuning {
    pub initial_speed: f64,
    /// Added to the speed after every frame.
    pub acceleration: f64,
    /// Darkness removed by one player action.
    pub relief: f64,
    pub duration_ms: u64,
    /// Darkness at which the eyelids start to close.
    pub eyelid_threshold: f64,
}

impl Default for SleepTuning {
    fn default() -> Self {
        Self {
            initial_speed: 0.005,
            acceleration: 0.00002,
            relief: 0.2,
            duration_ms: 10_000,
            eyelid_threshold: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DogsTuning {
    pub count: usize,
    pub rage_per_second: f64,
    pub max_rage: f64,
    /// Rage removed by one click on a dog.
    pub calm_amount: f64,
    pub duration_ms: u64,
}

impl Default for DogsTuning {
    fn default() -> Self {
        Self {
            count: 3,
            rage_per_second: 12.0,
            max_rage: 100.0,
            calm_amount: 10.0,
            duration_ms: 15_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvidenceTuning {
    /// Used when an evidence scene does not list its own hotspots.
    pub default_hotspots: Vec<Hotspot>,
}

impl Default for EvidenceTuning {
    fn default() -> Self {
        let spot = |x: &str, y: &str, description: &str| Hotspot {
            x: x.to_string(),
            y: y.to_string(),
            description: description.to_string(),
        };
        Self {
            default_hotspots: vec![
                spot("25%", "40%", "A kicked-in gate. One precise blow knocked it off the latch."),
                spot("45%", "55%", "Muddy footprints, many of them. A group came in from the tree line."),
                spot("60%", "35%", "Snapped branches and bloodied leaves. It happened in the thicket."),
                spot("70%", "65%", "A wallet and a phone by the gate. Nobody bothered to take them."),
                spot("85%", "50%", "The garage door is ajar. A balaclava lies beside it."),
            ],
        }
    }
}

/// Everything about the player that is not scene content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub initial_scene: SceneId,
    /// Where an intro image without `next` leads.
    pub intro_fallback: SceneId,
    pub timing: Timing,
    pub sleep: SleepTuning,
    pub dogs: DogsTuning,
    pub evidence: EvidenceTuning,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            initial_scene: SceneId::from("scene_1"),
            intro_fallback: SceneId::from("scene_2"),
            timing: Timing::default(),
            sleep: SleepTuning::default(),
            dogs: DogsTuning::default(),
            evidence: EvidenceTuning::default(),
        }
    }
}

impl PlayerConfig {
    /// Load a config from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<PlayerConfig, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a config from a RON string. Missing fields take their defaults.
    pub fn parse_ron(input: &str) -> Result<PlayerConfig, ConfigError> {
        let config: PlayerConfig = ron::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timing.frame_ms == 0 {
            return Err(ConfigError::Invalid("timing.frame_ms must be positive".to_string()));
        }
        if self.dogs.count == 0 {
            return Err(ConfigError::Invalid("dogs.count must be positive".to_string()));
        }
        if self.dogs.max_rage <= 0.0 {
            return Err(ConfigError::Invalid("dogs.max_rage must be positive".to_string()));
        }
        if self.evidence.default_hotspots.is_empty() {
            return Err(ConfigError::Invalid(
                "evidence.default_hotspots must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
