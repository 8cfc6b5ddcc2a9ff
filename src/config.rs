//! Game configuration
//!
//! Every section carries `#[serde(default)]`, so a partial JSON document only
//! overrides what it names. Persisted overrides live in LocalStorage on web.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{ARENA_HEIGHT, ARENA_WIDTH, RUN_MULTIPLIER};

/// Configuration could not be read
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Key names per movement action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub up: Vec<String>,
    pub down: Vec<String>,
    pub left: Vec<String>,
    pub right: Vec<String>,
    pub run: Vec<String>,
    pub jump: Vec<String>,
}

fn keys(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            up: keys(&["ArrowUp", "w"]),
            down: keys(&["ArrowDown", "s"]),
            left: keys(&["ArrowLeft", "a"]),
            right: keys(&["ArrowRight", "d"]),
            run: keys(&["Shift"]),
            jump: keys(&["j"]),
        }
    }
}

/// Input-driven movement tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Pixels per second while walking
    pub walk_speed: f32,
    /// Pixels per second while a run key is held (walk × 2 when unset)
    pub run_speed: Option<f32>,
    pub keys: KeyBindings,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            walk_speed: 300.0,
            run_speed: None,
            keys: KeyBindings::default(),
        }
    }
}

impl MovementConfig {
    pub fn effective_run_speed(&self) -> f32 {
        self.run_speed
            .unwrap_or(self.walk_speed * RUN_MULTIPLIER)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            width: ARENA_WIDTH,
            height: ARENA_HEIGHT,
        }
    }
}

impl ArenaConfig {
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub sprite_url: String,
    pub scale: f32,
    pub start: Vec2,
    pub movement: MovementConfig,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            sprite_url: "assets/ship.png".to_string(),
            scale: 1.0,
            start: Vec2::new(ARENA_WIDTH / 2.0, ARENA_HEIGHT - 100.0),
            movement: MovementConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileConfig {
    pub sprite_url: String,
    pub scale: f32,
    /// Pixels per second
    pub speed: f32,
    /// Default firing direction (normalized on use)
    pub direction: Vec2,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            sprite_url: "assets/laser.png".to_string(),
            scale: 1.0,
            speed: 600.0,
            direction: Vec2::new(0.0, -1.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsteroidConfig {
    pub sprite_url: String,
    pub scale: f32,
    /// Fall speed, pixels per second
    pub speed: f32,
    pub spawn_interval_ms: f32,
    /// Largest value an asteroid can carry
    pub max_value: u32,
    /// Number whose factors and multiples count as correct
    pub target: u32,
    /// How long a hit asteroid's label lingers
    pub flash_ms: f32,
    /// Collision radius (half the rendered sprite width when unset)
    pub hit_radius: Option<f32>,
}

impl Default for AsteroidConfig {
    fn default() -> Self {
        Self {
            sprite_url: "assets/asteroid.png".to_string(),
            scale: 1.0,
            speed: 90.0,
            spawn_interval_ms: 2000.0,
            max_value: 50,
            target: 12,
            flash_ms: 400.0,
            hit_radius: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub fire_key: String,
    pub fire_cooldown_ms: f64,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            fire_key: "space".to_string(),
            fire_cooldown_ms: 250.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub correct_points: i64,
    /// Added on a wrong hit (negative)
    pub wrong_points: i64,
    pub lives: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            correct_points: 10,
            wrong_points: -5,
            lives: 3,
        }
    }
}

/// Full configuration tree for the Asteroid Field screen
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub arena: ArenaConfig,
    pub player: PlayerConfig,
    pub projectile: ProjectileConfig,
    pub asteroid: AsteroidConfig,
    pub controls: ControlsConfig,
    pub scoring: ScoringConfig,
}

impl GameConfig {
    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "math_arcade_config";

    /// Parse a (possibly partial) JSON document over the defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load overrides from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(config) => {
                        log::info!("Loaded config overrides from LocalStorage");
                        return config;
                    }
                    Err(err) => log::warn!("Ignoring stored config: {}", err),
                }
            }
        }

        log::info!("Using default config");
        Self::default()
    }

    /// Native stub
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }
}
