//! Math Arcade - arithmetic arcade games for the browser
//!
//! Core modules:
//! - `sim`: Entities, shapes and the collision broad-phase
//! - `game`: Per-screen managers and the Asteroid Field screen
//! - `scene`: Retained draw list that entities push positions into
//! - `platform`: Keyboard input and image loading
//! - `config`: Data-driven tuning with LocalStorage overrides
//! - `renderer`, `audio`: Canvas 2D drawing and Web Audio tones (wasm32 only)

pub mod config;
pub mod game;
pub mod platform;
pub mod scene;
pub mod sim;

#[cfg(target_arch = "wasm32")]
pub mod audio;
#[cfg(target_arch = "wasm32")]
pub mod renderer;

pub use config::GameConfig;
pub use game::{AsteroidField, Feedback, Score};

/// Game configuration constants
pub mod consts {
    /// Arena dimensions in pixels
    pub const ARENA_WIDTH: f32 = 1500.0;
    pub const ARENA_HEIGHT: f32 = 900.0;

    /// Run speed relative to walk speed when no run speed is configured
    pub const RUN_MULTIPLIER: f32 = 2.0;

    /// Label blink period of a hit asteroid, ms
    pub const BLINK_PERIOD_MS: f64 = 100.0;

    /// Longest frame the driver feeds the simulation (tab switches, stalls), ms
    pub const MAX_FRAME_MS: f32 = 100.0;
}
