//! Browser rendering
//!
//! Draws whatever the scene holds; the simulation never calls into here.

pub mod canvas;

pub use canvas::CanvasRenderer;
