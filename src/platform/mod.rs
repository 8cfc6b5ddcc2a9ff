//! Platform boundary
//!
//! The simulation only ever talks to the browser through these types:
//! - `input`: keyboard state and debounced presses
//! - `assets`: asynchronous image loading

pub mod assets;
pub mod input;

pub use assets::{AssetError, AssetLoader, ImageHandle, ImageSlot, LoadState, PresetLoader};
pub use input::{InputSource, normalize_key};

#[cfg(target_arch = "wasm32")]
pub use assets::{HtmlImageLoader, ImageCache};
