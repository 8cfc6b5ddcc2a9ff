//! Image preloading
//!
//! The only asynchronous boundary of the game. Loads have no timeout; a
//! failed load leaves the slot in `Failed` and its owner stays inert.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::{self, LocalBoxFuture};
use glam::Vec2;
use thiserror::Error;

/// Image load failure
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AssetError {
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },
    #[error("failed to decode {url}: {reason}")]
    Decode { url: String, reason: String },
    #[error("no asset registered for {url}")]
    Missing { url: String },
}

/// A decoded image, identified by its url
#[derive(Debug, Clone, PartialEq)]
pub struct ImageHandle {
    url: Rc<str>,
    size: Vec2,
}

impl ImageHandle {
    pub fn new(url: &str, width: f32, height: f32) -> Self {
        Self {
            url: Rc::from(url),
            size: Vec2::new(width, height),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Natural size in pixels
    pub fn size(&self) -> Vec2 {
        self.size
    }
}

/// Source of decoded images
pub trait AssetLoader {
    fn preload_image(&self, url: &str) -> LocalBoxFuture<'static, Result<ImageHandle, AssetError>>;
}

/// Progress of a single image load
#[derive(Debug, Clone, Default, PartialEq)]
pub enum LoadState {
    #[default]
    Idle,
    Pending,
    Loaded(ImageHandle),
    Failed(String),
}

/// Shared cell an owner polls for its sprite
#[derive(Debug, Clone, Default)]
pub struct ImageSlot(Rc<RefCell<LoadState>>);

impl ImageSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start loading `url`. The returned future writes the outcome into this
    /// slot; it may outlive the slot's owner, in which case the write lands in
    /// a slot nobody reads any more.
    pub fn load(&self, loader: &dyn AssetLoader, url: &str) -> LocalBoxFuture<'static, ()> {
        self.0.replace(LoadState::Pending);
        let slot = self.clone();
        let url = url.to_string();
        let pending = loader.preload_image(&url);

        async move {
            match pending.await {
                Ok(image) => {
                    log::info!(
                        "Loaded {} ({}x{})",
                        url,
                        image.size().x,
                        image.size().y
                    );
                    slot.0.replace(LoadState::Loaded(image));
                }
                Err(err) => {
                    log::error!("Image load failed: {}", err);
                    slot.0.replace(LoadState::Failed(err.to_string()));
                }
            }
        }
        .boxed_local()
    }

    /// Mark the slot loaded without going through a loader
    pub fn set_loaded(&self, image: ImageHandle) {
        self.0.replace(LoadState::Loaded(image));
    }

    pub fn state(&self) -> LoadState {
        self.0.borrow().clone()
    }

    pub fn image(&self) -> Option<ImageHandle> {
        match &*self.0.borrow() {
            LoadState::Loaded(image) => Some(image.clone()),
            _ => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(*self.0.borrow(), LoadState::Loaded(_))
    }
}

/// Resolves images from an in-memory manifest of sizes.
///
/// Used by native builds and tests; every load completes immediately.
#[derive(Debug, Clone, Default)]
pub struct PresetLoader {
    sizes: HashMap<String, Vec2>,
}

impl PresetLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, url: &str, width: f32, height: f32) -> Self {
        self.sizes.insert(url.to_string(), Vec2::new(width, height));
        self
    }
}

impl AssetLoader for PresetLoader {
    fn preload_image(&self, url: &str) -> LocalBoxFuture<'static, Result<ImageHandle, AssetError>> {
        let result = match self.sizes.get(url) {
            Some(size) => Ok(ImageHandle::new(url, size.x, size.y)),
            None => Err(AssetError::Missing {
                url: url.to_string(),
            }),
        };
        future::ready(result).boxed_local()
    }
}

/// Decoded `<img>` elements keyed by url, shared with the canvas renderer
#[cfg(target_arch = "wasm32")]
pub type ImageCache = Rc<RefCell<HashMap<String, web_sys::HtmlImageElement>>>;

/// Loads images through `HtmlImageElement::decode`
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Default)]
pub struct HtmlImageLoader {
    cache: ImageCache,
}

#[cfg(target_arch = "wasm32")]
impl HtmlImageLoader {
    pub fn new(cache: ImageCache) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }
}

#[cfg(target_arch = "wasm32")]
impl AssetLoader for HtmlImageLoader {
    fn preload_image(&self, url: &str) -> LocalBoxFuture<'static, Result<ImageHandle, AssetError>> {
        let cache = self.cache.clone();
        let url = url.to_string();

        async move {
            let img = web_sys::HtmlImageElement::new().map_err(|e| AssetError::Fetch {
                url: url.clone(),
                reason: format!("{:?}", e),
            })?;
            img.set_src(&url);
            wasm_bindgen_futures::JsFuture::from(img.decode())
                .await
                .map_err(|e| AssetError::Decode {
                    url: url.clone(),
                    reason: format!("{:?}", e),
                })?;

            let handle = ImageHandle::new(
                &url,
                img.natural_width() as f32,
                img.natural_height() as f32,
            );
            cache.borrow_mut().insert(url, img);
            Ok(handle)
        }
        .boxed_local()
    }
}
