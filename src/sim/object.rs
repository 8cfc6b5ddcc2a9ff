//! Game object capability
//!
//! Every simulated entity is shared as `Rc<RefCell<_>>` so that managers,
//! collidables and collision hooks can all reach it within a frame. The
//! simulation is single-threaded; nothing here is `Send`.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use glam::Vec2;

use super::collision::CollisionError;

/// A model position shared between a screen, its manager and the entity.
///
/// Only the entity's own `update` writes it during a tick; everyone else reads.
pub type SharedModel = Rc<Cell<Vec2>>;

/// Build a fresh shared model
pub fn shared_model(pos: Vec2) -> SharedModel {
    Rc::new(Cell::new(pos))
}

/// Type-erased handle to a live entity
pub type ObjectRef = Rc<RefCell<dyn GameObject>>;

/// Stable entity identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectId(String);

impl ObjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// `"{prefix}-{n}"`, as allocated by the managers
    pub fn numbered(prefix: &str, n: u32) -> Self {
        Self(format!("{prefix}-{n}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Entity variants the collision handlers tell apart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Player,
    Projectile,
    Asteroid,
}

/// Reaction to an overlap reported by the collision manager.
///
/// Entities without a reaction keep the default no-op.
pub trait Collider {
    fn on_collision(&mut self, _other: &ObjectRef) -> Result<(), CollisionError> {
        Ok(())
    }
}

/// Identity, model position, visibility and lifecycle of an entity
pub trait GameObject: Collider {
    fn id(&self) -> &ObjectId;

    fn kind(&self) -> ObjectKind;

    /// Authoritative position
    fn model(&self) -> Vec2;

    fn is_visible(&self) -> bool;

    fn set_visible(&mut self, visible: bool);

    /// Advance by `dt_ms` milliseconds
    fn update(&mut self, dt_ms: f32);

    /// Release the attached renderable; the entity is inert afterwards
    fn dispose(&mut self);

    fn is_destroyed(&self) -> bool {
        false
    }

    /// Entity this one was used up on, for single-use objects such as shots
    fn spent_on(&self) -> Option<&ObjectId> {
        None
    }
}
