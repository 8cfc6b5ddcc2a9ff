//! Shape wrapper bound to one owning entity

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use glam::Vec2;

use super::object::{GameObject, ObjectRef};
use super::shape::Shape;

/// Shared handle; the owning entity and the collision manager both hold one
pub type CollidableRef = Rc<RefCell<Collidable>>;

/// A nullable shape plus a weak link back to the entity that owns it.
///
/// No collision is reported until a shape is set.
#[derive(Debug, Default)]
pub struct Collidable {
    owner: Option<Weak<RefCell<dyn GameObject>>>,
    shape: Option<Shape>,
}

impl Collidable {
    pub fn new(owner: Weak<RefCell<dyn GameObject>>) -> Self {
        Self {
            owner: Some(owner),
            shape: None,
        }
    }

    /// A collidable with no owner; hooks are never dispatched for it
    pub fn unowned() -> Self {
        Self::default()
    }

    pub fn into_ref(self) -> CollidableRef {
        Rc::new(RefCell::new(self))
    }

    /// Owning entity, if it is still alive
    pub fn owner(&self) -> Option<ObjectRef> {
        self.owner.as_ref().and_then(Weak::upgrade)
    }

    pub fn shape(&self) -> Option<Shape> {
        self.shape
    }

    pub fn set_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.shape = Some(Shape::rect(x, y, w, h));
    }

    pub fn set_circle(&mut self, x: f32, y: f32, r: f32) {
        self.shape = Some(Shape::circle(x, y, r));
    }

    pub fn clear_shape(&mut self) {
        self.shape = None;
    }

    /// Move the current shape so it is centered on `center`
    pub fn center_on(&mut self, center: Vec2) {
        if let Some(shape) = self.shape.as_mut() {
            *shape = shape.centered_at(center);
        }
    }

    pub fn intersects(&self, other: &Collidable) -> bool {
        match (&self.shape, &other.shape) {
            (Some(a), Some(b)) => a.intersects(b),
            _ => false,
        }
    }
}
