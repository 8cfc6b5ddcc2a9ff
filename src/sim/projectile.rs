//! Constant-velocity projectile
//!
//! Alive until it leaves its bounds or is destroyed; destruction is one-way.
//! What a hit means is decided by whoever installs the collision hook.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use glam::Vec2;

use super::collidable::{Collidable, CollidableRef};
use super::collision::CollisionError;
use super::object::{Collider, GameObject, ObjectId, ObjectKind, ObjectRef};
use crate::scene::Renderable;

/// Collision reaction installed by the owning manager
pub type ProjectileHook = Box<dyn FnMut(&mut Projectile, &ObjectRef) -> Result<(), CollisionError>>;

/// Launch parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileSpec {
    pub origin: Vec2,
    /// Normalized on construction
    pub direction: Vec2,
    /// Pixels per second
    pub speed: f32,
    /// Width and height of the region the projectile may occupy
    pub bounds: Vec2,
}

pub struct Projectile {
    id: ObjectId,
    kind: ObjectKind,
    model: Vec2,
    visible: bool,
    node: Option<Box<dyn Renderable>>,
    speed: f32,
    direction: Vec2,
    bounds: Vec2,
    half_extents: Vec2,
    destroyed: bool,
    spent_on: Option<ObjectId>,
    collidable: CollidableRef,
    on_collision: Option<ProjectileHook>,
}

impl Projectile {
    pub fn spawn(id: ObjectId, kind: ObjectKind, spec: ProjectileSpec) -> Rc<RefCell<Projectile>> {
        Rc::new_cyclic(|me: &Weak<RefCell<Projectile>>| {
            let owner: Weak<RefCell<dyn GameObject>> = me.clone();
            RefCell::new(Projectile {
                id,
                kind,
                model: spec.origin,
                visible: true,
                node: None,
                speed: spec.speed,
                direction: spec.direction.normalize_or_zero(),
                bounds: spec.bounds,
                half_extents: Vec2::ZERO,
                destroyed: false,
                spent_on: None,
                collidable: Collidable::new(owner).into_ref(),
                on_collision: None,
            })
        })
    }

    /// Attach the visual; its rendered size becomes the hitbox.
    /// An unmeasurable node leaves a point-sized hitbox.
    pub fn attach_node(&mut self, node: Box<dyn Renderable>) {
        match node.rendered_size() {
            Ok(size) => self.half_extents = size / 2.0,
            Err(err) => log::debug!("{}: cannot measure node ({})", self.id, err),
        }
        self.node = Some(node);
        let size = self.half_extents * 2.0;
        self.collidable.borrow_mut().set_rect(
            self.model.x - self.half_extents.x,
            self.model.y - self.half_extents.y,
            size.x,
            size.y,
        );
        self.sync_node();
    }

    pub fn set_on_collision(&mut self, hook: ProjectileHook) {
        self.on_collision = Some(hook);
    }

    /// Force the terminal state. Idempotent.
    pub fn destroy(&mut self) {
        self.destroyed = true;
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Destroy as used up on `target`. No effect once destroyed.
    pub fn spend_on(&mut self, target: ObjectId) {
        if self.destroyed {
            return;
        }
        self.spent_on = Some(target);
        self.destroyed = true;
    }

    pub fn direction(&self) -> Vec2 {
        self.direction
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn half_extents(&self) -> Vec2 {
        self.half_extents
    }

    pub fn collidable(&self) -> &CollidableRef {
        &self.collidable
    }

    pub fn node_mut(&mut self) -> Option<&mut (dyn Renderable + 'static)> {
        self.node.as_deref_mut()
    }

    /// Whether the hitbox lies entirely outside the bounds on some axis
    fn out_of_bounds(&self) -> bool {
        let min = self.model - self.half_extents;
        let max = self.model + self.half_extents;
        max.x < 0.0 || max.y < 0.0 || min.x > self.bounds.x || min.y > self.bounds.y
    }

    fn sync_node(&mut self) {
        let pos = self.model;
        if let Some(node) = self.node.as_mut() {
            node.set_position(pos);
        }
    }
}

impl Collider for Projectile {
    fn on_collision(&mut self, other: &ObjectRef) -> Result<(), CollisionError> {
        let Some(mut hook) = self.on_collision.take() else {
            return Ok(());
        };
        let result = hook(&mut *self, other);
        // The hook may have installed a replacement
        if self.on_collision.is_none() {
            self.on_collision = Some(hook);
        }
        result
    }
}

impl GameObject for Projectile {
    fn id(&self) -> &ObjectId {
        &self.id
    }

    fn kind(&self) -> ObjectKind {
        self.kind
    }

    fn model(&self) -> Vec2 {
        self.model
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        if let Some(node) = self.node.as_mut() {
            node.set_visible(visible);
        }
    }

    fn update(&mut self, dt_ms: f32) {
        if self.destroyed {
            return;
        }
        self.model += self.direction * self.speed * (dt_ms / 1000.0);
        if self.out_of_bounds() {
            // The node stays where it was; the owning manager removes it.
            self.destroyed = true;
            return;
        }
        self.sync_node();
        self.collidable.borrow_mut().center_on(self.model);
    }

    fn dispose(&mut self) {
        self.destroyed = true;
        self.on_collision = None;
        if let Some(mut node) = self.node.take() {
            node.destroy();
        }
        self.collidable.borrow_mut().clear_shape();
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    fn spent_on(&self) -> Option<&ObjectId> {
        self.spent_on.as_ref()
    }
}
