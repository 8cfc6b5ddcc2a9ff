//! Player entity
//!
//! Owns its movement and collidable; shares its model with the screen that
//! created it. The model is clamped so the sprite never leaves the arena.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use glam::Vec2;

use super::collidable::{Collidable, CollidableRef};
use super::movement::PlayerMovement;
use super::object::{Collider, GameObject, ObjectId, ObjectKind, SharedModel};
use super::shape::Shape;
use crate::scene::Renderable;

pub struct Player {
    id: ObjectId,
    model: SharedModel,
    visible: bool,
    node: Option<Box<dyn Renderable>>,
    movement: PlayerMovement,
    collidable: CollidableRef,
    half_extents: Vec2,
    arena: Vec2,
}

impl Player {
    /// Build a player whose model is the movement's shared model
    pub fn spawn(id: ObjectId, movement: PlayerMovement, arena: Vec2) -> Rc<RefCell<Player>> {
        Rc::new_cyclic(|me: &Weak<RefCell<Player>>| {
            let owner: Weak<RefCell<dyn GameObject>> = me.clone();
            RefCell::new(Player {
                id,
                model: movement.model().clone(),
                visible: true,
                node: None,
                movement,
                collidable: Collidable::new(owner).into_ref(),
                half_extents: Vec2::ZERO,
                arena,
            })
        })
    }

    /// Attach the visual and derive half-extents from its rendered size.
    ///
    /// A node that cannot be measured yet leaves the half-extents at zero;
    /// `update` keeps retrying until it can.
    pub fn attach_node(&mut self, node: Box<dyn Renderable>) {
        self.node = Some(node);
        self.measure();
        self.sync();
    }

    fn measure(&mut self) -> bool {
        let Some(node) = self.node.as_ref() else {
            return false;
        };
        match node.rendered_size() {
            Ok(size) => {
                self.half_extents = size / 2.0;
                true
            }
            Err(err) => {
                log::debug!("{}: cannot measure node yet ({})", self.id, err);
                false
            }
        }
    }

    fn clamp_to_arena(&mut self) {
        let pos = self.model.get();
        let min = self.half_extents;
        let max = self.arena - self.half_extents;
        // max() before min() so a sprite wider than the arena pins to the far edge
        let clamped = pos.max(min).min(max);
        self.model.set(clamped);
    }

    fn sync(&mut self) {
        let pos = self.model.get();
        if let Some(node) = self.node.as_mut() {
            node.set_position(pos);
        }
        self.collidable.borrow_mut().set_rect(
            pos.x - self.half_extents.x,
            pos.y - self.half_extents.y,
            self.half_extents.x * 2.0,
            self.half_extents.y * 2.0,
        );
    }

    pub fn movement(&self) -> &PlayerMovement {
        &self.movement
    }

    pub fn movement_mut(&mut self) -> &mut PlayerMovement {
        &mut self.movement
    }

    pub fn collidable(&self) -> &CollidableRef {
        &self.collidable
    }

    pub fn half_extents(&self) -> Vec2 {
        self.half_extents
    }

    pub fn shared_model(&self) -> &SharedModel {
        &self.model
    }

    /// Hitbox in arena coordinates
    pub fn hitbox(&self) -> Option<Shape> {
        self.collidable.borrow().shape()
    }

    pub fn play_animation(&mut self, name: &str) {
        if let Some(node) = self.node.as_mut() {
            node.play(name);
        }
    }
}

impl Collider for Player {}

impl GameObject for Player {
    fn id(&self) -> &ObjectId {
        &self.id
    }

    fn kind(&self) -> ObjectKind {
        ObjectKind::Player
    }

    fn model(&self) -> Vec2 {
        self.model.get()
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
        if self.half_extents == Vec2::ZERO {
            self.measure();
        }
        self.movement.update(dt_ms);
        self.clamp_to_arena();
        self.sync();
    }

    fn dispose(&mut self) {
        self.movement.set_enabled(false);
        if let Some(mut node) = self.node.take() {
            node.destroy();
        }
        self.collidable.borrow_mut().clear_shape();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MovementConfig;
    use crate::platform::{ImageHandle, InputSource};
    use crate::scene::Scene;
    use crate::sim::object::shared_model;

    fn player_at(pos: Vec2, input: &Rc<InputSource>) -> Rc<RefCell<Player>> {
        let movement = PlayerMovement::new(
            shared_model(pos),
            input.clone(),
            &MovementConfig {
                walk_speed: 300.0,
                ..Default::default()
            },
        );
        Player::spawn(ObjectId::new("player"), movement, Vec2::new(1500.0, 900.0))
    }

    #[test]
    fn test_attach_node_derives_hitbox() {
        let input = Rc::new(InputSource::new());
        let scene = Scene::new();
        let player = player_at(Vec2::new(100.0, 100.0), &input);
        let node = scene.add_sprite(&ImageHandle::new("ship.png", 40.0, 30.0), 1.0);
        player.borrow_mut().attach_node(Box::new(node.clone()));

        let p = player.borrow();
        assert_eq!(p.half_extents(), Vec2::new(20.0, 15.0));
        assert_eq!(p.hitbox(), Some(Shape::rect(80.0, 85.0, 40.0, 30.0)));
        assert_eq!(node.position(), Vec2::new(100.0, 100.0));
    }

    #[test]
    fn test_unmeasured_node_heals_on_update() {
        let input = Rc::new(InputSource::new());
        let scene = Scene::new();
        let player = player_at(Vec2::new(100.0, 100.0), &input);
        let mut label = scene.add_label("not a sprite");
        player.borrow_mut().attach_node(Box::new(label.clone()));
        assert_eq!(player.borrow().half_extents(), Vec2::ZERO);

        // Swap in something measurable and let update pick it up
        label.destroy();
        let sprite = scene.add_sprite(&ImageHandle::new("ship.png", 10.0, 10.0), 2.0);
        player.borrow_mut().node = Some(Box::new(sprite));
        player.borrow_mut().update(0.0);
        assert_eq!(player.borrow().half_extents(), Vec2::new(10.0, 10.0));
    }

    #[test]
    fn test_clamp_settles_on_left_edge() {
        let input = Rc::new(InputSource::new());
        let scene = Scene::new();
        let player = player_at(Vec2::new(60.0, 450.0), &input);
        let node = scene.add_sprite(&ImageHandle::new("ship.png", 40.0, 40.0), 1.0);
        player.borrow_mut().attach_node(Box::new(node));

        input.key_down("ArrowLeft");
        for _ in 0..30 {
            player.borrow_mut().update(16.0);
            assert!(player.borrow().model().x >= 20.0);
        }
        assert_eq!(player.borrow().model().x, 20.0);
    }

    #[test]
    fn test_clamp_bottom_right() {
        let input = Rc::new(InputSource::new());
        let scene = Scene::new();
        let player = player_at(Vec2::new(1490.0, 890.0), &input);
        let node = scene.add_sprite(&ImageHandle::new("ship.png", 40.0, 40.0), 1.0);
        player.borrow_mut().attach_node(Box::new(node));

        input.key_down("d");
        input.key_down("s");
        player.borrow_mut().update(100.0);
        assert_eq!(player.borrow().model(), Vec2::new(1480.0, 880.0));
    }

    #[test]
    fn test_update_writes_shared_model() {
        let input = Rc::new(InputSource::new());
        let player = player_at(Vec2::new(500.0, 500.0), &input);
        let shared = player.borrow().shared_model().clone();
        input.key_down("ArrowRight");
        player.borrow_mut().update(1000.0);
        assert!((shared.get().x - 800.0).abs() < 0.001);
    }

    #[test]
    fn test_dispose_removes_node() {
        let input = Rc::new(InputSource::new());
        let scene = Scene::new();
        let player = player_at(Vec2::new(100.0, 100.0), &input);
        let node = scene.add_sprite(&ImageHandle::new("ship.png", 40.0, 40.0), 1.0);
        player.borrow_mut().attach_node(Box::new(node.clone()));
        player.borrow_mut().dispose();

        assert!(node.is_removed());
        assert_eq!(player.borrow().hitbox(), None);
        assert!(!player.borrow().movement().is_enabled());
    }
}
