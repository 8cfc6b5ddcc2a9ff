//! Player lifecycle and animation selection

use std::cell::RefCell;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use glam::Vec2;

use crate::config::PlayerConfig;
use crate::platform::{AssetLoader, ImageSlot, InputSource};
use crate::scene::Scene;
use crate::sim::{
    CollidableRef, CollisionManager, GameObject, ObjectId, Player, PlayerMovement, SharedModel,
};

/// Direction the sprite faces
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Facing {
    Left,
    Right,
    #[default]
    Up,
    Down,
}

impl Facing {
    fn as_str(self) -> &'static str {
        match self {
            Facing::Left => "left",
            Facing::Right => "right",
            Facing::Up => "up",
            Facing::Down => "down",
        }
    }
}

/// Animation clip chosen from the current movement intent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationState {
    Idle(Facing),
    Walk(Facing),
    Run(Facing),
    Jump(Facing),
}

impl Default for AnimationState {
    fn default() -> Self {
        AnimationState::Idle(Facing::default())
    }
}

impl AnimationState {
    /// Pick a clip. Jumping wins over moving; with no intent the previous
    /// facing is kept.
    pub fn select(velocity: Vec2, jumping: bool, running: bool, previous: Facing) -> Self {
        let facing = if velocity.x < 0.0 {
            Facing::Left
        } else if velocity.x > 0.0 {
            Facing::Right
        } else if velocity.y < 0.0 {
            Facing::Up
        } else if velocity.y > 0.0 {
            Facing::Down
        } else {
            previous
        };

        if jumping {
            AnimationState::Jump(facing)
        } else if velocity == Vec2::ZERO {
            AnimationState::Idle(facing)
        } else if running {
            AnimationState::Run(facing)
        } else {
            AnimationState::Walk(facing)
        }
    }

    pub fn facing(self) -> Facing {
        match self {
            AnimationState::Idle(f)
            | AnimationState::Walk(f)
            | AnimationState::Run(f)
            | AnimationState::Jump(f) => f,
        }
    }

    /// Clip name, e.g. `"walk-left"`
    pub fn name(self) -> String {
        let action = match self {
            AnimationState::Idle(_) => "idle",
            AnimationState::Walk(_) => "walk",
            AnimationState::Run(_) => "run",
            AnimationState::Jump(_) => "jump",
        };
        format!("{}-{}", action, self.facing().as_str())
    }
}

/// Owns the single player of a screen.
///
/// The player is created on the first update after its sprite has loaded.
pub struct PlayerManager {
    config: PlayerConfig,
    model: SharedModel,
    input: Rc<InputSource>,
    scene: Scene,
    arena: Vec2,
    collisions: Option<Rc<CollisionManager>>,
    sprite: ImageSlot,
    player: Option<Rc<RefCell<Player>>>,
    animation: Option<AnimationState>,
    disposed: bool,
}

impl PlayerManager {
    pub fn new(
        config: &PlayerConfig,
        model: SharedModel,
        input: Rc<InputSource>,
        scene: Scene,
        arena: Vec2,
        collisions: Option<Rc<CollisionManager>>,
    ) -> Self {
        Self {
            config: config.clone(),
            model,
            input,
            scene,
            arena,
            collisions,
            sprite: ImageSlot::new(),
            player: None,
            animation: None,
            disposed: false,
        }
    }

    /// Start loading the player sprite
    pub fn load(&self, loader: &dyn AssetLoader) -> LocalBoxFuture<'static, ()> {
        self.sprite.load(loader, &self.config.sprite_url)
    }

    pub fn sprite(&self) -> &ImageSlot {
        &self.sprite
    }

    fn create_player(&mut self) {
        let Some(image) = self.sprite.image() else {
            return;
        };

        let movement = PlayerMovement::new(
            self.model.clone(),
            self.input.clone(),
            &self.config.movement,
        );
        let player = Player::spawn(ObjectId::new("player"), movement, self.arena);
        let node = self.scene.add_sprite(&image, self.config.scale);
        player.borrow_mut().attach_node(Box::new(node));

        if let Some(collisions) = &self.collisions {
            collisions.register(player.borrow().collidable());
        }
        log::info!("Player created at {}", self.model.get());
        self.player = Some(player);
    }

    pub fn update(&mut self, dt_ms: f32) {
        if self.disposed {
            return;
        }
        if self.player.is_none() && self.sprite.is_loaded() {
            self.create_player();
        }
        let Some(player) = &self.player else {
            return;
        };

        let mut player = player.borrow_mut();
        player.update(dt_ms);

        let movement = player.movement();
        let velocity = Vec2::new(movement.velocity_x(), movement.velocity_y());
        let previous = self.animation.map(|a| a.facing()).unwrap_or_default();
        let next = AnimationState::select(
            velocity,
            movement.is_jumping(),
            movement.is_running(),
            previous,
        );
        if self.animation != Some(next) {
            player.play_animation(&next.name());
            self.animation = Some(next);
        }
    }

    pub fn player(&self) -> Option<&Rc<RefCell<Player>>> {
        self.player.as_ref()
    }

    pub fn player_collidable(&self) -> Option<CollidableRef> {
        self.player.as_ref().map(|p| p.borrow().collidable().clone())
    }

    pub fn animation(&self) -> Option<AnimationState> {
        self.animation
    }

    pub fn model(&self) -> &SharedModel {
        &self.model
    }

    /// Center of the player's top edge, where shots leave from
    pub fn muzzle(&self) -> Option<Vec2> {
        let player = self.player.as_ref()?.borrow();
        Some(player.model() - Vec2::new(0.0, player.half_extents().y))
    }

    pub fn dispose(&mut self) {
        if let Some(player) = self.player.take() {
            if let Some(collisions) = &self.collisions {
                collisions.unregister(player.borrow().collidable());
            }
            player.borrow_mut().dispose();
        }
        self.animation = None;
        self.disposed = true;
    }
}
