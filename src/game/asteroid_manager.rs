//! Falling number asteroids
//!
//! Each asteroid carries a value that is either a factor or multiple of the
//! current target ("correct") or not. Hits and misses are reported through
//! `AsteroidCallbacks` from inside the tick that caused them.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::config::AsteroidConfig;
use crate::consts::BLINK_PERIOD_MS;
use crate::platform::{AssetLoader, ImageSlot};
use crate::scene::{Renderable, Scene, SceneNode};
use crate::sim::{
    CollisionError, CollisionManager, GameObject, ObjectId, ObjectKind, ObjectRef, Projectile,
    ProjectileHook, ProjectileSpec,
};

/// `value` divides `target` or is divisible by it. Nothing is correct for a
/// zero target.
pub fn is_correct_value(target: u32, value: u32) -> bool {
    if target == 0 || value == 0 {
        return false;
    }
    target % value == 0 || value % target == 0
}

/// Value for the `index`-th spawn (0-based).
///
/// Every third spawn, starting with the first, is drawn from the correct
/// values in `1..=max`; the rest are uniform over `1..=max`.
pub fn pick_value<R: Rng + ?Sized>(rng: &mut R, index: u32, target: u32, max: u32) -> u32 {
    let max = max.max(1);
    if index % 3 == 0 {
        let candidates: Vec<u32> = (1..=max).filter(|&v| is_correct_value(target, v)).collect();
        if !candidates.is_empty() {
            return candidates[rng.random_range(0..candidates.len())];
        }
    }
    rng.random_range(1..=max)
}

/// Outcome callbacks. The flag is whether the asteroid's value was correct.
pub struct AsteroidCallbacks {
    pub on_hit: Box<dyn FnMut(bool)>,
    pub on_reached_bottom: Box<dyn FnMut(bool)>,
}

impl Default for AsteroidCallbacks {
    fn default() -> Self {
        Self {
            on_hit: Box::new(|_| {}),
            on_reached_bottom: Box::new(|_| {}),
        }
    }
}

struct Asteroid {
    body: Rc<RefCell<Projectile>>,
    label: SceneNode,
    value: u32,
    correct: bool,
    /// Clock time after which a hit asteroid's label disappears
    flash_until: Rc<Cell<Option<f64>>>,
    registered: bool,
    reported: bool,
}

/// Read-only view of a live asteroid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AsteroidInfo {
    pub position: Vec2,
    pub value: u32,
    pub correct: bool,
    pub destroyed: bool,
    pub flashing: bool,
}

pub struct AsteroidManager {
    config: AsteroidConfig,
    arena: Vec2,
    scene: Scene,
    collisions: Rc<CollisionManager>,
    sprite: ImageSlot,
    callbacks: Rc<RefCell<AsteroidCallbacks>>,
    rng: Pcg32,
    target: u32,
    asteroids: Vec<Asteroid>,
    spawn_timer: f32,
    spawn_count: u32,
    clock: Rc<Cell<f64>>,
    disposed: bool,
}

impl AsteroidManager {
    pub fn new(
        config: &AsteroidConfig,
        arena: Vec2,
        scene: Scene,
        collisions: Rc<CollisionManager>,
        callbacks: AsteroidCallbacks,
        seed: u64,
    ) -> Self {
        Self {
            config: config.clone(),
            arena,
            scene,
            collisions,
            sprite: ImageSlot::new(),
            callbacks: Rc::new(RefCell::new(callbacks)),
            rng: Pcg32::seed_from_u64(seed),
            target: config.target,
            asteroids: Vec::new(),
            spawn_timer: 0.0,
            spawn_count: 0,
            clock: Rc::new(Cell::new(0.0)),
            disposed: false,
        }
    }

    pub fn load(&self, loader: &dyn AssetLoader) -> LocalBoxFuture<'static, ()> {
        self.sprite.load(loader, &self.config.sprite_url)
    }

    pub fn sprite(&self) -> &ImageSlot {
        &self.sprite
    }

    pub fn target(&self) -> u32 {
        self.target
    }

    /// Applies to asteroids spawned from now on
    pub fn set_target(&mut self, target: u32) {
        self.target = target;
    }

    pub fn spawn_count(&self) -> u32 {
        self.spawn_count
    }

    pub fn len(&self) -> usize {
        self.asteroids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.asteroids.is_empty()
    }

    pub fn asteroids(&self) -> Vec<AsteroidInfo> {
        self.asteroids
            .iter()
            .map(|a| {
                let body = a.body.borrow();
                AsteroidInfo {
                    position: body.model(),
                    value: a.value,
                    correct: a.correct,
                    destroyed: body.is_destroyed(),
                    flashing: a.flash_until.get().is_some(),
                }
            })
            .collect()
    }

    /// Spawn one asteroid at the top of the arena now, ignoring the timer
    pub fn spawn(&mut self) -> bool {
        let Some(image) = self.sprite.image() else {
            log::warn!("Asteroid spawn skipped: sprite not loaded");
            return false;
        };

        let index = self.spawn_count;
        self.spawn_count += 1;
        let value = pick_value(&mut self.rng, index, self.target, self.config.max_value);
        let correct = is_correct_value(self.target, value);

        let size = image.size() * self.config.scale;
        let half = size / 2.0;
        let x = if half.x < self.arena.x - half.x {
            self.rng.random_range(half.x..=self.arena.x - half.x)
        } else {
            self.arena.x / 2.0
        };
        let body = Projectile::spawn(
            ObjectId::numbered("asteroid", index),
            ObjectKind::Asteroid,
            ProjectileSpec {
                // Just above the top edge
                origin: Vec2::new(x, -half.y),
                direction: Vec2::Y,
                speed: self.config.speed,
                bounds: self.arena,
            },
        );
        let node = self.scene.add_sprite(&image, self.config.scale);
        let mut label = self.scene.add_label(value.to_string());
        label.set_position(body.borrow().model());

        let flash_until = Rc::new(Cell::new(None));
        {
            let mut asteroid = body.borrow_mut();
            asteroid.attach_node(Box::new(node));
            let radius = self.config.hit_radius.unwrap_or(half.x);
            let center = asteroid.model();
            asteroid
                .collidable()
                .borrow_mut()
                .set_circle(center.x, center.y, radius);
            asteroid.set_on_collision(self.hit_hook(correct, value, flash_until.clone()));
            self.collisions.register(asteroid.collidable());
        }

        log::debug!(
            "Spawned asteroid {} = {} ({})",
            index,
            value,
            if correct { "correct" } else { "wrong" }
        );
        self.asteroids.push(Asteroid {
            body,
            label,
            value,
            correct,
            flash_until,
            registered: true,
            reported: false,
        });
        true
    }

    /// First projectile contact destroys the asteroid, starts its flash and
    /// reports the hit. Later contacts and spent shots are ignored.
    fn hit_hook(
        &self,
        correct: bool,
        value: u32,
        flash_until: Rc<Cell<Option<f64>>>,
    ) -> ProjectileHook {
        let clock = self.clock.clone();
        let callbacks = self.callbacks.clone();
        let flash_ms = f64::from(self.config.flash_ms);

        Box::new(move |asteroid: &mut Projectile, other: &ObjectRef| {
            if asteroid.is_destroyed() || flash_until.get().is_some() {
                return Ok(());
            }
            {
                let shot = other.try_borrow().map_err(|_| CollisionError::OwnerBusy)?;
                if shot.kind() != ObjectKind::Projectile {
                    return Ok(());
                }
                // A shot already used up on another target does not count
                if shot.is_destroyed() && shot.spent_on() != Some(asteroid.id()) {
                    return Ok(());
                }
            }

            asteroid.destroy();
            if let Some(node) = asteroid.node_mut() {
                node.destroy();
            }
            flash_until.set(Some(clock.get() + flash_ms));
            log::debug!("{} hit, value {}", asteroid.id(), value);
            (callbacks.borrow_mut().on_hit)(correct);
            Ok(())
        })
    }

    pub fn update(&mut self, dt_ms: f32) {
        if self.disposed {
            return;
        }
        let now = self.clock.get() + f64::from(dt_ms);
        self.clock.set(now);

        self.spawn_timer += dt_ms;
        if self.spawn_timer >= self.config.spawn_interval_ms {
            self.spawn_timer = 0.0;
            self.spawn();
        }

        for asteroid in &mut self.asteroids {
            let mut body = asteroid.body.borrow_mut();
            if !body.is_destroyed() {
                body.update(dt_ms);
                self.collisions.mark_moved(body.collidable());
            }

            match asteroid.flash_until.get() {
                Some(deadline) => {
                    let phase = ((deadline - now) / BLINK_PERIOD_MS).floor() as i64;
                    asteroid.label.set_visible(phase % 2 == 0);
                }
                None if body.is_destroyed() => {
                    if !asteroid.reported {
                        asteroid.reported = true;
                        log::debug!("{} reached the bottom", body.id());
                        (self.callbacks.borrow_mut().on_reached_bottom)(asteroid.correct);
                    }
                }
                None => asteroid.label.set_position(body.model()),
            }
        }

        self.prune();
    }

    /// Take destroyed asteroids out of the broad-phase and drop those whose
    /// flash has run out. Also run after the collision scan so a hit
    /// asteroid stops colliding in the same tick.
    pub fn prune(&mut self) {
        let now = self.clock.get();
        let collisions = &self.collisions;
        self.asteroids.retain_mut(|asteroid| {
            let mut body = asteroid.body.borrow_mut();
            if !body.is_destroyed() {
                return true;
            }
            if asteroid.registered {
                collisions.unregister(body.collidable());
                asteroid.registered = false;
            }
            let expired = match asteroid.flash_until.get() {
                Some(deadline) => now >= deadline,
                None => true,
            };
            if !expired {
                return true;
            }
            body.dispose();
            asteroid.label.destroy();
            false
        });
    }

    /// Remove every asteroid and reset timers and counters
    pub fn clear(&mut self) {
        for mut asteroid in self.asteroids.drain(..) {
            let mut body = asteroid.body.borrow_mut();
            self.collisions.unregister(body.collidable());
            body.dispose();
            asteroid.label.destroy();
        }
        self.spawn_timer = 0.0;
        self.spawn_count = 0;
        self.clock.set(0.0);
    }

    pub fn dispose(&mut self) {
        self.clear();
        self.disposed = true;
    }
}
