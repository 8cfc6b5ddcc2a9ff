//! Player shots
//!
//! Fire-rate limiting belongs to the caller; every `shoot` with a loaded
//! sprite produces a projectile.

use std::cell::RefCell;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use glam::Vec2;

use crate::config::ProjectileConfig;
use crate::platform::{AssetLoader, ImageSlot};
use crate::scene::Scene;
use crate::sim::{
    CollidableRef, CollisionError, CollisionManager, GameObject, ObjectId, ObjectKind, ObjectRef, Projectile,
    ProjectileHook, ProjectileSpec,
};

/// Per-shot parameters; unset fields fall back to the manager's config
#[derive(Default)]
pub struct ShotOptions {
    pub origin: Vec2,
    pub direction: Option<Vec2>,
    pub speed: Option<f32>,
    /// Runs when the shot hits something other than the friendly collidable
    pub on_collision: Option<ProjectileHook>,
}

impl ShotOptions {
    pub fn at(origin: Vec2) -> Self {
        Self {
            origin,
            ..Default::default()
        }
    }
}

pub struct ProjectileManager {
    config: ProjectileConfig,
    bounds: Vec2,
    scene: Scene,
    collisions: Rc<CollisionManager>,
    sprite: ImageSlot,
    /// Collidable the shots never react to
    friendly: Rc<RefCell<Option<CollidableRef>>>,
    projectiles: Vec<Rc<RefCell<Projectile>>>,
    next_id: u32,
}

impl ProjectileManager {
    pub fn new(
        config: &ProjectileConfig,
        bounds: Vec2,
        scene: Scene,
        collisions: Rc<CollisionManager>,
    ) -> Self {
        Self {
            config: config.clone(),
            bounds,
            scene,
            collisions,
            sprite: ImageSlot::new(),
            friendly: Rc::new(RefCell::new(None)),
            projectiles: Vec::new(),
            next_id: 0,
        }
    }

    pub fn load(&self, loader: &dyn AssetLoader) -> LocalBoxFuture<'static, ()> {
        self.sprite.load(loader, &self.config.sprite_url)
    }

    pub fn sprite(&self) -> &ImageSlot {
        &self.sprite
    }

    /// Exclude `collidable`'s owner from every shot's collisions, including
    /// shots already in flight
    pub fn set_friendly(&self, collidable: Option<CollidableRef>) {
        self.friendly.replace(collidable);
    }

    pub fn has_friendly(&self) -> bool {
        self.friendly.borrow().is_some()
    }

    pub fn shoot(&mut self, options: ShotOptions) -> Option<Rc<RefCell<Projectile>>> {
        let Some(image) = self.sprite.image() else {
            log::warn!("Shot ignored: projectile sprite not loaded");
            return None;
        };

        let id = ObjectId::numbered("shot", self.next_id);
        self.next_id += 1;
        let spec = ProjectileSpec {
            origin: options.origin,
            direction: options.direction.unwrap_or(self.config.direction),
            speed: options.speed.unwrap_or(self.config.speed),
            bounds: self.bounds,
        };
        let projectile = Projectile::spawn(id, ObjectKind::Projectile, spec);

        let node = self.scene.add_sprite(&image, self.config.scale);
        let friendly = self.friendly.clone();
        let mut on_hit = options.on_collision;
        {
            let mut shot = projectile.borrow_mut();
            shot.attach_node(Box::new(node));
            shot.set_on_collision(Box::new(move |shot: &mut Projectile, other: &ObjectRef| {
                if shot.is_destroyed() {
                    return Ok(());
                }
                let owner = friendly.borrow().as_ref().and_then(|c| c.borrow().owner());
                if owner.is_some_and(|owner| Rc::ptr_eq(&owner, other)) {
                    return Ok(());
                }
                if let Some(on_hit) = on_hit.as_mut() {
                    on_hit(&mut *shot, other)?;
                }
                let target = other
                    .try_borrow()
                    .map_err(|_| CollisionError::OwnerBusy)?
                    .id()
                    .clone();
                shot.spend_on(target);
                Ok(())
            }));
            self.collisions.register(shot.collidable());
        }

        self.projectiles.push(projectile.clone());
        Some(projectile)
    }

    /// Advance every shot, then drop the destroyed ones
    pub fn update(&mut self, dt_ms: f32) {
        for projectile in &self.projectiles {
            let mut shot = projectile.borrow_mut();
            shot.update(dt_ms);
            if !shot.is_destroyed() {
                self.collisions.mark_moved(shot.collidable());
            }
        }

        self.prune();
    }

    /// Drop destroyed shots: unregister, dispose, forget
    pub fn prune(&mut self) {
        let collisions = &self.collisions;
        self.projectiles.retain(|projectile| {
            let mut shot = projectile.borrow_mut();
            if !shot.is_destroyed() {
                return true;
            }
            collisions.unregister(shot.collidable());
            shot.dispose();
            false
        });
    }

    pub fn projectiles(&self) -> &[Rc<RefCell<Projectile>>] {
        &self.projectiles
    }

    pub fn len(&self) -> usize {
        self.projectiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projectiles.is_empty()
    }

    /// Remove every shot
    pub fn clear(&mut self) {
        for projectile in self.projectiles.drain(..) {
            let mut shot = projectile.borrow_mut();
            self.collisions.unregister(shot.collidable());
            shot.dispose();
        }
    }

    pub fn dispose(&mut self) {
        self.clear();
        self.friendly.replace(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::ImageHandle;

    fn setup() -> (ProjectileManager, Rc<CollisionManager>, Scene) {
        let scene = Scene::new();
        let collisions = Rc::new(CollisionManager::new());
        let manager = ProjectileManager::new(
            &ProjectileConfig::default(),
            Vec2::new(800.0, 600.0),
            scene.clone(),
            collisions.clone(),
        );
        manager
            .sprite()
            .set_loaded(ImageHandle::new("assets/laser.png", 4.0, 16.0));
        (manager, collisions, scene)
    }

    /// A stationary target built from a zero-speed projectile
    fn target(kind: ObjectKind, at: Vec2) -> Rc<RefCell<Projectile>> {
        let target = Projectile::spawn(
            ObjectId::new("target"),
            kind,
            ProjectileSpec {
                origin: at,
                direction: Vec2::ZERO,
                speed: 0.0,
                bounds: Vec2::new(800.0, 600.0),
            },
        );
        target
            .borrow()
            .collidable()
            .borrow_mut()
            .set_rect(at.x - 20.0, at.y - 20.0, 40.0, 40.0);
        target
    }

    #[test]
    fn test_shoot_before_load_is_ignored() {
        let scene = Scene::new();
        let collisions = Rc::new(CollisionManager::new());
        let mut manager = ProjectileManager::new(
            &ProjectileConfig::default(),
            Vec2::new(800.0, 600.0),
            scene.clone(),
            collisions.clone(),
        );
        assert!(manager.shoot(ShotOptions::at(Vec2::new(100.0, 100.0))).is_none());
        assert!(manager.is_empty());
        assert!(collisions.is_empty());
        assert!(scene.is_empty());
    }

    #[test]
    fn test_shoot_uses_config_defaults() {
        let (mut manager, collisions, scene) = setup();
        let shot = manager
            .shoot(ShotOptions::at(Vec2::new(400.0, 500.0)))
            .unwrap();
        assert_eq!(shot.borrow().direction(), Vec2::new(0.0, -1.0));
        assert_eq!(shot.borrow().speed(), 600.0);
        assert_eq!(shot.borrow().id().as_str(), "shot-0");
        assert_eq!(collisions.len(), 1);
        assert_eq!(scene.len(), 1);

        let custom = manager
            .shoot(ShotOptions {
                origin: Vec2::new(400.0, 500.0),
                direction: Some(Vec2::new(2.0, 0.0)),
                speed: Some(50.0),
                on_collision: None,
            })
            .unwrap();
        assert_eq!(custom.borrow().direction(), Vec2::X);
        assert_eq!(custom.borrow().speed(), 50.0);
        assert_eq!(custom.borrow().id().as_str(), "shot-1");
    }

    #[test]
    fn test_culled_shots_are_pruned() {
        let (mut manager, collisions, scene) = setup();
        manager.shoot(ShotOptions::at(Vec2::new(400.0, 100.0)));
        manager.update(100.0);
        assert_eq!(manager.len(), 1);

        // 600 px/s upward leaves the top within the next 200 ms
        manager.update(200.0);
        assert!(manager.is_empty());
        assert!(collisions.is_empty());
        assert!(scene.is_empty());
    }

    #[test]
    fn test_hit_runs_callback_and_destroys_shot() {
        let (mut manager, collisions, _scene) = setup();
        let rock = target(ObjectKind::Asteroid, Vec2::new(400.0, 300.0));
        collisions.register(rock.borrow().collidable());

        let hits = Rc::new(RefCell::new(Vec::new()));
        let log = hits.clone();
        let shot = manager
            .shoot(ShotOptions {
                origin: Vec2::new(400.0, 310.0),
                on_collision: Some(Box::new(move |_shot: &mut Projectile, other: &ObjectRef| {
                    log.borrow_mut().push(other.borrow().id().clone());
                    Ok(())
                })),
                ..Default::default()
            })
            .unwrap();

        collisions.update().unwrap();
        assert_eq!(*hits.borrow(), vec![ObjectId::new("target")]);
        assert!(shot.borrow().is_destroyed());
        assert_eq!(shot.borrow().spent_on(), Some(&ObjectId::new("target")));

        // A destroyed shot reacts no further and is pruned next update
        collisions.update().unwrap();
        assert_eq!(hits.borrow().len(), 1);
        manager.update(16.0);
        assert!(manager.is_empty());
        assert_eq!(collisions.len(), 1);
    }

    #[test]
    fn test_friendly_fire_is_ignored() {
        let (mut manager, collisions, _scene) = setup();
        let ship = target(ObjectKind::Player, Vec2::new(400.0, 500.0));
        collisions.register(ship.borrow().collidable());
        manager.set_friendly(Some(ship.borrow().collidable().clone()));

        let called = Rc::new(RefCell::new(false));
        let flag = called.clone();
        let shot = manager
            .shoot(ShotOptions {
                origin: Vec2::new(400.0, 480.0),
                on_collision: Some(Box::new(move |_shot: &mut Projectile, _other: &ObjectRef| {
                    *flag.borrow_mut() = true;
                    Ok(())
                })),
                ..Default::default()
            })
            .unwrap();

        collisions.update().unwrap();
        assert!(!*called.borrow());
        assert!(!shot.borrow().is_destroyed());
    }

    #[test]
    fn test_callback_error_propagates() {
        let (mut manager, collisions, _scene) = setup();
        let rock = target(ObjectKind::Asteroid, Vec2::new(400.0, 300.0));
        collisions.register(rock.borrow().collidable());
        let shot = manager
            .shoot(ShotOptions {
                origin: Vec2::new(400.0, 300.0),
                on_collision: Some(Box::new(|shot: &mut Projectile, _other: &ObjectRef| {
                    Err(CollisionError::Hook {
                        id: shot.id().clone(),
                        reason: "rejected".into(),
                    })
                })),
                ..Default::default()
            })
            .unwrap();

        assert!(matches!(
            collisions.update(),
            Err(CollisionError::Hook { .. })
        ));
        // The error short-circuits before the shot destroys itself
        assert!(!shot.borrow().is_destroyed());
    }

    #[test]
    fn test_clear_removes_everything() {
        let (mut manager, collisions, scene) = setup();
        for x in [100.0, 200.0, 300.0] {
            manager.shoot(ShotOptions::at(Vec2::new(x, 300.0)));
        }
        assert_eq!(manager.len(), 3);

        manager.dispose();
        assert!(manager.is_empty());
        assert!(collisions.is_empty());
        assert!(scene.is_empty());
        assert!(!manager.has_friendly());
    }
}
