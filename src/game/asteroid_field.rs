//! Asteroid Field screen
//!
//! Wires the player, shots and asteroids to one collision manager and keeps
//! score. One `update` is one frame:
//!
//! 1. player movement and position sync
//! 2. firing, then projectile and asteroid integration with bounds culling
//! 3. collision broad-phase and hook dispatch
//! 4. pruning of destroyed shots and asteroids, then of dead scene nodes
//!
//! A shot destroyed by a hook is gone before the frame is drawn. A hit
//! asteroid leaves the broad-phase at once while its label keeps flashing.

use std::cell::RefCell;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::LocalBoxFuture;

use super::asteroid_manager::{AsteroidCallbacks, AsteroidInfo, AsteroidManager};
use super::player_manager::PlayerManager;
use super::projectile_manager::{ProjectileManager, ShotOptions};
use crate::config::{GameConfig, ScoringConfig};
use crate::platform::{AssetLoader, InputSource};
use crate::scene::Scene;
use crate::sim::{CollisionError, CollisionManager, SharedModel, shared_model};

/// Something the player should hear about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    Shot,
    CorrectHit,
    WrongHit,
    /// A correct asteroid got past
    Missed,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    pub points: i64,
    pub lives: u32,
    pub correct_hits: u32,
    pub wrong_hits: u32,
    pub misses: u32,
}

impl Score {
    pub fn new(lives: u32) -> Self {
        Self {
            points: 0,
            lives,
            correct_hits: 0,
            wrong_hits: 0,
            misses: 0,
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.lives == 0
    }

    /// A shot destroyed an asteroid
    pub fn apply_hit(&mut self, correct: bool, rules: &ScoringConfig) -> Feedback {
        if correct {
            self.points += rules.correct_points;
            self.correct_hits += 1;
            Feedback::CorrectHit
        } else {
            self.points += rules.wrong_points;
            self.wrong_hits += 1;
            self.lives = self.lives.saturating_sub(1);
            Feedback::WrongHit
        }
    }

    /// An asteroid fell out of the arena. Letting a wrong one through is fine.
    pub fn apply_reached_bottom(&mut self, correct: bool) -> Option<Feedback> {
        if !correct {
            return None;
        }
        self.misses += 1;
        self.lives = self.lives.saturating_sub(1);
        Some(Feedback::Missed)
    }
}

/// Score plus pending feedback, shared with the asteroid callbacks
#[derive(Debug)]
struct Board {
    score: Score,
    rules: ScoringConfig,
    feedback: Vec<Feedback>,
}

impl Board {
    fn push(&mut self, event: Feedback) {
        if !self.score.is_game_over() {
            self.feedback.push(event);
        }
    }

    fn record(&mut self, apply: impl FnOnce(&mut Score, &ScoringConfig) -> Option<Feedback>) {
        if self.score.is_game_over() {
            return;
        }
        let event = apply(&mut self.score, &self.rules);
        self.feedback.extend(event);
        if self.score.is_game_over() {
            log::info!("Game over with {} points", self.score.points);
            self.feedback.push(Feedback::GameOver);
        }
    }
}

pub struct AsteroidField {
    config: GameConfig,
    input: Rc<InputSource>,
    scene: Scene,
    collisions: Rc<CollisionManager>,
    model: SharedModel,
    players: PlayerManager,
    projectiles: ProjectileManager,
    asteroids: AsteroidManager,
    board: Rc<RefCell<Board>>,
    disposed: bool,
}

impl AsteroidField {
    pub fn new(config: GameConfig, input: Rc<InputSource>, seed: u64) -> Self {
        let scene = Scene::new();
        let collisions = Rc::new(CollisionManager::new());
        let arena = config.arena.size();
        let model = shared_model(config.player.start);

        let board = Rc::new(RefCell::new(Board {
            score: Score::new(config.scoring.lives),
            rules: config.scoring.clone(),
            feedback: Vec::new(),
        }));
        let (hits, misses) = (board.clone(), board.clone());
        let callbacks = AsteroidCallbacks {
            on_hit: Box::new(move |correct| {
                hits.borrow_mut()
                    .record(|score, rules| Some(score.apply_hit(correct, rules)));
            }),
            on_reached_bottom: Box::new(move |correct| {
                misses
                    .borrow_mut()
                    .record(|score, _| score.apply_reached_bottom(correct));
            }),
        };

        let players = PlayerManager::new(
            &config.player,
            model.clone(),
            input.clone(),
            scene.clone(),
            arena,
            Some(collisions.clone()),
        );
        let projectiles =
            ProjectileManager::new(&config.projectile, arena, scene.clone(), collisions.clone());
        let asteroids = AsteroidManager::new(
            &config.asteroid,
            arena,
            scene.clone(),
            collisions.clone(),
            callbacks,
            seed,
        );

        log::info!(
            "Asteroid field created ({}x{}, target {})",
            arena.x,
            arena.y,
            config.asteroid.target
        );

        Self {
            config,
            input,
            scene,
            collisions,
            model,
            players,
            projectiles,
            asteroids,
            board,
            disposed: false,
        }
    }

    /// Load every sprite the screen needs. Failures leave the affected
    /// manager inert; the returned future always completes.
    pub fn load(&self, loader: &dyn AssetLoader) -> LocalBoxFuture<'static, ()> {
        let player = self.players.load(loader);
        let shots = self.projectiles.load(loader);
        let rocks = self.asteroids.load(loader);
        async move {
            futures::join!(player, shots, rocks);
        }
        .boxed_local()
    }

    /// Advance one frame. A failing collision hook aborts the rest of the
    /// frame and is returned to the caller.
    pub fn update(&mut self, dt_ms: f32) -> Result<(), CollisionError> {
        if self.disposed || self.is_game_over() {
            return Ok(());
        }

        self.players.update(dt_ms);
        if !self.projectiles.has_friendly() {
            self.projectiles
                .set_friendly(self.players.player_collidable());
        }
        self.fire();

        self.projectiles.update(dt_ms);
        self.asteroids.update(dt_ms);
        self.collisions.update()?;
        self.projectiles.prune();
        self.asteroids.prune();
        self.scene.prune();
        Ok(())
    }

    fn fire(&mut self) {
        let controls = &self.config.controls;
        if !self
            .input
            .consume_press(&controls.fire_key, controls.fire_cooldown_ms)
        {
            return;
        }
        let Some(origin) = self.players.muzzle() else {
            return;
        };
        if self.projectiles.shoot(ShotOptions::at(origin)).is_some() {
            self.board.borrow_mut().push(Feedback::Shot);
        }
    }

    pub fn score(&self) -> Score {
        self.board.borrow().score
    }

    pub fn is_game_over(&self) -> bool {
        self.board.borrow().score.is_game_over()
    }

    /// Take the feedback recorded since the last call
    pub fn drain_feedback(&self) -> Vec<Feedback> {
        std::mem::take(&mut self.board.borrow_mut().feedback)
    }

    pub fn target(&self) -> u32 {
        self.asteroids.target()
    }

    pub fn set_target(&mut self, target: u32) {
        self.asteroids.set_target(target);
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn model(&self) -> &SharedModel {
        &self.model
    }

    pub fn input(&self) -> &Rc<InputSource> {
        &self.input
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn shot_count(&self) -> usize {
        self.projectiles.len()
    }

    pub fn asteroids(&self) -> Vec<AsteroidInfo> {
        self.asteroids.asteroids()
    }

    pub fn has_player(&self) -> bool {
        self.players.player().is_some()
    }

    /// Tear the screen down. Loads still in flight complete harmlessly.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.players.dispose();
        self.projectiles.dispose();
        self.asteroids.dispose();
        self.collisions.clear();
        self.scene.prune();
        self.disposed = true;
        log::info!("Asteroid field disposed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::PresetLoader;
    use futures::executor::block_on;
    use glam::Vec2;

    fn loader() -> PresetLoader {
        PresetLoader::new()
            .with_image("assets/ship.png", 40.0, 40.0)
            .with_image("assets/laser.png", 4.0, 16.0)
            .with_image("assets/asteroid.png", 40.0, 40.0)
    }

    fn loaded_field(config: GameConfig) -> (AsteroidField, Rc<InputSource>) {
        let input = Rc::new(InputSource::new());
        let field = AsteroidField::new(config, input.clone(), 3);
        block_on(field.load(&loader()));
        (field, input)
    }

    #[test]
    fn test_score_rules() {
        let rules = ScoringConfig::default();
        let mut score = Score::new(3);

        assert_eq!(score.apply_hit(true, &rules), Feedback::CorrectHit);
        assert_eq!((score.points, score.lives), (10, 3));

        assert_eq!(score.apply_hit(false, &rules), Feedback::WrongHit);
        assert_eq!((score.points, score.lives), (5, 2));

        assert_eq!(score.apply_reached_bottom(false), None);
        assert_eq!(score.lives, 2);

        assert_eq!(score.apply_reached_bottom(true), Some(Feedback::Missed));
        assert_eq!(score.lives, 1);
        assert!(!score.is_game_over());

        score.apply_reached_bottom(true);
        assert!(score.is_game_over());
        score.apply_reached_bottom(true);
        assert_eq!(score.lives, 0);
    }

    #[test]
    fn test_player_appears_after_load() {
        let input = Rc::new(InputSource::new());
        let mut field = AsteroidField::new(GameConfig::default(), input, 1);
        field.update(16.0).unwrap();
        assert!(!field.has_player());

        block_on(field.load(&loader()));
        field.update(16.0).unwrap();
        assert!(field.has_player());
        assert_eq!(field.model().get(), GameConfig::default().player.start);
    }

    #[test]
    fn test_fire_is_debounced() {
        let (mut field, input) = loaded_field(GameConfig::default());
        field.update(16.0).unwrap();

        input.key_down(" ");
        input.set_now(1000.0);
        field.update(16.0).unwrap();
        assert_eq!(field.shot_count(), 1);
        assert_eq!(field.drain_feedback(), vec![Feedback::Shot]);

        input.set_now(1100.0);
        field.update(16.0).unwrap();
        assert_eq!(field.shot_count(), 1);

        input.set_now(1250.0);
        field.update(16.0).unwrap();
        assert_eq!(field.shot_count(), 2);
        assert!(field.drain_feedback().contains(&Feedback::Shot));
    }

    #[test]
    fn test_own_shots_do_not_hit_the_player() {
        let mut config = GameConfig::default();
        config.projectile.speed = 10.0;
        let (mut field, input) = loaded_field(config);
        field.update(16.0).unwrap();
        input.key_down("space");
        field.update(16.0).unwrap();
        // The slow shot still overlaps the ship's top edge
        field.update(16.0).unwrap();
        assert_eq!(field.shot_count(), 1);
        assert_eq!(field.score(), Score::new(3));
    }

    #[test]
    fn test_shot_destroys_asteroid_and_scores() {
        let mut config = GameConfig::default();
        config.asteroid.spawn_interval_ms = 1.0e9;
        let (mut field, input) = loaded_field(config);
        field.update(16.0).unwrap();

        assert!(field.asteroids.spawn());
        let rock = field.asteroids()[0];
        field.model().set(Vec2::new(rock.position.x, 800.0));
        field.update(16.0).unwrap();

        input.key_down("space");
        field.update(16.0).unwrap();
        input.key_up("space");
        for _ in 0..150 {
            field.update(16.0).unwrap();
        }

        let score = field.score();
        assert_eq!(score.correct_hits + score.wrong_hits, 1);
        let expected = if rock.correct {
            Feedback::CorrectHit
        } else {
            Feedback::WrongHit
        };
        assert!(field.drain_feedback().contains(&expected));
        assert!(field.asteroids().is_empty());
        assert_eq!(field.shot_count(), 0);
    }

    #[test]
    fn test_hit_is_pruned_in_the_same_frame() {
        let mut config = GameConfig::default();
        config.asteroid.spawn_interval_ms = 1.0e9;
        let (mut field, input) = loaded_field(config);
        field.update(16.0).unwrap();

        assert!(field.asteroids.spawn());
        let rock = field.asteroids()[0];
        field.model().set(Vec2::new(rock.position.x, 800.0));
        field.update(16.0).unwrap();

        input.key_down("space");
        field.update(16.0).unwrap();
        input.key_up("space");
        assert_eq!(field.shot_count(), 1);

        let mut frames = 0;
        while field.score().correct_hits + field.score().wrong_hits == 0 {
            field.update(16.0).unwrap();
            frames += 1;
            assert!(frames < 150, "shot never reached the asteroid");
        }

        // Both are out of the broad-phase before the frame is drawn
        assert_eq!(field.shot_count(), 0);
        assert!(field.asteroids()[0].flashing);
        assert_eq!(field.collisions.len(), 1);
    }

    #[test]
    fn test_game_over_freezes_the_field() {
        let mut config = GameConfig::default();
        config.scoring.lives = 1;
        let (mut field, _input) = loaded_field(config);
        field.update(16.0).unwrap();

        field
            .board
            .borrow_mut()
            .record(|score, _| score.apply_reached_bottom(true));
        assert!(field.is_game_over());
        assert_eq!(
            field.drain_feedback(),
            vec![Feedback::Missed, Feedback::GameOver]
        );

        let before = field.model().get();
        field.input().key_down("ArrowLeft");
        field.update(1000.0).unwrap();
        assert_eq!(field.model().get(), before);

        // Nothing more is recorded once the game is over
        field
            .board
            .borrow_mut()
            .record(|score, rules| Some(score.apply_hit(true, rules)));
        assert_eq!(field.score().points, 0);
        assert!(field.drain_feedback().is_empty());
    }

    #[test]
    fn test_dispose_clears_scene() {
        let (mut field, input) = loaded_field(GameConfig::default());
        field.update(16.0).unwrap();
        input.key_down("space");
        field.update(16.0).unwrap();
        field.update(3000.0).unwrap();
        assert!(!field.scene().is_empty());

        field.dispose();
        assert!(field.scene().is_empty());
        field.update(16.0).unwrap();
        assert!(field.scene().is_empty());
    }
}
