//! Incremental position integration
//!
//! `Movement` integrates a velocity into a shared model; `PlayerMovement`
//! derives that velocity from held keys every tick.

use std::f32::consts::FRAC_1_SQRT_2;
use std::rc::Rc;

use glam::Vec2;

use super::object::SharedModel;
use crate::config::{KeyBindings, MovementConfig};
use crate::platform::InputSource;

/// Integrates `velocity` (pixels per second) into the shared model
#[derive(Debug, Clone)]
pub struct Movement {
    enabled: bool,
    model: SharedModel,
    velocity: Vec2,
}

impl Movement {
    pub fn new(model: SharedModel) -> Self {
        Self {
            enabled: true,
            model,
            velocity: Vec2::ZERO,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn model(&self) -> &SharedModel {
        &self.model
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    pub fn update(&mut self, dt_ms: f32) {
        if !self.enabled {
            return;
        }
        let displacement = self.velocity * (dt_ms / 1000.0);
        self.model.set(self.model.get() + displacement);
    }
}

/// Keyboard-driven movement with walk and run speeds
#[derive(Debug, Clone)]
pub struct PlayerMovement {
    base: Movement,
    input: Rc<InputSource>,
    keys: KeyBindings,
    walk_speed: f32,
    run_speed: f32,
}

impl PlayerMovement {
    pub fn new(model: SharedModel, input: Rc<InputSource>, config: &MovementConfig) -> Self {
        Self {
            base: Movement::new(model),
            input,
            keys: config.keys.clone(),
            walk_speed: config.walk_speed,
            run_speed: config.effective_run_speed(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.base.is_enabled()
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.base.set_enabled(enabled);
    }

    pub fn model(&self) -> &SharedModel {
        self.base.model()
    }

    pub fn walk_speed(&self) -> f32 {
        self.walk_speed
    }

    pub fn run_speed(&self) -> f32 {
        self.run_speed
    }

    fn axis(&self, negative: &[String], positive: &[String]) -> f32 {
        let neg = self.input.is_any_key_pressed(negative) as i32;
        let pos = self.input.is_any_key_pressed(positive) as i32;
        (pos - neg) as f32
    }

    /// Unit intent from held keys. Diagonals are scaled by 1/√2 per axis.
    fn direction(&self) -> Vec2 {
        let dx = self.axis(&self.keys.left, &self.keys.right);
        let dy = self.axis(&self.keys.up, &self.keys.down);
        if dx != 0.0 && dy != 0.0 {
            Vec2::new(dx, dy) * FRAC_1_SQRT_2
        } else {
            Vec2::new(dx, dy)
        }
    }

    pub fn update(&mut self, dt_ms: f32) {
        if !self.base.is_enabled() {
            return;
        }
        let speed = if self.is_running() {
            self.run_speed
        } else {
            self.walk_speed
        };
        self.base.set_velocity(self.direction() * speed);
        self.base.update(dt_ms);
    }

    /// Horizontal intent from the keys held right now (drives animation only)
    pub fn velocity_x(&self) -> f32 {
        self.direction().x
    }

    /// Vertical intent from the keys held right now (drives animation only)
    pub fn velocity_y(&self) -> f32 {
        self.direction().y
    }

    pub fn is_jumping(&self) -> bool {
        self.input.is_any_key_pressed(&self.keys.jump)
    }

    pub fn is_running(&self) -> bool {
        self.input.is_any_key_pressed(&self.keys.run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::object::shared_model;

    const EPS: f32 = 0.001;

    fn setup(walk: f32) -> (Rc<InputSource>, SharedModel, PlayerMovement) {
        let input = Rc::new(InputSource::new());
        let model = shared_model(Vec2::new(500.0, 500.0));
        let config = MovementConfig {
            walk_speed: walk,
            ..Default::default()
        };
        let movement = PlayerMovement::new(model.clone(), input.clone(), &config);
        (input, model, movement)
    }

    #[test]
    fn test_base_movement_integrates_velocity() {
        let model = shared_model(Vec2::ZERO);
        let mut movement = Movement::new(model.clone());
        movement.set_velocity(Vec2::new(100.0, -50.0));
        movement.update(500.0);
        assert!((model.get() - Vec2::new(50.0, -25.0)).length() < EPS);

        movement.set_enabled(false);
        movement.update(500.0);
        assert!((model.get() - Vec2::new(50.0, -25.0)).length() < EPS);
    }

    #[test]
    fn test_no_keys_no_motion() {
        let (_input, model, mut movement) = setup(100.0);
        movement.update(16.0);
        assert_eq!(model.get(), Vec2::new(500.0, 500.0));
    }

    #[test]
    fn test_diagonal_is_normalized_per_axis() {
        let (input, model, mut movement) = setup(100.0);
        input.key_down("ArrowUp");
        input.key_down("ArrowLeft");
        movement.update(1000.0);

        let moved = model.get() - Vec2::new(500.0, 500.0);
        let expected = 100.0 * FRAC_1_SQRT_2;
        assert!((moved.x + expected).abs() < EPS);
        assert!((moved.y + expected).abs() < EPS);
    }

    #[test]
    fn test_opposite_keys_cancel() {
        let (input, model, mut movement) = setup(100.0);
        input.key_down("a");
        input.key_down("d");
        input.key_down("s");
        movement.update(1000.0);
        let moved = model.get() - Vec2::new(500.0, 500.0);
        assert!(moved.x.abs() < EPS);
        assert!((moved.y - 100.0).abs() < EPS);
    }

    #[test]
    fn test_run_and_walk_have_no_hysteresis() {
        let (input, model, mut movement) = setup(100.0);
        input.key_down("ArrowRight");
        input.key_down("Shift");
        movement.update(1000.0);
        assert!((model.get().x - 700.0).abs() < EPS);

        input.key_up("Shift");
        movement.update(1000.0);
        assert!((model.get().x - 800.0).abs() < EPS);
    }

    #[test]
    fn test_velocity_queries_follow_current_keys() {
        let (input, _model, movement) = setup(100.0);
        assert_eq!(movement.velocity_x(), 0.0);
        input.key_down("d");
        assert_eq!(movement.velocity_x(), 1.0);
        input.key_down("w");
        assert!((movement.velocity_x() - FRAC_1_SQRT_2).abs() < EPS);
        assert!((movement.velocity_y() + FRAC_1_SQRT_2).abs() < EPS);
    }

    #[test]
    fn test_jump_and_run_flags() {
        let (input, _model, movement) = setup(100.0);
        assert!(!movement.is_jumping());
        assert!(!movement.is_running());
        input.key_down("J");
        input.key_down("Shift");
        assert!(movement.is_jumping());
        assert!(movement.is_running());
    }

    #[test]
    fn test_disabled_player_movement_ignores_input() {
        let (input, model, mut movement) = setup(100.0);
        movement.set_enabled(false);
        input.key_down("ArrowDown");
        movement.update(1000.0);
        assert_eq!(model.get(), Vec2::new(500.0, 500.0));
    }
}
