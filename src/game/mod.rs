//! Screen-level orchestration
//!
//! Managers own the entities of one kind for one screen; `AsteroidField`
//! composes them into a playable screen.

pub mod asteroid_field;
pub mod asteroid_manager;
pub mod player_manager;
pub mod projectile_manager;

pub use asteroid_field::{AsteroidField, Feedback, Score};
pub use asteroid_manager::{
    AsteroidCallbacks, AsteroidInfo, AsteroidManager, is_correct_value, pick_value,
};
pub use player_manager::{AnimationState, Facing, PlayerManager};
pub use projectile_manager::{ProjectileManager, ShotOptions};
