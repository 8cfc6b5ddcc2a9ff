//! Entity simulation
//!
//! Shapes, collidables, the collision broad-phase and the two entity types.
//! Nothing here touches the browser; entities talk to visuals only through
//! `scene::Renderable`.

pub mod collidable;
pub mod collision;
pub mod movement;
pub mod object;
pub mod player;
pub mod projectile;
pub mod shape;

pub use collidable::{Collidable, CollidableRef};
pub use collision::{CollisionError, CollisionManager};
pub use movement::{Movement, PlayerMovement};
pub use object::{Collider, GameObject, ObjectId, ObjectKind, ObjectRef, SharedModel, shared_model};
pub use player::Player;
pub use projectile::{Projectile, ProjectileHook, ProjectileSpec};
pub use shape::Shape;
