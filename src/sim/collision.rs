//! Broad-phase collision manager
//!
//! Registry of live collidables scanned pairwise once per tick. O(n²) over
//! the registered set; spawn throttling keeps n in the tens.

use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;

use super::collidable::CollidableRef;
use super::object::ObjectId;

/// Failure raised from a collision hook
#[derive(Debug, Error)]
pub enum CollisionError {
    /// A hook refused the collision
    #[error("collision hook for {id} failed: {reason}")]
    Hook { id: ObjectId, reason: String },
    /// A hook owner was already borrowed when its turn came
    #[error("collision owner is already borrowed")]
    OwnerBusy,
}

/// Registered collidables, in registration order
#[derive(Debug, Default)]
pub struct CollisionManager {
    items: RefCell<Vec<CollidableRef>>,
}

impl CollisionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `item`; registering twice keeps a single entry
    pub fn register(&self, item: &CollidableRef) {
        let mut items = self.items.borrow_mut();
        if !items.iter().any(|it| Rc::ptr_eq(it, item)) {
            items.push(item.clone());
        }
    }

    /// Remove `item` by identity; absent items are ignored
    pub fn unregister(&self, item: &CollidableRef) {
        self.items.borrow_mut().retain(|it| !Rc::ptr_eq(it, item));
    }

    /// Performance hint for a future spatial index. The full scan ignores it.
    pub fn mark_moved(&self, _item: &CollidableRef) {}

    pub fn contains(&self, item: &CollidableRef) -> bool {
        self.items.borrow().iter().any(|it| Rc::ptr_eq(it, item))
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.items.borrow_mut().clear();
    }

    /// Test every unordered pair once and notify both owners of each overlap.
    ///
    /// For a pair `(i, j)` with `i < j` the hook of `i` runs before the hook of
    /// `j`. The first hook error aborts the scan and is returned; pairs after
    /// it are not visited this tick.
    pub fn update(&self) -> Result<(), CollisionError> {
        // Hooks may register or unregister; scan a snapshot.
        let items: Vec<CollidableRef> = self.items.borrow().clone();

        for (i, a) in items.iter().enumerate() {
            for b in &items[i + 1..] {
                if !a.borrow().intersects(&b.borrow()) {
                    continue;
                }

                let owner_a = a.borrow().owner();
                let owner_b = b.borrow().owner();
                let (Some(owner_a), Some(owner_b)) = (owner_a, owner_b) else {
                    continue;
                };
                if Rc::ptr_eq(&owner_a, &owner_b) {
                    continue;
                }

                owner_a
                    .try_borrow_mut()
                    .map_err(|_| CollisionError::OwnerBusy)?
                    .on_collision(&owner_b)?;
                owner_b
                    .try_borrow_mut()
                    .map_err(|_| CollisionError::OwnerBusy)?
                    .on_collision(&owner_a)?;
            }
        }

        Ok(())
    }
}
