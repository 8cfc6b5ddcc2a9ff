//! Retained scene graph
//!
//! Entities never draw; they own `Renderable` handles and push positions into
//! them. The canvas renderer walks `Scene::nodes()` once per frame.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use thiserror::Error;

use crate::platform::ImageHandle;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("node has no measurable size yet")]
    Unmeasured,
    #[error("node was removed from the scene")]
    Removed,
}

/// What the simulation needs from a visual handle
pub trait Renderable {
    /// Size on screen after scaling
    fn rendered_size(&self) -> Result<Vec2, SceneError>;

    /// Move the node's center to `pos`
    fn set_position(&mut self, pos: Vec2);

    fn set_visible(&mut self, _visible: bool) {}

    fn set_text(&mut self, _text: &str) {}

    /// Switch to a named animation clip
    fn play(&mut self, _animation: &str) {}

    /// Remove from the scene
    fn destroy(&mut self);
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Sprite { image: ImageHandle },
    Label { text: String },
}

/// Drawable state of one node
#[derive(Debug, Clone, PartialEq)]
pub struct NodeState {
    pub kind: NodeKind,
    pub position: Vec2,
    pub scale: f32,
    pub visible: bool,
    pub animation: Option<String>,
    removed: bool,
}

impl NodeState {
    fn new(kind: NodeKind, scale: f32) -> Self {
        Self {
            kind,
            position: Vec2::ZERO,
            scale,
            visible: true,
            animation: None,
            removed: false,
        }
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }
}

type NodeCell = Rc<RefCell<NodeState>>;

/// Handle to a node inside a `Scene`
#[derive(Debug, Clone)]
pub struct SceneNode {
    state: NodeCell,
}

impl SceneNode {
    pub fn state(&self) -> NodeState {
        self.state.borrow().clone()
    }

    pub fn position(&self) -> Vec2 {
        self.state.borrow().position
    }

    pub fn is_visible(&self) -> bool {
        self.state.borrow().visible
    }

    pub fn is_removed(&self) -> bool {
        self.state.borrow().removed
    }

    pub fn animation(&self) -> Option<String> {
        self.state.borrow().animation.clone()
    }
}

impl Renderable for SceneNode {
    fn rendered_size(&self) -> Result<Vec2, SceneError> {
        let state = self.state.borrow();
        if state.removed {
            return Err(SceneError::Removed);
        }
        match &state.kind {
            NodeKind::Sprite { image } => {
                let size = image.size() * state.scale;
                if size.x > 0.0 && size.y > 0.0 {
                    Ok(size)
                } else {
                    Err(SceneError::Unmeasured)
                }
            }
            NodeKind::Label { .. } => Err(SceneError::Unmeasured),
        }
    }

    fn set_position(&mut self, pos: Vec2) {
        self.state.borrow_mut().position = pos;
    }

    fn set_visible(&mut self, visible: bool) {
        self.state.borrow_mut().visible = visible;
    }

    fn set_text(&mut self, text: &str) {
        if let NodeKind::Label { text: current } = &mut self.state.borrow_mut().kind {
            *current = text.to_string();
        }
    }

    fn play(&mut self, animation: &str) {
        self.state.borrow_mut().animation = Some(animation.to_string());
    }

    fn destroy(&mut self) {
        self.state.borrow_mut().removed = true;
    }
}

/// Ordered draw list; later nodes draw on top
#[derive(Debug, Clone, Default)]
pub struct Scene {
    nodes: Rc<RefCell<Vec<NodeCell>>>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&self, state: NodeState) -> SceneNode {
        let cell = Rc::new(RefCell::new(state));
        let mut nodes = self.nodes.borrow_mut();
        nodes.retain(|n| !n.borrow().removed);
        nodes.push(cell.clone());
        SceneNode { state: cell }
    }

    pub fn add_sprite(&self, image: &ImageHandle, scale: f32) -> SceneNode {
        self.insert(NodeState::new(
            NodeKind::Sprite {
                image: image.clone(),
            },
            scale,
        ))
    }

    pub fn add_label(&self, text: impl Into<String>) -> SceneNode {
        self.insert(NodeState::new(NodeKind::Label { text: text.into() }, 1.0))
    }

    /// Snapshot of live nodes in draw order
    pub fn nodes(&self) -> Vec<NodeState> {
        self.nodes
            .borrow()
            .iter()
            .map(|n| n.borrow())
            .filter(|n| !n.removed)
            .map(|n| (*n).clone())
            .collect()
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes
            .borrow()
            .iter()
            .filter(|n| !n.borrow().removed)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop removed nodes from the draw list
    pub fn prune(&self) {
        self.nodes.borrow_mut().retain(|n| !n.borrow().removed);
    }
}
