//! Tree cursor.
//!
//! Tracks the node currently in view plus a half-move counter that
//! advances by 0.5 per ply. The counter only drives display emphasis
//! and autoscroll; game logic never reads it.

use crate::movetree::{MoveTree, NodeId};

#[derive(Debug, Clone)]
pub struct Cursor {
    node: NodeId,
    half_move: f64,
}

impl Cursor {
    pub fn new(root: NodeId) -> Self {
        Self {
            node: root,
            half_move: 0.0,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn half_move(&self) -> f64 {
        self.half_move
    }

    /// Step to the parent node. Silent no-op at the root.
    /// Returns true if the cursor moved.
    pub fn move_back(&mut self, tree: &MoveTree) -> bool {
        match tree.parent(self.node) {
            Some(parent) => {
                self.node = parent;
                self.half_move -= 0.5;
                true
            }
            None => false,
        }
    }

    /// Step to the main-line child (index 0). Silent no-op at a leaf.
    /// Returns true if the cursor moved.
    pub fn move_forward(&mut self, tree: &MoveTree) -> bool {
        match tree.variations(self.node).first() {
            Some(&child) => {
                self.node = child;
                self.half_move += 0.5;
                true
            }
            None => false,
        }
    }

    /// Arbitrary repositioning, e.g. when a variation is selected from
    /// a menu. The counter is recomputed from the node's depth.
    pub fn jump_to(&mut self, tree: &MoveTree, node: NodeId) {
        self.node = node;
        self.half_move = tree.ply(node) as f64 * 0.5;
    }

    /// Used when switching games: back to the given root, counter 0.
    pub fn reset(&mut self, root: NodeId) {
        self.node = root;
        self.half_move = 0.0;
    }

    /// Advance onto a child that was just played or reused.
    pub fn advance(&mut self, node: NodeId) {
        self.node = node;
        self.half_move += 0.5;
    }
}
