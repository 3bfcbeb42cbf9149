//! Move-variation tree.
//!
//! A game is a tree of plies: every node holds the move that led into
//! it, an ordered list of child variations (index 0 is the main line)
//! and a free-form comment. Nodes live in an arena owned by the tree;
//! `NodeId` handles keep parent links non-owning, so ownership runs
//! strictly root-to-leaf.
//!
//! The tree is append-only: nodes are never removed, which is what
//! makes caching the position per node safe.

use shakmaty::{Chess, Move};

use crate::error::CoreError;
use crate::oracle;

/// Handle into a tree's node arena. Only valid for the tree that
/// produced it; trees never share nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct Node {
    /// The move that led into this node. `None` only for the root.
    mv: Option<Move>,
    parent: Option<NodeId>,
    /// Ordered children; index 0 is the main-line continuation.
    variations: Vec<NodeId>,
    comment: String,
    /// Position after applying `mv` to the parent's position. Equal to
    /// replaying the move path from the root.
    position: Chess,
}

#[derive(Debug, Clone)]
pub struct MoveTree {
    nodes: Vec<Node>,
}

impl MoveTree {
    pub const ROOT: NodeId = NodeId(0);

    /// A fresh tree containing only a root at the standard starting
    /// position.
    pub fn new() -> Self {
        Self::with_position(oracle::start_position())
    }

    pub fn with_position(position: Chess) -> Self {
        Self {
            nodes: vec![Node {
                mv: None,
                parent: None,
                variations: Vec::new(),
                comment: String::new(),
                position,
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        Self::ROOT
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// The move that led into `id`; `None` for the root.
    pub fn move_of(&self, id: NodeId) -> Option<&Move> {
        self.node(id).mv.as_ref()
    }

    pub fn variations(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).variations
    }

    pub fn is_end(&self, id: NodeId) -> bool {
        self.node(id).variations.is_empty()
    }

    /// Position at `id`. Cached at insertion time; the append-only tree
    /// makes the cache impossible to invalidate.
    pub fn board(&self, id: NodeId) -> &Chess {
        &self.node(id).position
    }

    pub fn comment(&self, id: NodeId) -> &str {
        &self.node(id).comment
    }

    pub fn set_comment(&mut self, id: NodeId, comment: String) {
        self.node_mut(id).comment = comment;
    }

    /// True iff some child of `id` was reached by a move equal to `mv`.
    pub fn has_variation(&self, id: NodeId, mv: &Move) -> bool {
        self.node(id)
            .variations
            .iter()
            .any(|&c| self.node(c).mv.as_ref() == Some(mv))
    }

    /// The existing child of `id` reached by `mv`.
    pub fn variation(&self, id: NodeId, mv: &Move) -> Result<NodeId, CoreError> {
        self.node(id)
            .variations
            .iter()
            .copied()
            .find(|&c| self.node(c).mv.as_ref() == Some(mv))
            .ok_or_else(|| CoreError::VariationNotFound(oracle::uci(mv)))
    }

    /// Append `mv` as the last variation of `id`.
    ///
    /// Callers must route equal moves through [`variation`] instead;
    /// inserting a duplicate is a programmer error.
    pub fn add_variation(&mut self, id: NodeId, mv: Move) -> Result<NodeId, CoreError> {
        let child = self.new_child(id, mv)?;
        self.node_mut(id).variations.push(child);
        Ok(child)
    }

    /// Insert `mv` at index 0 of `id`'s variations, promoting it to the
    /// main line. Existing children shift up by one.
    pub fn add_main_variation(&mut self, id: NodeId, mv: Move) -> Result<NodeId, CoreError> {
        let child = self.new_child(id, mv)?;
        self.node_mut(id).variations.insert(0, child);
        Ok(child)
    }

    fn new_child(&mut self, id: NodeId, mv: Move) -> Result<NodeId, CoreError> {
        debug_assert!(
            !self.has_variation(id, &mv),
            "duplicate variation {}",
            oracle::uci(&mv)
        );
        let position = oracle::apply(self.board(id), &mv)?;
        let child = NodeId(self.nodes.len());
        self.nodes.push(Node {
            mv: Some(mv),
            parent: Some(id),
            variations: Vec::new(),
            comment: String::new(),
            position,
        });
        Ok(child)
    }

    /// Number of plies from the root to `id`.
    pub fn ply(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut cur = id;
        while let Some(p) = self.node(cur).parent {
            depth += 1;
            cur = p;
        }
        depth
    }

    /// Nodes from the root down to `id`, inclusive.
    pub fn path_from_root(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = vec![id];
        let mut cur = id;
        while let Some(p) = self.node(cur).parent {
            path.push(p);
            cur = p;
        }
        path.reverse();
        path
    }

    /// Child indices chosen at each node (root included) to reach `id`
    /// from the root. Dropping the leading root choice gives the
    /// history formatter's variation path for the line `id` lies on.
    pub fn variation_path(&self, id: NodeId) -> Vec<usize> {
        let path = self.path_from_root(id);
        path.windows(2)
            .map(|w| {
                self.node(w[0])
                    .variations
                    .iter()
                    .position(|&c| c == w[1])
                    .unwrap_or(0)
            })
            .collect()
    }

    /// Follow main-line children from `id` to the end of the line.
    pub fn mainline_end(&self, id: NodeId) -> NodeId {
        let mut cur = id;
        while let Some(&next) = self.node(cur).variations.first() {
            cur = next;
        }
        cur
    }

    /// SAN of the move leading into `id`, rendered from the parent's
    /// position. `None` for the root.
    pub fn san(&self, id: NodeId) -> Option<String> {
        let node = self.node(id);
        let mv = node.mv.as_ref()?;
        let parent = node.parent?;
        Some(oracle::san(self.board(parent), mv))
    }
}

impl Default for MoveTree {
    fn default() -> Self {
        Self::new()
    }
}
