//! Composition façade over the core services.
//!
//! One `Session` owns the database, the selected game, the cursor and
//! the annotation state, and wires them together explicitly — the
//! mixin soup this replaces is gone. All mutations are synchronous and
//! single-threaded; collaborators that analyse positions get a FEN
//! snapshot through the node-changed hook and never a live reference
//! into the tree.

use std::collections::HashSet;
use std::path::Path;

use shakmaty::Move;

use crate::arrows::{self, Arrow};
use crate::cursor::Cursor;
use crate::database::{Database, Game};
use crate::error::CoreError;
use crate::history::{self, PAGE_SIZE};
use crate::movetree::{MoveTree, NodeId};
use crate::oracle;

/// Called synchronously with the new position's FEN whenever the
/// active node changes; the analysis collaborator uses it to restart
/// in-flight work keyed to the old position.
pub type NodeChangedHook = Box<dyn Fn(&str) + Send>;

pub struct Session {
    database: Database,
    game_index: usize,
    cursor: Cursor,
    node_changed: Option<NodeChangedHook>,
    /// Transient buffer of moves stepped back over, for undo-style UI
    /// feedback. Cleared by any forward motion; never a structural
    /// deletion.
    popped_moves: Vec<Move>,
}

impl Session {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CoreError> {
        Ok(Self::with_database(Database::open(path)?))
    }

    pub fn with_database(database: Database) -> Self {
        let cursor = Cursor::new(MoveTree::ROOT);
        Self {
            database,
            game_index: 0,
            cursor,
            node_changed: None,
            popped_moves: Vec::new(),
        }
    }

    pub fn set_node_changed_hook(&mut self, hook: NodeChangedHook) {
        self.node_changed = Some(hook);
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn game_index(&self) -> usize {
        self.game_index
    }

    pub fn game(&self) -> &Game {
        // The selected index is kept in bounds by select_game.
        self.database
            .get(self.game_index)
            .expect("selected game index is always in bounds")
    }

    pub fn tree(&self) -> &MoveTree {
        &self.game().tree
    }

    // Borrows through the database field only, so the cursor can be
    // mutated while the tree is held.
    fn tree_of(database: &Database, index: usize) -> &MoveTree {
        &database
            .get(index)
            .expect("selected game index is always in bounds")
            .tree
    }

    fn tree_mut(&mut self) -> &mut MoveTree {
        let index = self.game_index;
        &mut self
            .database
            .get_mut(index)
            .expect("selected game index is always in bounds")
            .tree
    }

    pub fn current_node(&self) -> NodeId {
        self.cursor.node()
    }

    pub fn half_move(&self) -> f64 {
        self.cursor.half_move()
    }

    pub fn current_fen(&self) -> String {
        oracle::fen(self.tree().board(self.cursor.node()))
    }

    fn emit_node_changed(&self) {
        if let Some(hook) = &self.node_changed {
            hook(&self.current_fen());
        }
    }

    /// Play a move at the cursor. An equal existing child is reused
    /// (never duplicated); otherwise the move is appended as a side
    /// line, or promoted to the main line when `as_main` is set. An
    /// illegal move leaves the tree and cursor untouched.
    pub fn make_move(&mut self, mv: Move, as_main: bool) -> Result<(), CoreError> {
        let at = self.cursor.node();
        let child = if self.tree().has_variation(at, &mv) {
            self.tree().variation(at, &mv)?
        } else if as_main {
            self.tree_mut().add_main_variation(at, mv)?
        } else {
            self.tree_mut().add_variation(at, mv)?
        };
        self.cursor.advance(child);
        self.popped_moves.clear();
        self.emit_node_changed();
        Ok(())
    }

    /// Convenience entry point for UCI-shaped user input.
    pub fn play_uci(&mut self, uci: &str, as_main: bool) -> Result<(), CoreError> {
        let mv = oracle::move_from_uci(self.tree().board(self.cursor.node()), uci)?;
        self.make_move(mv, as_main)
    }

    /// One half-move back; silently stays put at the root.
    pub fn move_back(&mut self) {
        let node = self.cursor.node();
        let tree = Self::tree_of(&self.database, self.game_index);
        if self.cursor.move_back(tree) {
            let mv = tree.move_of(node).cloned();
            if let Some(mv) = mv {
                self.popped_moves.push(mv);
            }
            self.emit_node_changed();
        }
    }

    /// One half-move forward along the main line; silently stays put at
    /// a leaf.
    pub fn move_forward(&mut self) {
        let tree = Self::tree_of(&self.database, self.game_index);
        if self.cursor.move_forward(tree) {
            self.popped_moves.clear();
            self.emit_node_changed();
        }
    }

    /// Reposition onto an arbitrary node of the current game.
    pub fn jump_to(&mut self, node: NodeId) {
        let tree = Self::tree_of(&self.database, self.game_index);
        self.cursor.jump_to(tree, node);
        self.popped_moves.clear();
        self.emit_node_changed();
    }

    pub fn popped_moves(&self) -> &[Move] {
        &self.popped_moves
    }

    /// Switch to another game. Out of range is an error and the
    /// previous selection stays active.
    pub fn select_game(&mut self, index: usize) -> Result<(), CoreError> {
        self.database.get(index)?;
        self.game_index = index;
        self.cursor.reset(MoveTree::ROOT);
        self.popped_moves.clear();
        self.emit_node_changed();
        Ok(())
    }

    pub fn add_game(&mut self) {
        self.database.add_default();
    }

    /// The annotated move list for the text panel, flattened along the
    /// line the cursor is on and windowed for autoscroll.
    pub fn history(&self) -> Vec<String> {
        let tree = self.tree();
        // The formatter's walk always starts at the root's main child,
        // so the root's own branch choice is dropped from the path.
        let path = tree.variation_path(self.cursor.node());
        let path = path.get(1..).unwrap_or(&[]);
        let moves = history::move_text_history(tree, self.cursor.half_move(), path);
        let active = moves
            .iter()
            .position(|m| m.starts_with(history::ACTIVE_MARKER))
            .unwrap_or(0);
        history::autoscroll(moves, active, PAGE_SIZE)
    }

    /// Arrow set of the current node, decoded from its comment.
    pub fn arrows(&self) -> HashSet<Arrow> {
        arrows::set_from_comment(self.tree().comment(self.cursor.node()))
    }

    /// Toggle an arrow on the current node and persist the new set into
    /// the comment. Returns true when the arrow was added.
    pub fn draw_arrow(&mut self, arrow: Arrow) -> bool {
        let node = self.cursor.node();
        let mut set = self.arrows();
        let added = arrows::toggle(&mut set, arrow);
        let comment = arrows::write_to_comment(self.tree().comment(node), &set);
        self.tree_mut().set_comment(node, comment);
        added
    }

    pub fn comment(&self) -> &str {
        self.tree().comment(self.cursor.node())
    }

    /// Replace the current node's free text, keeping the arrow marker
    /// region intact.
    pub fn set_comment(&mut self, text: &str) {
        let node = self.cursor.node();
        let set = self.arrows();
        let comment = if set.is_empty() {
            text.to_string()
        } else {
            arrows::write_to_comment(text, &set)
        };
        self.tree_mut().set_comment(node, comment);
    }

    pub fn save(&self) -> Result<(), CoreError> {
        self.database.save(None)
    }
}
