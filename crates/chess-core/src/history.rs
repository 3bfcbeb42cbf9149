//! History formatter.
//!
//! Flattens one line of a move tree into numbered move-pair strings for
//! the text panel. Each entry carries its flags as leading marker
//! characters: `*` when a branch point exists in the pair, `\t` on the
//! single active pair. The renderer strips the markers before drawing.

use crate::movetree::{MoveTree, NodeId};

/// Rows shown by the moves panel.
pub const PAGE_SIZE: usize = 15;

pub const ACTIVE_MARKER: char = '\t';
pub const BRANCH_MARKER: char = '*';

/// Child index to follow at each ply when flattening a tree with
/// variations. Missing entries default to the main line.
pub type VariationPath = Vec<usize>;

/// The nodes of the line selected by `path`, starting from the first
/// actual move. Leaving the i-th visited node follows child `path[i]`
/// (out-of-range choices fall back to the main line); the terminal node
/// is always included.
pub fn line_nodes(tree: &MoveTree, path: &[usize]) -> Vec<NodeId> {
    let mut nodes = Vec::new();
    let Some(&first) = tree.variations(tree.root()).first() else {
        return nodes;
    };
    let mut cur = first;
    loop {
        nodes.push(cur);
        let children = tree.variations(cur);
        if children.is_empty() {
            break;
        }
        let mut choice = path.get(nodes.len() - 1).copied().unwrap_or(0);
        if choice >= children.len() {
            choice = 0;
        }
        cur = children[choice];
    }
    nodes
}

/// Group a flat ply sequence into (white, black) pairs; a trailing
/// unpaired ply forms a group of one.
pub fn chunk_pairs<T>(items: &[T]) -> Vec<&[T]> {
    items.chunks(2).collect()
}

/// Index of the group containing the ply addressed by the half-move
/// counter, or `None` when the counter addresses the starting position.
pub fn active_group_index(half_move: f64) -> Option<usize> {
    let idx = (half_move - 0.5).floor();
    if idx < 0.0 {
        None
    } else {
        Some(idx as usize)
    }
}

/// Render the line selected by `path` as numbered move-pair strings.
///
/// Exactly one group carries the active marker: the one matching the
/// half-move counter, or the last group when the counter addresses the
/// starting position or runs past the line.
pub fn move_text_history(tree: &MoveTree, half_move: f64, path: &[usize]) -> Vec<String> {
    let nodes = line_nodes(tree, path);
    let groups = chunk_pairs(&nodes);
    if groups.is_empty() {
        return Vec::new();
    }

    let last = groups.len() - 1;
    let active = match active_group_index(half_move) {
        Some(idx) if idx <= last => idx,
        _ => last,
    };

    groups
        .iter()
        .enumerate()
        .map(|(i, group)| {
            let sans: Vec<String> = group
                .iter()
                .map(|&n| tree.san(n).unwrap_or_default())
                .collect();
            let mut s = format!("{}. {}", i + 1, sans.join(" "));
            if group.iter().any(|&n| tree.variations(n).len() > 1) {
                s.insert(0, BRANCH_MARKER);
            }
            if i == active {
                s.insert(0, ACTIVE_MARKER);
            }
            s
        })
        .collect()
}

/// Strip the marker prefix, returning (is_active, has_branch, text).
pub fn strip_markers(entry: &str) -> (bool, bool, &str) {
    let (active, rest) = match entry.strip_prefix(ACTIVE_MARKER) {
        Some(rest) => (true, rest),
        None => (false, entry),
    };
    let (branch, text) = match rest.strip_prefix(BRANCH_MARKER) {
        Some(text) => (true, text),
        None => (false, rest),
    };
    (active, branch, text)
}

/// Deterministic autoscroll bounds over a list of `len` groups: the
/// half-open window of at most `page` entries to display given the
/// active index. Pure function of its arguments.
pub fn window_bounds(len: usize, active: usize, page: usize) -> (usize, usize) {
    if len <= page {
        return (0, len);
    }
    let half = page / 2;
    if active <= half {
        (0, page)
    } else if active + (page - half) >= len {
        (len - page, len)
    } else {
        (active - half, active - half + page)
    }
}

/// Apply the autoscroll window, padding short lists with blank
/// placeholder rows up to a full page.
pub fn autoscroll(mut moves: Vec<String>, active: usize, page: usize) -> Vec<String> {
    if moves.len() < page {
        moves.resize(page, String::new());
        return moves;
    }
    let (beg, end) = window_bounds(moves.len(), active, page);
    moves[beg..end].to_vec()
}
