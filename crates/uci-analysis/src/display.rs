//! Evaluation display.
//!
//! Turns raw engine scores (side-to-move perspective) into the
//! White-perspective strings shown to the user, and UCI PVs into
//! numbered SAN lines.

use chess_core::oracle;
use shakmaty::Position as _;

use crate::engine::InfoLine;

/// Human-readable score, normalized so positive always favors White.
///
/// Centipawn scores render as pawns with two decimals and an explicit
/// sign ("+0.35", "-1.20"); mates render as "#N" / "#-N". `mate` wins
/// over `cp` when both are present.
pub fn format_score(cp: Option<i32>, mate: Option<i32>, white_to_move: bool) -> String {
    let sign = if white_to_move { 1 } else { -1 };
    if let Some(mate) = mate {
        return format!("#{}", mate * sign);
    }
    let cp = cp.unwrap_or(0) * sign;
    format!("{:+.2}", cp as f64 / 100.0)
}

/// Render a UCI PV as a numbered SAN line starting from `fen`.
///
/// Move numbers follow PGN convention: White moves are always numbered,
/// Black moves only when they open the line ("3... e5"). Stops at the
/// first move that fails to resolve, keeping the prefix.
pub fn pv_san(fen: &str, pv: &[String]) -> String {
    let mut pos = match oracle::position_from_fen(fen) {
        Ok(pos) => pos,
        Err(_) => return String::new(),
    };
    let mut out = String::new();
    for (i, uci) in pv.iter().enumerate() {
        let mv = match oracle::move_from_uci(&pos, uci) {
            Ok(mv) => mv,
            Err(_) => break,
        };
        let san = oracle::san(&pos, &mv);
        let number = pos.fullmoves();
        if oracle::white_to_move(&pos) {
            out.push_str(&format!("{number}. "));
        } else if i == 0 {
            out.push_str(&format!("{number}... "));
        }
        out.push_str(&san);
        out.push(' ');
        pos = match oracle::apply(&pos, &mv) {
            Ok(next) => next,
            Err(_) => break,
        };
    }
    out.trim_end().to_string()
}

/// Fixed slots of formatted analysis lines, one per PV rank.
///
/// Updates land in the slot named by the info line's `multipv` field;
/// stale slots keep their last value until [`clear`](Self::clear).
#[derive(Debug)]
pub struct AnalysisDisplay {
    slots: Vec<String>,
}

impl AnalysisDisplay {
    pub fn new(multipv: u32) -> Self {
        Self {
            slots: vec![String::new(); multipv as usize],
        }
    }

    /// Format `line` (computed for `fen`) into its slot.
    pub fn update(&mut self, fen: &str, line: &InfoLine) {
        let slot = line.multipv.saturating_sub(1) as usize;
        if slot >= self.slots.len() {
            return;
        }
        let white = oracle::position_from_fen(fen)
            .map(|pos| oracle::white_to_move(&pos))
            .unwrap_or(true);
        let score = format_score(line.cp, line.mate, white);
        self.slots[slot] = format!("{score}  d{}  {}", line.depth, pv_san(fen, &line.pv));
    }

    pub fn lines(&self) -> &[String] {
        &self.slots
    }

    /// Blank every slot, for when the target position changes.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            slot.clear();
        }
    }
}
