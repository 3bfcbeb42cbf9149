//! Rules oracle — the only module that talks to shakmaty directly.
//!
//! The tree, cursor and formatter never inspect board state themselves;
//! they ask this module to apply moves, render SAN and produce FENs.

use shakmaty::fen::Fen;
use shakmaty::san::{San, SanPlus};
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, EnPassantMode, Move, Piece, Position, Square};

use crate::error::CoreError;

/// The standard starting position.
pub fn start_position() -> Chess {
    Chess::default()
}

/// UCI string of a move, used for error messages and wire formats.
pub fn uci(mv: &Move) -> String {
    mv.to_uci(CastlingMode::Standard).to_string()
}

/// Apply `mv` to `pos`, returning the resulting position.
/// The input position is never mutated.
pub fn apply(pos: &Chess, mv: &Move) -> Result<Chess, CoreError> {
    pos.clone()
        .play(mv.clone())
        .map_err(|_| CoreError::IllegalMove(uci(mv)))
}

/// SAN of `mv` as played from `pos` (the parent position), including
/// the check/mate suffix.
pub fn san(pos: &Chess, mv: &Move) -> String {
    let mut s = San::from_move(pos, mv.clone()).to_string();
    if let Ok(after) = pos.clone().play(mv.clone()) {
        if after.is_checkmate() {
            s.push('#');
        } else if after.is_check() {
            s.push('+');
        }
    }
    s
}

pub fn is_check(pos: &Chess) -> bool {
    pos.is_check()
}

pub fn white_to_move(pos: &Chess) -> bool {
    pos.turn().is_white()
}

/// Piece placement of the position, for board rendering.
pub fn piece_map(pos: &Chess) -> Vec<(Square, Piece)> {
    let board = pos.board();
    board
        .occupied()
        .into_iter()
        .filter_map(|sq| board.piece_at(sq).map(|p| (sq, p)))
        .collect()
}

pub fn fen(pos: &Chess) -> String {
    Fen::from_position(pos, EnPassantMode::Legal).to_string()
}

pub fn position_from_fen(fen: &str) -> Result<Chess, CoreError> {
    let parsed: Fen = fen
        .parse()
        .map_err(|_| CoreError::InvalidFen(fen.to_string()))?;
    parsed
        .into_position(CastlingMode::Standard)
        .map_err(|_| CoreError::InvalidFen(fen.to_string()))
}

/// Resolve a UCI move string against a position.
pub fn move_from_uci(pos: &Chess, uci: &str) -> Result<Move, CoreError> {
    let parsed: UciMove = uci
        .parse()
        .map_err(|_| CoreError::InvalidMove(uci.to_string()))?;
    parsed
        .to_move(pos)
        .map_err(|_| CoreError::IllegalMove(uci.to_string()))
}

/// Resolve a SAN move string (check/mate suffix allowed) against a
/// position.
pub fn move_from_san(pos: &Chess, san: &str) -> Result<Move, CoreError> {
    let parsed: SanPlus = san
        .parse()
        .map_err(|_| CoreError::InvalidMove(san.to_string()))?;
    parsed
        .san
        .to_move(pos)
        .map_err(|_| CoreError::IllegalMove(san.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_legal_and_illegal() {
        let pos = start_position();
        let e4 = move_from_uci(&pos, "e2e4").unwrap();
        let after = apply(&pos, &e4).unwrap();
        assert!(!white_to_move(&after));

        // e2e5 is not a legal pawn move
        assert!(move_from_uci(&pos, "e2e5").is_err());
    }

    #[test]
    fn test_san_of_parent_position() {
        let pos = start_position();
        let nf3 = move_from_san(&pos, "Nf3").unwrap();
        assert_eq!(san(&pos, &nf3), "Nf3");
    }

    #[test]
    fn test_san_check_suffix() {
        // Scholar's mate: 1. e4 e5 2. Bc4 Nc6 3. Qh5 Nf6 4. Qxf7#
        let mut pos = start_position();
        for m in ["e4", "e5", "Bc4", "Nc6", "Qh5", "Nf6"] {
            let mv = move_from_san(&pos, m).unwrap();
            pos = apply(&pos, &mv).unwrap();
        }
        let mate = move_from_san(&pos, "Qxf7").unwrap();
        assert_eq!(san(&pos, &mate), "Qxf7#");
    }

    #[test]
    fn test_fen_round_trip() {
        let pos = start_position();
        let e4 = move_from_uci(&pos, "e2e4").unwrap();
        let after = apply(&pos, &e4).unwrap();
        let restored = position_from_fen(&fen(&after)).unwrap();
        assert_eq!(fen(&restored), fen(&after));
    }

    #[test]
    fn test_piece_map_start_count() {
        assert_eq!(piece_map(&start_position()).len(), 32);
    }
}
