//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    /// Rejected by the rules oracle. Recoverable: the tree is untouched
    /// and the caller aborts the pending gesture.
    #[error("illegal move {0}")]
    IllegalMove(String),

    /// A variation lookup missed. Reaching this after a correct
    /// `has_variation` check is a contract violation on the caller.
    #[error("no variation for move {0}")]
    VariationNotFound(String),

    #[error("game index {index} out of range (len {len})")]
    GameIndexOutOfRange { index: usize, len: usize },

    #[error("invalid FEN: {0}")]
    InvalidFen(String),

    #[error("unparseable move '{0}'")]
    InvalidMove(String),

    #[error("PGN error: {0}")]
    Pgn(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
