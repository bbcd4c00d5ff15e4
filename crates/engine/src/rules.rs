//! The rules engine capability consumed by the session core.
//!
//! The core never inspects a board directly. Everything it needs to know -
//! whose turn it is, whether a move is acceptable, and what state the game is
//! in afterwards - is asked through [`RulesEngine`].

use std::fmt;

use chess_rooms_types::{BoardFlags, Color};

/// Why the engine refused a move or a position.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RulesError {
    /// The token is not a move in the engine's notation.
    #[error("unparseable move token: {0:?}")]
    Unparseable(String),

    /// The token names a move that is not legal in the current position.
    #[error("illegal move: {0}")]
    Illegal(String),

    /// A position description could not be loaded.
    #[error("invalid position: {0}")]
    InvalidPosition(String),
}

/// Result of an accepted move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied<B> {
    /// Position after the move.
    pub board: B,
    /// The accepted move in canonical notation.
    pub token: String,
}

/// Stateless-per-call game rules.
///
/// Implementations must be cheap to share: the registry holds one engine and
/// calls it from many connection tasks at once, always with a board value that
/// is owned by the room being mutated.
pub trait RulesEngine: Send + Sync {
    /// Opaque board value owned by a session.
    type Board: Clone + Send + Sync + fmt::Debug;

    /// Starting position of a fresh game.
    fn initial(&self) -> Self::Board;

    /// Validate and play `token` against `board`, returning the new position.
    fn apply(&self, board: &Self::Board, token: &str) -> Result<Applied<Self::Board>, RulesError>;

    fn is_legal(&self, board: &Self::Board, token: &str) -> bool {
        self.apply(board, token).is_ok()
    }

    /// Side whose move it is.
    fn turn(&self, board: &Self::Board) -> Color;

    fn is_check(&self, board: &Self::Board) -> bool;

    fn is_checkmate(&self, board: &Self::Board) -> bool;

    fn is_stalemate(&self, board: &Self::Board) -> bool;

    fn is_insufficient_material(&self, board: &Self::Board) -> bool;

    /// Textual snapshot of the position sent to clients (FEN for chess).
    fn position(&self, board: &Self::Board) -> String;

    /// All status predicates for `board` at once.
    fn flags(&self, board: &Self::Board) -> BoardFlags {
        BoardFlags {
            check: self.is_check(board),
            checkmate: self.is_checkmate(board),
            stalemate: self.is_stalemate(board),
            insufficient_material: self.is_insufficient_material(board),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rules_error_display() {
        assert_eq!(
            RulesError::Unparseable("zz".to_string()).to_string(),
            "unparseable move token: \"zz\""
        );
        assert_eq!(
            RulesError::Illegal("e2e5".to_string()).to_string(),
            "illegal move: e2e5"
        );
    }
}
