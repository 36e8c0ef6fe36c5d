//! Error types for move validation and game lifecycle.

use derive_more::{Display, From};

use crate::types::{BOARD_SIZE, GameStatus, PlayerId, Position, Side};

/// Longest comment a move may carry, in characters.
pub const MAX_COMMENT_LEN: usize = 300;

/// A submitted move failed field-level validation.
///
/// Callers attach these to the offending input and ask for it again.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum ValidationError {
    /// A coordinate lies outside the board.
    #[display("Invalid move position ({x}, {y}): coordinates must be between 0 and {}", BOARD_SIZE - 1)]
    OutOfBounds {
        /// Submitted column.
        x: i32,
        /// Submitted row.
        y: i32,
    },

    /// The target square already holds a mark.
    #[display("Square {_0} is not empty")]
    Occupied(Position),

    /// The comment exceeds [`MAX_COMMENT_LEN`].
    #[display("Comment is {_0} characters long (at most {} allowed)", MAX_COMMENT_LEN)]
    CommentTooLong(usize),
}

impl std::error::Error for ValidationError {}

/// Error raised by [`GameState`](crate::GameState) operations.
#[derive(Debug, Clone, PartialEq, Eq, Display, From)]
pub enum GameError {
    /// The move itself is malformed or targets an occupied square.
    #[display("{_0}")]
    #[from]
    Invalid(ValidationError),

    /// The game has already ended.
    #[display("Cannot make move on finished game ({_0})")]
    Finished(GameStatus),

    /// A move was submitted for the side that is not on turn.
    #[display("It is not the {_0} player's turn")]
    OutOfTurn(Side),

    /// A game was set up with the same player in both seats.
    #[display("Player {_0} cannot play against themselves")]
    SamePlayer(PlayerId),

    /// Two stored moves claim one square. The move log is corrupt.
    #[display("Square {_0} holds more than one move")]
    CellConflict(Position),
}

impl std::error::Error for GameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GameError::Invalid(e) => Some(e),
            _ => None,
        }
    }
}
