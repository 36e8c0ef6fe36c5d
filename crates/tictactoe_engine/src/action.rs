//! Moves and move drafts.
//!
//! A [`MoveDraft`] is what a game hands out when it is ready to accept a
//! move: the side is fixed by the game, the square and comment are filled in
//! by whoever collects the player's input.

use serde::Serialize;
use tracing::instrument;

use crate::error::{MAX_COMMENT_LEN, ValidationError};
use crate::types::{Position, Side};

/// A mark placed on the board.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Move {
    side: Side,
    position: Position,
    comment: String,
}

impl Move {
    /// Creates a move without a comment.
    pub fn new(side: Side, position: Position) -> Self {
        Self {
            side,
            position,
            comment: String::new(),
        }
    }

    /// Attaches a comment to the move.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::CommentTooLong`] past [`MAX_COMMENT_LEN`]
    /// characters.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Result<Self, ValidationError> {
        let comment = comment.into();
        let len = comment.chars().count();
        if len > MAX_COMMENT_LEN {
            return Err(ValidationError::CommentTooLong(len));
        }
        self.comment = comment;
        Ok(self)
    }

    /// Side that made the move.
    pub fn side(&self) -> Side {
        self.side
    }

    /// Storage flag: true when the first player moved.
    pub fn by_first_player(&self) -> bool {
        self.side.is_first()
    }

    /// Target square.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Free-text comment, possibly empty.
    pub fn comment(&self) -> &str {
        &self.comment
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} player -> {}", self.side, self.position)
    }
}

/// An unsaved move whose side is already decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveDraft {
    side: Side,
}

impl MoveDraft {
    pub(crate) fn new(side: Side) -> Self {
        Self { side }
    }

    /// Side the move will be recorded for.
    pub fn side(&self) -> Side {
        self.side
    }

    /// True when the draft belongs to the first player.
    pub fn by_first_player(&self) -> bool {
        self.side.is_first()
    }

    /// Fills in the square and comment.
    ///
    /// The position should come from
    /// [`GameState::validate_position`](crate::GameState::validate_position)
    /// so that occupancy has been checked against the current board.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::CommentTooLong`] for an over-long comment.
    #[instrument(skip(comment))]
    pub fn complete(
        self,
        position: Position,
        comment: impl Into<String>,
    ) -> Result<Move, ValidationError> {
        Move::new(self.side, position).with_comment(comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_keeps_side() {
        let pos = Position::new(1, 2).unwrap();
        let mv = MoveDraft::new(Side::Second).complete(pos, "hmm").unwrap();
        assert_eq!(mv.side(), Side::Second);
        assert!(!mv.by_first_player());
        assert_eq!(mv.position(), pos);
        assert_eq!(mv.comment(), "hmm");
    }

    #[test]
    fn test_comment_limit_counts_characters() {
        let pos = Position::new(0, 0).unwrap();
        let at_limit = "é".repeat(MAX_COMMENT_LEN);
        assert!(Move::new(Side::First, pos).with_comment(at_limit).is_ok());

        let over = "a".repeat(MAX_COMMENT_LEN + 1);
        assert_eq!(
            Move::new(Side::First, pos).with_comment(over),
            Err(ValidationError::CommentTooLong(MAX_COMMENT_LEN + 1))
        );
    }
}
