//! Board projection of a game's move log.
//!
//! The board is never stored. It is rebuilt from the moves every time it is
//! needed, so it cannot drift from the log.

use serde::Serialize;
use tracing::{debug, instrument};

use crate::action::Move;
use crate::error::GameError;
use crate::rules;
use crate::types::{BOARD_SIZE, Cell, Position};

/// 3x3 grid indexed `[row][col]`, i.e. `[y][x]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Board {
    rows: [[Cell; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self {
            rows: [[Cell::Empty; BOARD_SIZE]; BOARD_SIZE],
        }
    }

    /// Places every move on a fresh board.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::CellConflict`] if two moves claim the same square.
    /// Games never accept such a move, so this signals a corrupt log.
    #[instrument(skip(moves))]
    pub fn build<'a>(moves: impl IntoIterator<Item = &'a Move>) -> Result<Self, GameError> {
        let mut board = Self::new();
        let mut placed = 0usize;
        for mv in moves {
            let pos = mv.position();
            let cell = &mut board.rows[pos.y()][pos.x()];
            if cell.is_occupied() {
                return Err(GameError::CellConflict(pos));
            }
            *cell = Cell::from(mv.side());
            placed += 1;
        }
        debug!(placed, "Board built");
        Ok(board)
    }

    /// Contents of the square at `position`.
    pub fn cell(&self, position: Position) -> Cell {
        self.rows[position.y()][position.x()]
    }

    /// True if `position` already holds a mark.
    pub fn is_occupied(&self, position: Position) -> bool {
        self.cell(position).is_occupied()
    }

    /// Rows from top to bottom.
    pub fn rows(&self) -> &[[Cell; BOARD_SIZE]; BOARD_SIZE] {
        &self.rows
    }

    /// Number of marked squares.
    pub fn occupied_count(&self) -> usize {
        self.rows
            .iter()
            .flatten()
            .filter(|c| c.is_occupied())
            .count()
    }

    /// Whether a line through `position` is held entirely by one side.
    ///
    /// Only lines through the given square are examined. Call it with the
    /// square of the move that was just placed.
    pub fn has_winning_line_through(&self, position: Position) -> bool {
        rules::has_winning_line_through(self, position)
    }

    /// Formats the board as a human-readable grid.
    pub fn display(&self) -> String {
        let mut result = String::from("  0 1 2\n");
        for (y, row) in self.rows.iter().enumerate() {
            result.push_str(&y.to_string());
            for cell in row {
                result.push(' ');
                result.push(cell.symbol());
            }
            if y + 1 < BOARD_SIZE {
                result.push('\n');
            }
        }
        result
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
