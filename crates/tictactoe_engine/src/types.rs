//! Core domain types for tic-tac-toe.

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::ValidationError;

/// Side length of the square board.
pub const BOARD_SIZE: usize = 3;

/// Number of cells on the board, and the most moves a game can hold.
pub const CELL_COUNT: usize = BOARD_SIZE * BOARD_SIZE;

/// Identity of a registered player.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, From,
)]
#[display("{_0}")]
pub struct PlayerId(pub i32);

/// Which seat of a game made a mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, strum::EnumIter)]
pub enum Side {
    /// The player who moves first.
    #[display("first")]
    First,
    /// The player who moves second.
    #[display("second")]
    Second,
}

impl Side {
    /// Returns the other side.
    pub fn opponent(self) -> Self {
        match self {
            Side::First => Side::Second,
            Side::Second => Side::First,
        }
    }

    /// Maps the stored `by_first_player` flag onto a side.
    pub fn from_first_flag(by_first_player: bool) -> Self {
        if by_first_player {
            Side::First
        } else {
            Side::Second
        }
    }

    /// True for [`Side::First`].
    pub fn is_first(self) -> bool {
        matches!(self, Side::First)
    }
}

/// Contents of one board cell.
///
/// Cells compare by value, so two empty cells are equal. Line detection
/// therefore has to rule out [`Cell::Empty`] explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cell {
    /// No mark.
    #[default]
    Empty,
    /// Marked by the first player.
    First,
    /// Marked by the second player.
    Second,
}

impl Cell {
    /// The side that marked this cell, if any.
    pub fn side(self) -> Option<Side> {
        match self {
            Cell::Empty => None,
            Cell::First => Some(Side::First),
            Cell::Second => Some(Side::Second),
        }
    }

    /// True unless the cell is empty.
    pub fn is_occupied(self) -> bool {
        self != Cell::Empty
    }

    /// Single-character rendering used by the text board.
    pub fn symbol(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::First => 'X',
            Cell::Second => 'O',
        }
    }
}

impl From<Side> for Cell {
    fn from(side: Side) -> Self {
        match side {
            Side::First => Cell::First,
            Side::Second => Cell::Second,
        }
    }
}

/// Status of a game.
///
/// `FirstToMove` and `SecondToMove` are active; the other three are terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, strum::EnumIter,
)]
pub enum GameStatus {
    /// Waiting on the first player.
    #[default]
    #[display("First Player To Move")]
    FirstToMove,
    /// Waiting on the second player.
    #[display("Second Player To Move")]
    SecondToMove,
    /// The first player completed a line.
    #[display("First Player Wins")]
    FirstWon,
    /// The second player completed a line.
    #[display("Second Player Wins")]
    SecondWon,
    /// Board filled without a completed line.
    #[display("Draw")]
    Draw,
}

impl GameStatus {
    /// Single-character code used in storage.
    pub fn code(self) -> char {
        match self {
            GameStatus::FirstToMove => 'F',
            GameStatus::SecondToMove => 'S',
            GameStatus::FirstWon => 'W',
            GameStatus::SecondWon => 'L',
            GameStatus::Draw => 'D',
        }
    }

    /// Parses a storage code produced by [`GameStatus::code`].
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'F' => Some(GameStatus::FirstToMove),
            'S' => Some(GameStatus::SecondToMove),
            'W' => Some(GameStatus::FirstWon),
            'L' => Some(GameStatus::SecondWon),
            'D' => Some(GameStatus::Draw),
            _ => None,
        }
    }

    /// True while the game still accepts moves.
    pub fn is_active(self) -> bool {
        matches!(self, GameStatus::FirstToMove | GameStatus::SecondToMove)
    }

    /// True once the game has ended.
    pub fn is_terminal(self) -> bool {
        !self.is_active()
    }

    /// The side expected to move, or `None` for a finished game.
    pub fn side_to_move(self) -> Option<Side> {
        match self {
            GameStatus::FirstToMove => Some(Side::First),
            GameStatus::SecondToMove => Some(Side::Second),
            _ => None,
        }
    }

    /// Active status that waits on `side`.
    pub fn to_move(side: Side) -> Self {
        match side {
            Side::First => GameStatus::FirstToMove,
            Side::Second => GameStatus::SecondToMove,
        }
    }

    /// Terminal status recording a win for `side`.
    pub fn won_by(side: Side) -> Self {
        match side {
            Side::First => GameStatus::FirstWon,
            Side::Second => GameStatus::SecondWon,
        }
    }

    /// The winning side, if the game was won.
    pub fn winner(self) -> Option<Side> {
        match self {
            GameStatus::FirstWon => Some(Side::First),
            GameStatus::SecondWon => Some(Side::Second),
            _ => None,
        }
    }

    /// Hands the turn to the other side. Terminal statuses have no next turn.
    pub fn next_turn(self) -> Option<Self> {
        self.side_to_move().map(|side| Self::to_move(side.opponent()))
    }
}

/// A cell coordinate known to lie on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[display("({x}, {y})")]
pub struct Position {
    x: usize,
    y: usize,
}

impl Position {
    /// Checks raw coordinates against the board bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::OutOfBounds`] if either coordinate falls
    /// outside `0..BOARD_SIZE`.
    #[instrument]
    pub fn new(x: i32, y: i32) -> Result<Self, ValidationError> {
        let in_range = |v: i32| usize::try_from(v).ok().filter(|v| *v < BOARD_SIZE);
        match (in_range(x), in_range(y)) {
            (Some(x), Some(y)) => Ok(Self { x, y }),
            _ => Err(ValidationError::OutOfBounds { x, y }),
        }
    }

    /// Column index.
    pub fn x(self) -> usize {
        self.x
    }

    /// Row index.
    pub fn y(self) -> usize {
        self.y
    }

    /// True for cells on the top-left to bottom-right diagonal.
    pub fn on_main_diagonal(self) -> bool {
        self.x == self.y
    }

    /// True for cells on the top-right to bottom-left diagonal.
    pub fn on_anti_diagonal(self) -> bool {
        self.x + self.y == BOARD_SIZE - 1
    }

    /// Every cell in row-major order.
    pub fn all() -> impl Iterator<Item = Position> {
        (0..BOARD_SIZE).flat_map(|y| (0..BOARD_SIZE).map(move |x| Position { x, y }))
    }
}
