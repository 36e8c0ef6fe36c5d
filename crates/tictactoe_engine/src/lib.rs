//! Tic-tac-toe game-state engine.
//!
//! Pure game logic with no I/O:
//!
//! - [`Board`] projects a move log onto a 3x3 grid and answers whether a
//!   line through a square is complete.
//! - [`GameState`] owns the seats, the status and the move log. It decides
//!   whose turn it is, whether a square is playable, and what the status
//!   becomes after a move.
//!
//! # Example
//!
//! ```
//! use tictactoe_engine::{GameState, GameStatus, PlayerId};
//!
//! # fn main() -> Result<(), tictactoe_engine::GameError> {
//! let mut game = GameState::new(PlayerId(1), PlayerId(2))?;
//! assert!(game.is_players_turn(PlayerId(1)));
//!
//! let draft = game.propose_move()?;
//! let square = game.validate_position(1, 1)?;
//! let status = game.record_move(draft.complete(square, "center")?)?;
//! assert_eq!(status, GameStatus::SecondToMove);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod action;
mod board;
mod error;
pub mod rules;
mod state;
mod types;

pub use action::{Move, MoveDraft};
pub use board::Board;
pub use error::{GameError, MAX_COMMENT_LEN, ValidationError};
pub use state::GameState;
pub use types::{BOARD_SIZE, CELL_COUNT, Cell, GameStatus, PlayerId, Position, Side};
