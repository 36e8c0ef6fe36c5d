//! Tic-tac-toe between registered users, persisted in SQLite.
//!
//! The rules live in [`tictactoe_engine`]. This crate stores games and
//! runs moves against them:
//!
//! - **Store**: [`GameStore`] with a diesel/SQLite [`GameRepository`] and
//!   an in-memory [`MemoryGameStore`]
//! - **Locks**: [`GameLocks`], one mutex per game
//! - **Service**: [`GameService`], the read path and the move path
//! - **Config**: [`AppConfig`] for the command-line binary
//!
//! # Example
//!
//! ```
//! use tictactoe::{GameService, GameStatus, MemoryGameStore, PlayerId};
//!
//! # fn main() -> Result<(), tictactoe::ServiceError> {
//! let service = GameService::new(MemoryGameStore::new());
//! let game = service.create_game(PlayerId(1), PlayerId(2))?;
//!
//! let outcome = service.make_move(*game.id(), PlayerId(1), 1, 1, "center")?;
//! assert_eq!(*outcome.status(), GameStatus::SecondToMove);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod config;
mod db;
mod locks;
mod memory_store;
mod service;
mod store;

// Crate-level exports - Configuration
pub use config::{AppConfig, ConfigError, DATABASE_ENV, DEFAULT_CONFIG_FILE};

// Crate-level exports - Database
pub use db::{DbError, GameRepository, User};

// Crate-level exports - Storage
pub use memory_store::MemoryGameStore;
pub use store::{
    GameFilter, GameId, GameRecord, GameStore, StoreError, StoredGame, active_games_for_user,
    games_for_user,
};

// Crate-level exports - Concurrency
pub use locks::GameLocks;

// Crate-level exports - Service
pub use service::{ErrorKind, GameService, GameView, MoveOutcome, PermissionError, ServiceError};

// Crate-level exports - Game types
pub use tictactoe_engine::{
    BOARD_SIZE, Board, Cell, GameError, GameState, GameStatus, MAX_COMMENT_LEN, Move, PlayerId,
    Position, Side, ValidationError,
};
