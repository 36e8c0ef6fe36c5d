//! Persistence boundary for games.
//!
//! [`GameStore`] is the capability the game service needs from storage:
//! create a game, load it with its moves, append a move together with the
//! new status, and list games. The SQLite [`GameRepository`](crate::GameRepository)
//! and the in-memory [`MemoryGameStore`](crate::MemoryGameStore) implement it.

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_more::{Display, From};
use derive_new::new;
use serde::{Deserialize, Serialize};
use tictactoe_engine::{GameState, GameStatus, Move, PlayerId};

use crate::db::DbError;

/// Identity of a stored game.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, From,
)]
#[display("{_0}")]
pub struct GameId(pub i32);

/// A game row: seats, status and timestamps, without the moves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Getters, new)]
pub struct GameRecord {
    id: GameId,
    first_player: PlayerId,
    second_player: PlayerId,
    status: GameStatus,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

/// A game row together with its rebuilt state.
#[derive(Debug, Clone, Getters, new)]
pub struct StoredGame {
    record: GameRecord,
    state: GameState,
}

impl StoredGame {
    /// Splits into the row and the state.
    pub fn into_parts(self) -> (GameRecord, GameState) {
        (self.record, self.state)
    }
}

/// Which games a listing should include.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Getters)]
pub struct GameFilter {
    player: Option<PlayerId>,
    active_only: bool,
}

impl GameFilter {
    /// Every game.
    pub fn all() -> Self {
        Self::default()
    }

    /// Games where `player` holds either seat.
    pub fn for_player(player: PlayerId) -> Self {
        Self {
            player: Some(player),
            active_only: false,
        }
    }

    /// Restricts the listing to games that still accept moves.
    pub fn active(mut self) -> Self {
        self.active_only = true;
        self
    }

    /// Whether `record` passes the filter.
    pub fn matches(&self, record: &GameRecord) -> bool {
        let seated = self
            .player
            .is_none_or(|p| p == record.first_player || p == record.second_player);
        seated && (!self.active_only || record.status.is_active())
    }
}

/// Error raised by a [`GameStore`].
#[derive(Debug, Clone, Display, From)]
pub enum StoreError {
    /// The backing database failed.
    #[display("{_0}")]
    #[from]
    Db(DbError),

    /// No game with this id.
    #[display("Game {_0} not found")]
    GameNotFound(GameId),

    /// No user with this id.
    #[display("User {_0} not found")]
    UserNotFound(PlayerId),

    /// Another writer appended a move since the game was loaded.
    #[display("Game {game_id} changed underneath: expected {expected} moves, found {actual}")]
    Conflict {
        /// Game being written.
        game_id: GameId,
        /// Move count the writer validated against.
        expected: usize,
        /// Move count found at commit time.
        actual: usize,
    },

    /// Stored data no game could have produced.
    #[display("Game {game_id} is corrupt: {reason}")]
    Corrupt {
        /// Offending game.
        game_id: GameId,
        /// What was wrong with it.
        reason: String,
    },
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Db(e) => Some(e),
            _ => None,
        }
    }
}

impl From<diesel::result::Error> for StoreError {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        StoreError::Db(DbError::from(err))
    }
}

/// Storage for games and their move logs.
///
/// Implementations must make [`GameStore::append_move`] atomic: the move and
/// the new status are written together or not at all, and readers never see
/// one without the other.
pub trait GameStore: Send + Sync {
    /// Inserts a new game with the first player to move.
    fn create_game(
        &self,
        first_player: PlayerId,
        second_player: PlayerId,
    ) -> Result<GameRecord, StoreError>;

    /// Loads a game and its moves, or `None` if it does not exist.
    fn load_game(&self, id: GameId) -> Result<Option<StoredGame>, StoreError>;

    /// Appends `mv` and sets `status`, provided the game still holds
    /// `expected_moves` moves.
    ///
    /// Returns [`StoreError::Conflict`] if the count differs.
    fn append_move(
        &self,
        id: GameId,
        expected_moves: usize,
        mv: &Move,
        status: GameStatus,
    ) -> Result<GameRecord, StoreError>;

    /// Lists games passing `filter`, most recently active first.
    fn list_games(&self, filter: GameFilter) -> Result<Vec<GameRecord>, StoreError>;
}

/// Games `player` takes part in.
pub fn games_for_user(
    store: &impl GameStore,
    player: PlayerId,
) -> Result<Vec<GameRecord>, StoreError> {
    store.list_games(GameFilter::for_player(player))
}

/// Unfinished games `player` takes part in.
pub fn active_games_for_user(
    store: &impl GameStore,
    player: PlayerId,
) -> Result<Vec<GameRecord>, StoreError> {
    store.list_games(GameFilter::for_player(player).active())
}
