//! Game service: the read and write paths a front end drives.
//!
//! A move runs load, turn check, validation, record and append while
//! holding the game's lock from [`GameLocks`]. The store's move-count check
//! catches writers outside this process.

use derive_getters::Getters;
use derive_more::{Display, From};
use derive_new::new;
use serde::Serialize;
use tictactoe_engine::{Board, GameError, GameState, GameStatus, Move, PlayerId, Side};
use tracing::{debug, info, instrument, warn};

use crate::locks::{GameLocks, acquire};
use crate::store::{GameFilter, GameId, GameRecord, GameStore, StoreError};

/// Why a player may not act on a game.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum PermissionError {
    /// The player holds neither seat.
    #[display("Player {player} is not part of game {game_id}")]
    NotAParticipant {
        /// Game acted on.
        game_id: GameId,
        /// Acting player.
        player: PlayerId,
    },

    /// The player is seated but may not move now.
    #[display("Player {player} may not move in game {game_id} ({status})")]
    NotYourTurn {
        /// Game acted on.
        game_id: GameId,
        /// Acting player.
        player: PlayerId,
        /// Status at the time of the attempt.
        status: GameStatus,
    },
}

impl std::error::Error for PermissionError {}

/// Broad class of a [`ServiceError`], for choosing a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ErrorKind {
    /// Bad input; ask for it again.
    Validation,
    /// The game is not in a state that allows the request.
    InvalidState,
    /// The caller may not act on this game now.
    Permission,
    /// The game or user does not exist.
    NotFound,
    /// Another writer got there first; reload and retry.
    Conflict,
    /// Stored data is inconsistent.
    Defect,
    /// The storage backend failed.
    Storage,
}

/// Error raised by [`GameService`].
#[derive(Debug, Clone, Display, From)]
pub enum ServiceError {
    /// The engine rejected the request.
    #[display("{_0}")]
    #[from]
    Game(GameError),

    /// The caller may not act on the game.
    #[display("{_0}")]
    #[from]
    Permission(PermissionError),

    /// No game with this id.
    #[display("Game {_0} not found")]
    GameNotFound(GameId),

    /// The store failed.
    #[display("{_0}")]
    #[from]
    Store(StoreError),
}

impl ServiceError {
    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Game(e) => match e {
                GameError::Invalid(_) | GameError::SamePlayer(_) => ErrorKind::Validation,
                GameError::Finished(_) => ErrorKind::InvalidState,
                GameError::OutOfTurn(_) => ErrorKind::Permission,
                GameError::CellConflict(_) => ErrorKind::Defect,
            },
            ServiceError::Permission(_) => ErrorKind::Permission,
            ServiceError::GameNotFound(_) => ErrorKind::NotFound,
            ServiceError::Store(e) => match e {
                StoreError::GameNotFound(_) | StoreError::UserNotFound(_) => ErrorKind::NotFound,
                StoreError::Conflict { .. } => ErrorKind::Conflict,
                StoreError::Corrupt { .. } => ErrorKind::Defect,
                StoreError::Db(_) => ErrorKind::Storage,
            },
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServiceError::Game(e) => Some(e),
            ServiceError::Permission(e) => Some(e),
            ServiceError::Store(e) => Some(e),
            ServiceError::GameNotFound(_) => None,
        }
    }
}

/// Everything a detail page shows for one game.
#[derive(Debug, Clone, Serialize, Getters)]
pub struct GameView {
    record: GameRecord,
    board: Board,
    moves: Vec<Move>,
    viewer_can_move: bool,
}

impl GameView {
    /// `"<first> vs <second>"`, naming players through `name`.
    pub fn label(&self, name: impl Fn(PlayerId) -> String) -> String {
        format!(
            "{} vs {}",
            name(*self.record.first_player()),
            name(*self.record.second_player())
        )
    }

    /// The player holding `side`'s seat.
    pub fn player_on(&self, side: Side) -> PlayerId {
        match side {
            Side::First => *self.record.first_player(),
            Side::Second => *self.record.second_player(),
        }
    }
}

/// Result of an accepted move.
#[derive(Debug, Clone, Serialize, Getters, new)]
pub struct MoveOutcome {
    record: GameRecord,
    accepted: Move,
    status: GameStatus,
}

/// Runs game operations against a [`GameStore`].
#[derive(Debug, Clone)]
pub struct GameService<S> {
    store: S,
    locks: GameLocks,
}

impl<S: GameStore> GameService<S> {
    /// Creates a service over `store` with an empty lock table.
    #[instrument(skip(store))]
    pub fn new(store: S) -> Self {
        info!("Creating game service");
        Self {
            store,
            locks: GameLocks::new(),
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Starts a game with `first_player` to move.
    ///
    /// # Errors
    ///
    /// Fails with [`GameError::SamePlayer`] when both seats name the same
    /// player, or with a store error if a player does not exist.
    #[instrument(skip(self))]
    pub fn create_game(
        &self,
        first_player: PlayerId,
        second_player: PlayerId,
    ) -> Result<GameRecord, ServiceError> {
        GameState::new(first_player, second_player)?;
        let record = self.store.create_game(first_player, second_player)?;
        info!(game_id = %record.id(), "Game started");
        Ok(record)
    }

    /// Loads a game for display.
    ///
    /// `viewer_can_move` is true when `viewer` is the player on turn.
    ///
    /// # Errors
    ///
    /// Fails with [`ServiceError::GameNotFound`] for an unknown id.
    #[instrument(skip(self))]
    pub fn game_view(
        &self,
        id: GameId,
        viewer: Option<PlayerId>,
    ) -> Result<GameView, ServiceError> {
        let (record, state) = self
            .store
            .load_game(id)?
            .ok_or(ServiceError::GameNotFound(id))?
            .into_parts();
        let board = state.board()?;
        let viewer_can_move = viewer.is_some_and(|p| state.is_players_turn(p));
        debug!(viewer_can_move, status = ?state.status(), "Game view built");
        Ok(GameView {
            record,
            board,
            moves: state.moves().to_vec(),
            viewer_can_move,
        })
    }

    /// Plays `player`'s move at `(x, y)`.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::GameNotFound`] for an unknown game.
    /// - [`ServiceError::Permission`] when it is not `player`'s turn,
    ///   including every attempt on a finished game.
    /// - [`ServiceError::Game`] with a validation error for a bad square or
    ///   comment.
    /// - [`StoreError::Conflict`] if another process wrote the game first.
    #[instrument(skip(self, comment))]
    pub fn make_move(
        &self,
        id: GameId,
        player: PlayerId,
        x: i32,
        y: i32,
        comment: impl Into<String>,
    ) -> Result<MoveOutcome, ServiceError> {
        let lock = self.locks.handle(id);
        let _guard = acquire(&lock);

        let (_, mut state) = self
            .store
            .load_game(id)?
            .ok_or(ServiceError::GameNotFound(id))?
            .into_parts();

        if !state.is_players_turn(player) {
            let err = if state.side_of(player).is_none() {
                PermissionError::NotAParticipant {
                    game_id: id,
                    player,
                }
            } else {
                PermissionError::NotYourTurn {
                    game_id: id,
                    player,
                    status: state.status(),
                }
            };
            warn!(error = %err, "Move refused");
            return Err(err.into());
        }

        let draft = state.propose_move()?;
        let position = state.validate_position(x, y)?;
        let mv = draft
            .complete(position, comment)
            .map_err(GameError::from)?;

        let expected_moves = state.move_count();
        let status = state.record_move(mv.clone())?;
        let record = self.store.append_move(id, expected_moves, &mv, status)?;

        if status.is_terminal() {
            self.locks.forget(id);
        }
        info!(mv = %mv, status = %status, "Move accepted");
        Ok(MoveOutcome::new(record, mv, status))
    }

    /// Games `player` sits in, optionally only unfinished ones.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    #[instrument(skip(self))]
    pub fn games_for_user(
        &self,
        player: PlayerId,
        active_only: bool,
    ) -> Result<Vec<GameRecord>, ServiceError> {
        let filter = GameFilter::for_player(player);
        let filter = if active_only { filter.active() } else { filter };
        Ok(self.store.list_games(filter)?)
    }

    /// Every game, most recently active first.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    #[instrument(skip(self))]
    pub fn all_games(&self) -> Result<Vec<GameRecord>, ServiceError> {
        Ok(self.store.list_games(GameFilter::all())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryGameStore;

    #[test]
    fn test_kinds_cover_engine_errors() {
        let finished = ServiceError::from(GameError::Finished(GameStatus::Draw));
        assert_eq!(finished.kind(), ErrorKind::InvalidState);

        let conflict = ServiceError::from(GameError::CellConflict(
            tictactoe_engine::Position::new(0, 0).unwrap(),
        ));
        assert_eq!(conflict.kind(), ErrorKind::Defect);

        let same = ServiceError::from(GameError::SamePlayer(PlayerId(3)));
        assert_eq!(same.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_label_names_both_seats() {
        let service = GameService::new(MemoryGameStore::new());
        let id = *service.create_game(PlayerId(1), PlayerId(2)).unwrap().id();
        let view = service.game_view(id, None).unwrap();
        let label = view.label(|p| if p == PlayerId(1) { "ann".into() } else { "ben".into() });
        assert_eq!(label, "ann vs ben");
        assert!(!view.viewer_can_move());
    }
}
