//! Game lifecycle: turn ownership, move legality and status transitions.

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::action::{Move, MoveDraft};
use crate::board::Board;
use crate::error::{GameError, ValidationError};
use crate::rules;
use crate::types::{GameStatus, PlayerId, Position, Side};

/// A game between two players: seats, status and the move log.
///
/// The status is only ever changed by [`GameState::record_move`], which
/// derives it from the board built over the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameState {
    first_player: PlayerId,
    second_player: PlayerId,
    status: GameStatus,
    moves: Vec<Move>,
}

impl GameState {
    /// Starts a new game with the first player to move.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::SamePlayer`] if both seats name one player.
    #[instrument]
    pub fn new(first_player: PlayerId, second_player: PlayerId) -> Result<Self, GameError> {
        if first_player == second_player {
            warn!(%first_player, "Rejected game against self");
            return Err(GameError::SamePlayer(first_player));
        }
        Ok(Self {
            first_player,
            second_player,
            status: GameStatus::FirstToMove,
            moves: Vec::new(),
        })
    }

    /// Rebuilds a game from stored parts.
    ///
    /// The move log is checked for duplicate squares; the stored status is
    /// taken as-is.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::SamePlayer`] or [`GameError::CellConflict`] for
    /// data no game could have produced.
    #[instrument(skip(moves), fields(moves = moves.len()))]
    pub fn restore(
        first_player: PlayerId,
        second_player: PlayerId,
        status: GameStatus,
        moves: Vec<Move>,
    ) -> Result<Self, GameError> {
        if first_player == second_player {
            return Err(GameError::SamePlayer(first_player));
        }
        Board::build(&moves)?;
        Ok(Self {
            first_player,
            second_player,
            status,
            moves,
        })
    }

    /// Player in the first seat.
    pub fn first_player(&self) -> PlayerId {
        self.first_player
    }

    /// Player in the second seat.
    pub fn second_player(&self) -> PlayerId {
        self.second_player
    }

    /// Current status.
    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Moves in the order they were made.
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// Number of moves made so far.
    pub fn move_count(&self) -> usize {
        self.moves.len()
    }

    /// Projects the move log onto a fresh board.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::CellConflict`] if the log is corrupt.
    pub fn board(&self) -> Result<Board, GameError> {
        Board::build(&self.moves)
    }

    /// The seat `player` occupies in this game, if any.
    pub fn side_of(&self, player: PlayerId) -> Option<Side> {
        if player == self.first_player {
            Some(Side::First)
        } else if player == self.second_player {
            Some(Side::Second)
        } else {
            None
        }
    }

    /// The player sitting on `side`.
    pub fn player_on(&self, side: Side) -> PlayerId {
        match side {
            Side::First => self.first_player,
            Side::Second => self.second_player,
        }
    }

    /// Checks if it's `player`'s turn to move.
    ///
    /// False for both players once the game has ended, and always false for
    /// someone who is not seated in the game.
    #[instrument(skip(self), fields(status = ?self.status))]
    pub fn is_players_turn(&self, player: PlayerId) -> bool {
        let is_turn = match self.status.side_to_move() {
            Some(side) => self.player_on(side) == player,
            None => false,
        };
        debug!(%player, is_turn, "Checked turn");
        is_turn
    }

    /// Hands out an unsaved move for the side on turn.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Finished`] once the game has ended.
    #[instrument(skip(self), fields(status = ?self.status))]
    pub fn propose_move(&self) -> Result<MoveDraft, GameError> {
        let side = self
            .status
            .side_to_move()
            .ok_or(GameError::Finished(self.status))?;
        Ok(MoveDraft::new(side))
    }

    /// Checks that `(x, y)` is on the board and still empty.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::OutOfBounds`] or
    /// [`ValidationError::Occupied`] wrapped in [`GameError::Invalid`], or
    /// [`GameError::CellConflict`] if the stored log is corrupt.
    #[instrument(skip(self))]
    pub fn validate_position(&self, x: i32, y: i32) -> Result<Position, GameError> {
        let position = Position::new(x, y)?;
        if self.board()?.is_occupied(position) {
            debug!(%position, "Square taken");
            return Err(ValidationError::Occupied(position).into());
        }
        Ok(position)
    }

    /// Computes the status the game would have after `mv`.
    ///
    /// `mv` is evaluated on top of the current log; the game is not changed.
    /// A move that completes a line and fills the board is a win.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::CellConflict`] if `mv` lands on a taken square and
    /// [`GameError::Finished`] if the game has already ended.
    #[instrument(skip(self, mv), fields(status = ?self.status, mv = %mv))]
    pub fn status_after_move(&self, mv: &Move) -> Result<GameStatus, GameError> {
        let board = Board::build(self.moves.iter().chain(std::iter::once(mv)))?;

        if board.has_winning_line_through(mv.position()) {
            return Ok(GameStatus::won_by(mv.side()));
        }

        if rules::is_full(&board) {
            return Ok(GameStatus::Draw);
        }

        self.status
            .next_turn()
            .ok_or(GameError::Finished(self.status))
    }

    /// Appends `mv` to the log and moves the status on.
    ///
    /// Returns the new status. Nothing changes if an error is returned.
    ///
    /// # Errors
    ///
    /// - [`GameError::Finished`] if the game has ended
    /// - [`GameError::OutOfTurn`] if `mv` belongs to the side not on turn
    /// - [`GameError::Invalid`] with [`ValidationError::Occupied`] if the
    ///   square is taken
    #[instrument(skip(self, mv), fields(status = ?self.status, mv = %mv))]
    pub fn record_move(&mut self, mv: Move) -> Result<GameStatus, GameError> {
        let side = self
            .status
            .side_to_move()
            .ok_or(GameError::Finished(self.status))?;
        if mv.side() != side {
            warn!(expected = %side, got = %mv.side(), "Move recorded out of turn");
            return Err(GameError::OutOfTurn(mv.side()));
        }
        if self.board()?.is_occupied(mv.position()) {
            return Err(ValidationError::Occupied(mv.position()).into());
        }

        let next = self.status_after_move(&mv)?;
        self.moves.push(mv);
        self.status = next;

        info!(status = ?next, moves = self.moves.len(), "Move recorded");
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: PlayerId = PlayerId(1);
    const BOB: PlayerId = PlayerId(2);
    const CAROL: PlayerId = PlayerId(3);

    fn play(game: &mut GameState, x: i32, y: i32) -> GameStatus {
        let draft = game.propose_move().unwrap();
        let pos = game.validate_position(x, y).unwrap();
        game.record_move(draft.complete(pos, "").unwrap()).unwrap()
    }

    #[test]
    fn test_new_game_waits_on_first_player() {
        let game = GameState::new(ALICE, BOB).unwrap();
        assert_eq!(game.status(), GameStatus::FirstToMove);
        assert!(game.is_players_turn(ALICE));
        assert!(!game.is_players_turn(BOB));
        assert!(!game.is_players_turn(CAROL));
    }

    #[test]
    fn test_same_player_twice_rejected() {
        assert_eq!(
            GameState::new(ALICE, ALICE),
            Err(GameError::SamePlayer(ALICE))
        );
    }

    #[test]
    fn test_turn_flips_after_each_move() {
        let mut game = GameState::new(ALICE, BOB).unwrap();
        assert_eq!(play(&mut game, 1, 1), GameStatus::SecondToMove);
        assert!(game.is_players_turn(BOB));
        assert_eq!(play(&mut game, 0, 0), GameStatus::FirstToMove);
        assert!(game.is_players_turn(ALICE));
    }

    #[test]
    fn test_draft_side_follows_status() {
        let mut game = GameState::new(ALICE, BOB).unwrap();
        assert!(game.propose_move().unwrap().by_first_player());
        play(&mut game, 2, 2);
        assert_eq!(game.propose_move().unwrap().side(), Side::Second);
    }

    #[test]
    fn test_validate_position_rejects_taken_and_out_of_bounds() {
        let mut game = GameState::new(ALICE, BOB).unwrap();
        play(&mut game, 1, 1);

        let taken = Position::new(1, 1).unwrap();
        assert_eq!(
            game.validate_position(1, 1),
            Err(GameError::Invalid(ValidationError::Occupied(taken)))
        );
        assert_eq!(
            game.validate_position(3, 1),
            Err(GameError::Invalid(ValidationError::OutOfBounds { x: 3, y: 1 }))
        );
        assert!(game.validate_position(0, 1).is_ok());
    }

    #[test]
    fn test_record_move_rejects_wrong_side() {
        let mut game = GameState::new(ALICE, BOB).unwrap();
        let mv = Move::new(Side::Second, Position::new(0, 0).unwrap());
        assert_eq!(game.record_move(mv), Err(GameError::OutOfTurn(Side::Second)));
        assert_eq!(game.move_count(), 0);
    }

    #[test]
    fn test_record_move_rejects_taken_square() {
        let mut game = GameState::new(ALICE, BOB).unwrap();
        play(&mut game, 0, 0);
        let mv = Move::new(Side::Second, Position::new(0, 0).unwrap());
        assert!(matches!(
            game.record_move(mv),
            Err(GameError::Invalid(ValidationError::Occupied(_)))
        ));
        assert_eq!(game.status(), GameStatus::SecondToMove);
    }

    #[test]
    fn test_status_after_move_does_not_mutate() {
        let game = GameState::new(ALICE, BOB).unwrap();
        let mv = Move::new(Side::First, Position::new(0, 0).unwrap());
        assert_eq!(game.status_after_move(&mv), Ok(GameStatus::SecondToMove));
        assert_eq!(game.move_count(), 0);
    }

    #[test]
    fn test_last_square_without_line_is_draw() {
        let mut game = GameState::new(ALICE, BOB).unwrap();
        for (x, y) in [(0, 0), (1, 0), (2, 0), (1, 1), (0, 1), (2, 1), (1, 2), (0, 2)] {
            play(&mut game, x, y);
        }
        assert_eq!(game.status(), GameStatus::FirstToMove);

        let last = Move::new(Side::First, Position::new(2, 2).unwrap());
        assert_eq!(game.status_after_move(&last), Ok(GameStatus::Draw));
        assert!(!game.board().unwrap().is_occupied(last.position()));
    }

    #[test]
    fn test_finished_game_refuses_moves() {
        let mut game = GameState::new(ALICE, BOB).unwrap();
        for (x, y) in [(0, 0), (1, 1), (0, 1), (2, 2), (0, 2)] {
            play(&mut game, x, y);
        }
        assert_eq!(game.status(), GameStatus::FirstWon);
        assert_eq!(
            game.propose_move(),
            Err(GameError::Finished(GameStatus::FirstWon))
        );
        assert!(!game.is_players_turn(ALICE));
        assert!(!game.is_players_turn(BOB));

        let late = Move::new(Side::Second, Position::new(2, 0).unwrap());
        assert_eq!(
            game.record_move(late),
            Err(GameError::Finished(GameStatus::FirstWon))
        );
    }

    #[test]
    fn test_restore_rejects_corrupt_log() {
        let pos = Position::new(1, 1).unwrap();
        let moves = vec![Move::new(Side::First, pos), Move::new(Side::Second, pos)];
        assert_eq!(
            GameState::restore(ALICE, BOB, GameStatus::FirstToMove, moves),
            Err(GameError::CellConflict(pos))
        );
    }

    #[test]
    fn test_seats() {
        let game = GameState::new(ALICE, BOB).unwrap();
        assert_eq!(game.side_of(BOB), Some(Side::Second));
        assert_eq!(game.side_of(CAROL), None);
        assert_eq!(game.player_on(Side::First), ALICE);
    }
}
