//! Database models and their mapping onto game types.

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;
use tictactoe_engine::{GameStatus, Move, PlayerId, Position, Side};
use tracing::instrument;

use crate::db::{DbError, schema};
use crate::store::{GameId, GameRecord, StoreError};

/// User profile database model.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::users)]
pub struct User {
    id: i32,
    username: String,
    created_at: NaiveDateTime,
}

impl User {
    /// The user's identity as a game seat.
    pub fn player_id(&self) -> PlayerId {
        PlayerId(self.id)
    }
}

/// Insertable user model for creating new users.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::users)]
pub(crate) struct NewUser {
    username: String,
}

/// Game database model.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = schema::games)]
pub(crate) struct GameRow {
    pub(crate) id: i32,
    pub(crate) first_player_id: i32,
    pub(crate) second_player_id: i32,
    pub(crate) status: String,
    pub(crate) created_at: NaiveDateTime,
    pub(crate) updated_at: NaiveDateTime,
}

impl GameRow {
    /// Parses the stored one-letter status code.
    #[instrument(skip(self), fields(game_id = self.id, status = %self.status))]
    pub(crate) fn parse_status(&self) -> Result<GameStatus, StoreError> {
        let mut chars = self.status.chars();
        match (chars.next().and_then(GameStatus::from_code), chars.next()) {
            (Some(status), None) => Ok(status),
            _ => Err(StoreError::Corrupt {
                game_id: GameId(self.id),
                reason: format!("invalid status code '{}'", self.status),
            }),
        }
    }

    /// Converts the row into a [`GameRecord`].
    pub(crate) fn to_record(&self) -> Result<GameRecord, StoreError> {
        Ok(GameRecord::new(
            GameId(self.id),
            PlayerId(self.first_player_id),
            PlayerId(self.second_player_id),
            self.parse_status()?,
            self.created_at,
            self.updated_at,
        ))
    }
}

/// Insertable game model. New games always start with the first player.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::games)]
pub(crate) struct NewGameRow {
    first_player_id: i32,
    second_player_id: i32,
    status: String,
}

impl NewGameRow {
    pub(crate) fn new(first_player: PlayerId, second_player: PlayerId) -> Self {
        Self {
            first_player_id: first_player.0,
            second_player_id: second_player.0,
            status: GameStatus::FirstToMove.code().to_string(),
        }
    }
}

/// Move database model.
#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable)]
#[diesel(table_name = schema::moves)]
#[diesel(belongs_to(GameRow, foreign_key = game_id))]
pub(crate) struct MoveRow {
    id: i32,
    game_id: i32,
    x: i32,
    y: i32,
    comment: String,
    by_first_player: bool,
}

impl MoveRow {
    /// Rebuilds the engine move, rejecting rows the engine would never emit.
    #[instrument(skip(self), fields(move_id = self.id, game_id = self.game_id))]
    pub(crate) fn to_move(&self) -> Result<Move, StoreError> {
        let corrupt = |reason: String| StoreError::Corrupt {
            game_id: GameId(self.game_id),
            reason: format!("move {}: {}", self.id, reason),
        };
        let position = Position::new(self.x, self.y).map_err(|e| corrupt(e.to_string()))?;
        Move::new(Side::from_first_flag(self.by_first_player), position)
            .with_comment(self.comment.clone())
            .map_err(|e| corrupt(e.to_string()))
    }
}

/// Insertable move model.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::moves)]
pub(crate) struct NewMoveRow<'a> {
    game_id: i32,
    x: i32,
    y: i32,
    comment: &'a str,
    by_first_player: bool,
}

impl<'a> NewMoveRow<'a> {
    pub(crate) fn new(game_id: GameId, mv: &'a Move) -> Result<Self, StoreError> {
        let column = |v: usize| {
            i32::try_from(v).map_err(|_| {
                DbError::new(format!("Coordinate {} does not fit the moves table", v))
            })
        };
        let position = mv.position();
        Ok(Self {
            game_id: game_id.0,
            x: column(position.x())?,
            y: column(position.y())?,
            comment: mv.comment(),
            by_first_player: mv.by_first_player(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_move_row_keeps_coordinates() {
        let mv = Move::new(Side::Second, Position::new(2, 1).unwrap())
            .with_comment("edge")
            .unwrap();
        let row = NewMoveRow::new(GameId(5), &mv).unwrap();
        assert_eq!((row.game_id, row.x, row.y), (5, 2, 1));
        assert_eq!(row.comment, "edge");
        assert!(!row.by_first_player);
    }

    #[test]
    fn test_move_row_round_trips_through_engine() {
        let row = MoveRow {
            id: 1,
            game_id: 5,
            x: 0,
            y: 2,
            comment: String::new(),
            by_first_player: true,
        };
        let mv = row.to_move().unwrap();
        assert_eq!(mv.position(), Position::new(0, 2).unwrap());
        assert_eq!(mv.side(), Side::First);
    }

    #[test]
    fn test_bad_status_code_is_corrupt() {
        let now = chrono::Utc::now().naive_utc();
        let row = GameRow {
            id: 3,
            first_player_id: 1,
            second_player_id: 2,
            status: "X".to_string(),
            created_at: now,
            updated_at: now,
        };
        assert!(matches!(
            row.to_record(),
            Err(StoreError::Corrupt {
                game_id: GameId(3),
                ..
            })
        ));
    }
}
