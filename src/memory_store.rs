//! In-memory game store.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tictactoe_engine::{GameState, GameStatus, Move, PlayerId};
use tracing::{debug, info, instrument, warn};

use crate::store::{GameFilter, GameId, GameRecord, GameStore, StoreError, StoredGame};

#[derive(Debug, Default)]
struct Inner {
    next_id: i32,
    games: BTreeMap<GameId, (GameRecord, Vec<Move>)>,
}

/// A [`GameStore`] held in process memory.
///
/// Clones share the same games. Any player id is accepted as a seat.
#[derive(Debug, Clone, Default)]
pub struct MemoryGameStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryGameStore {
    /// Creates an empty store.
    #[instrument]
    pub fn new() -> Self {
        info!("Creating in-memory game store");
        Self::default()
    }

    /// Number of games held.
    pub fn len(&self) -> usize {
        self.lock().games.len()
    }

    /// Whether the store holds no games.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Every mutation completes before the guard drops, so a poisoned
    // map is still consistent.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl GameStore for MemoryGameStore {
    #[instrument(skip(self))]
    fn create_game(
        &self,
        first_player: PlayerId,
        second_player: PlayerId,
    ) -> Result<GameRecord, StoreError> {
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = GameId(inner.next_id);
        let now = Utc::now().naive_utc();
        let record = GameRecord::new(
            id,
            first_player,
            second_player,
            GameStatus::FirstToMove,
            now,
            now,
        );
        inner.games.insert(id, (record.clone(), Vec::new()));
        info!(game_id = %id, "Game created");
        Ok(record)
    }

    #[instrument(skip(self))]
    fn load_game(&self, id: GameId) -> Result<Option<StoredGame>, StoreError> {
        let inner = self.lock();
        let Some((record, moves)) = inner.games.get(&id) else {
            debug!("Game not found");
            return Ok(None);
        };
        let state = GameState::restore(
            *record.first_player(),
            *record.second_player(),
            *record.status(),
            moves.clone(),
        )
        .map_err(|e| StoreError::Corrupt {
            game_id: id,
            reason: e.to_string(),
        })?;
        Ok(Some(StoredGame::new(record.clone(), state)))
    }

    #[instrument(skip(self, mv), fields(mv = %mv))]
    fn append_move(
        &self,
        id: GameId,
        expected_moves: usize,
        mv: &Move,
        status: GameStatus,
    ) -> Result<GameRecord, StoreError> {
        let mut inner = self.lock();
        let (record, moves) = inner
            .games
            .get_mut(&id)
            .ok_or(StoreError::GameNotFound(id))?;

        if moves.len() != expected_moves {
            warn!(expected_moves, actual = moves.len(), "Stale move rejected");
            return Err(StoreError::Conflict {
                game_id: id,
                expected: expected_moves,
                actual: moves.len(),
            });
        }

        moves.push(mv.clone());
        *record = GameRecord::new(
            id,
            *record.first_player(),
            *record.second_player(),
            status,
            *record.created_at(),
            Utc::now().naive_utc(),
        );
        info!(game_id = %id, status = %status.code(), "Move appended");
        Ok(record.clone())
    }

    #[instrument(skip(self))]
    fn list_games(&self, filter: GameFilter) -> Result<Vec<GameRecord>, StoreError> {
        let inner = self.lock();
        let mut records: Vec<GameRecord> = inner
            .games
            .values()
            .map(|(record, _)| record)
            .filter(|record| filter.matches(record))
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            b.updated_at()
                .cmp(a.updated_at())
                .then_with(|| b.id().cmp(a.id()))
        });
        debug!(count = records.len(), "Games listed");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tictactoe_engine::{Position, Side};

    const ALICE: PlayerId = PlayerId(1);
    const BOB: PlayerId = PlayerId(2);

    fn center() -> Move {
        Move::new(Side::First, Position::new(1, 1).unwrap())
    }

    #[test]
    fn test_ids_increase_and_clones_share_games() {
        let store = MemoryGameStore::new();
        let clone = store.clone();
        let a = store.create_game(ALICE, BOB).unwrap();
        let b = clone.create_game(BOB, ALICE).unwrap();
        assert_eq!(*a.id(), GameId(1));
        assert_eq!(*b.id(), GameId(2));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_append_rejects_stale_count() {
        let store = MemoryGameStore::new();
        let id = *store.create_game(ALICE, BOB).unwrap().id();

        store
            .append_move(id, 0, &center(), GameStatus::SecondToMove)
            .unwrap();
        let err = store
            .append_move(id, 0, &center(), GameStatus::SecondToMove)
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Conflict {
                expected: 0,
                actual: 1,
                ..
            }
        ));

        let loaded = store.load_game(id).unwrap().unwrap();
        assert_eq!(loaded.state().move_count(), 1);
        assert_eq!(*loaded.record().status(), GameStatus::SecondToMove);
    }

    #[test]
    fn test_append_to_missing_game() {
        let store = MemoryGameStore::new();
        let err = store
            .append_move(GameId(9), 0, &center(), GameStatus::SecondToMove)
            .unwrap_err();
        assert!(matches!(err, StoreError::GameNotFound(GameId(9))));
        assert!(store.load_game(GameId(9)).unwrap().is_none());
    }
}
