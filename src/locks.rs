//! Per-game mutual exclusion.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, instrument};

use crate::store::GameId;

/// Hands out one lock per game.
///
/// Moves on the same game run one at a time; moves on different games
/// never wait on each other. The table itself is only held while looking
/// up or dropping an entry.
#[derive(Debug, Clone, Default)]
pub struct GameLocks {
    locks: Arc<Mutex<HashMap<GameId, Arc<Mutex<()>>>>>,
}

impl GameLocks {
    /// Creates an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the lock guarding `id`, creating it on first use.
    #[instrument(skip(self))]
    pub fn handle(&self, id: GameId) -> Arc<Mutex<()>> {
        let mut locks = self.table();
        Arc::clone(locks.entry(id).or_insert_with(|| {
            debug!("Creating game lock");
            Arc::new(Mutex::new(()))
        }))
    }

    /// Drops the lock for a game that will never be written again.
    ///
    /// Holders of an earlier handle keep it; later callers get a fresh lock,
    /// which is harmless once the game rejects every move.
    #[instrument(skip(self))]
    pub fn forget(&self, id: GameId) {
        if self.table().remove(&id).is_some() {
            debug!("Game lock released");
        }
    }

    /// Number of games with a live lock.
    pub fn len(&self) -> usize {
        self.table().len()
    }

    /// Whether no game holds a lock.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn table(&self) -> MutexGuard<'_, HashMap<GameId, Arc<Mutex<()>>>> {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Acquires a game lock, ignoring poison left by a panicked holder.
pub(crate) fn acquire(lock: &Mutex<()>) -> MutexGuard<'_, ()> {
    lock.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_game_shares_a_lock() {
        let locks = GameLocks::new();
        let a = locks.handle(GameId(1));
        let b = locks.handle(GameId(1));
        let c = locks.handle(GameId(2));
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(locks.len(), 2);
    }

    #[test]
    fn test_forget_drops_entry() {
        let locks = GameLocks::new();
        let before = locks.handle(GameId(1));
        locks.forget(GameId(1));
        assert!(locks.is_empty());
        let after = locks.handle(GameId(1));
        assert!(!Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn test_other_game_not_blocked() {
        let locks = GameLocks::new();
        let first = locks.handle(GameId(1));
        let _held = acquire(&first);
        let second = locks.handle(GameId(2));
        assert!(second.try_lock().is_ok());
        assert!(first.try_lock().is_err());
    }
}
