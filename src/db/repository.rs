//! SQLite repository for users, games and moves.

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tictactoe_engine::{GameState, GameStatus, Move, PlayerId};
use tracing::{debug, info, instrument, warn};

use crate::db::models::{GameRow, MoveRow, NewGameRow, NewMoveRow, NewUser};
use crate::db::{DbError, User, schema};
use crate::store::{GameFilter, GameId, GameRecord, GameStore, StoreError, StoredGame};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// How long a connection waits on another writer before giving up.
const BUSY_TIMEOUT_MS: u32 = 5_000;

/// Database repository for users and games.
///
/// Every call opens its own connection. Writes to a game run inside a
/// `BEGIN IMMEDIATE` transaction, so two processes sharing the file are
/// serialized by SQLite's write lock. Connections wait up to
/// [`BUSY_TIMEOUT_MS`] for that lock, and the file is kept in WAL mode so
/// readers never wait on a writer.
#[derive(Debug, Clone)]
pub struct GameRepository {
    db_path: String,
}

impl GameRepository {
    /// Creates a new repository for the database at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the path is empty.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn new(db_path: String) -> Result<Self, DbError> {
        if db_path.trim().is_empty() {
            return Err(DbError::new("Database path is empty"));
        }
        info!(path = %db_path, "Creating GameRepository");
        Ok(Self { db_path })
    }

    /// Opens a connection that waits on busy writers and enforces foreign keys.
    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, DbError> {
        debug!(path = %self.db_path, "Establishing connection");
        let mut conn = SqliteConnection::establish(&self.db_path)
            .map_err(|e| DbError::from(e).context(&self.db_path))?;
        // busy_timeout first, so the journal switch below waits too.
        conn.batch_execute(&format!(
            "PRAGMA busy_timeout = {}; PRAGMA journal_mode = WAL; PRAGMA foreign_keys = ON;",
            BUSY_TIMEOUT_MS
        ))
        .map_err(|e| DbError::from(e).context(&self.db_path))?;
        Ok(conn)
    }

    /// Applies any migrations the database has not seen yet.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a migration fails.
    #[instrument(skip(self))]
    pub fn run_migrations(&self) -> Result<usize, DbError> {
        let mut conn = self.connection()?;
        let applied = conn.run_pending_migrations(MIGRATIONS)?;
        info!(count = applied.len(), "Migrations applied");
        Ok(applied.len())
    }

    /// Creates a new user.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the username is taken or a database error occurs.
    #[instrument(skip(self))]
    pub fn create_user(&self, username: String) -> Result<User, DbError> {
        debug!(username = %username, "Creating user");
        let mut conn = self.connection()?;

        let user = diesel::insert_into(schema::users::table)
            .values(&NewUser::new(username.clone()))
            .returning(User::as_returning())
            .get_result(&mut conn)
            .map_err(|e| DbError::from(e).context(format_args!("user '{}'", username)))?;

        info!(user_id = user.id(), username = %user.username(), "User created");
        Ok(user)
    }

    /// Gets a user by id. Returns `None` if not found.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn get_user(&self, id: PlayerId) -> Result<Option<User>, DbError> {
        let mut conn = self.connection()?;
        let user = schema::users::table
            .find(id.0)
            .select(User::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(user)
    }

    /// Gets a user by username. Returns `None` if not found.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn get_user_by_name(&self, username: &str) -> Result<Option<User>, DbError> {
        debug!(username = %username, "Looking up user by name");
        let mut conn = self.connection()?;

        let user = schema::users::table
            .filter(schema::users::username.eq(username))
            .select(User::as_select())
            .first(&mut conn)
            .optional()?;

        if user.is_none() {
            debug!("User not found");
        }
        Ok(user)
    }

    /// Lists all users, ordered by creation time.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn list_users(&self) -> Result<Vec<User>, DbError> {
        let mut conn = self.connection()?;

        let users = schema::users::table
            .order((schema::users::created_at.asc(), schema::users::id.asc()))
            .select(User::as_select())
            .load(&mut conn)?;

        info!(count = users.len(), "Users loaded");
        Ok(users)
    }

    fn user_exists(conn: &mut SqliteConnection, id: PlayerId) -> Result<bool, DbError> {
        let count: i64 = schema::users::table
            .filter(schema::users::id.eq(id.0))
            .count()
            .get_result(conn)?;
        Ok(count > 0)
    }

    fn game_row(conn: &mut SqliteConnection, id: GameId) -> Result<Option<GameRow>, DbError> {
        let row = schema::games::table
            .find(id.0)
            .select(GameRow::as_select())
            .first(conn)
            .optional()?;
        Ok(row)
    }
}

impl GameStore for GameRepository {
    #[instrument(skip(self))]
    fn create_game(
        &self,
        first_player: PlayerId,
        second_player: PlayerId,
    ) -> Result<GameRecord, StoreError> {
        let mut conn = self.connection()?;

        let row = conn.immediate_transaction(|conn| {
            for player in [first_player, second_player] {
                if !Self::user_exists(conn, player)? {
                    return Err(StoreError::UserNotFound(player));
                }
            }
            let row = diesel::insert_into(schema::games::table)
                .values(&NewGameRow::new(first_player, second_player))
                .returning(GameRow::as_returning())
                .get_result(conn)?;
            Ok(row)
        })?;

        info!(game_id = row.id, "Game created");
        row.to_record()
    }

    #[instrument(skip(self))]
    fn load_game(&self, id: GameId) -> Result<Option<StoredGame>, StoreError> {
        let mut conn = self.connection()?;

        let loaded = conn.transaction(|conn| {
            let Some(row) = Self::game_row(conn, id)? else {
                return Ok::<_, StoreError>(None);
            };
            let moves: Vec<MoveRow> = MoveRow::belonging_to(&row)
                .order(schema::moves::id.asc())
                .select(MoveRow::as_select())
                .load(conn)?;
            Ok(Some((row, moves)))
        })?;

        let Some((row, move_rows)) = loaded else {
            debug!("Game not found");
            return Ok(None);
        };

        let record = row.to_record()?;
        let moves = move_rows
            .iter()
            .map(MoveRow::to_move)
            .collect::<Result<Vec<Move>, _>>()?;
        let state = GameState::restore(
            *record.first_player(),
            *record.second_player(),
            *record.status(),
            moves,
        )
        .map_err(|e| StoreError::Corrupt {
            game_id: id,
            reason: e.to_string(),
        })?;

        debug!(moves = state.move_count(), status = ?state.status(), "Game loaded");
        Ok(Some(StoredGame::new(record, state)))
    }

    #[instrument(skip(self, mv), fields(mv = %mv))]
    fn append_move(
        &self,
        id: GameId,
        expected_moves: usize,
        mv: &Move,
        status: GameStatus,
    ) -> Result<GameRecord, StoreError> {
        let mut conn = self.connection()?;

        let row = conn.immediate_transaction(|conn| -> Result<GameRow, StoreError> {
            if Self::game_row(conn, id)?.is_none() {
                return Err(StoreError::GameNotFound(id));
            }

            let actual: i64 = schema::moves::table
                .filter(schema::moves::game_id.eq(id.0))
                .count()
                .get_result(conn)?;
            let actual = usize::try_from(actual).unwrap_or(usize::MAX);
            if actual != expected_moves {
                warn!(expected_moves, actual, "Stale move rejected");
                return Err(StoreError::Conflict {
                    game_id: id,
                    expected: expected_moves,
                    actual,
                });
            }

            diesel::insert_into(schema::moves::table)
                .values(&NewMoveRow::new(id, mv)?)
                .execute(conn)
                .map_err(|e| DbError::from(e).context(format_args!("game {} move {}", id, mv)))?;

            let row = diesel::update(schema::games::table.find(id.0))
                .set((
                    schema::games::status.eq(status.code().to_string()),
                    schema::games::updated_at.eq(chrono::Utc::now().naive_utc()),
                ))
                .returning(GameRow::as_returning())
                .get_result(conn)?;
            Ok(row)
        })?;

        info!(game_id = row.id, status = %row.status, "Move appended");
        row.to_record()
    }

    #[instrument(skip(self))]
    fn list_games(&self, filter: GameFilter) -> Result<Vec<GameRecord>, StoreError> {
        use schema::games;

        let mut conn = self.connection()?;
        let mut query = games::table.select(GameRow::as_select()).into_boxed();

        if let Some(player) = filter.player() {
            query = query.filter(
                games::first_player_id
                    .eq(player.0)
                    .or(games::second_player_id.eq(player.0)),
            );
        }
        if *filter.active_only() {
            let active: Vec<String> = [GameStatus::FirstToMove, GameStatus::SecondToMove]
                .iter()
                .map(|s| s.code().to_string())
                .collect();
            query = query.filter(games::status.eq_any(active));
        }

        let rows: Vec<GameRow> = query
            .order((games::updated_at.desc(), games::id.desc()))
            .load(&mut conn)?;

        info!(count = rows.len(), "Games listed");
        rows.iter().map(GameRow::to_record).collect()
    }
}
