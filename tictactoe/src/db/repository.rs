//! Repository trait definitions and their PostgreSQL implementations.
//!
//! The managers only talk to these traits, which keeps them testable against
//! the in-memory stores in [`super::memory`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, types::Json, PgPool, Row};

use super::errors::{StoreError, StoreResult};
use crate::auth::{GameStats, User, UserId};
use crate::game::{Board, GameSession, GameState, NewGameSession, SessionId, Symbol};

/// Credential store: persisted user records
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user with zeroed stats
    ///
    /// Fails with `StoreError::Conflict` if the email is taken.
    async fn create_user(&self, email: &str, password_hash: &str) -> StoreResult<User>;

    /// Find user by (already normalised) email
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Find user by ID
    async fn find_by_id(&self, user_id: UserId) -> StoreResult<Option<User>>;

    /// Replace (or clear) the user's single live refresh token
    async fn set_refresh_token(&self, user_id: UserId, token: Option<&str>) -> StoreResult<()>;

    /// Overwrite the user's statistics counters
    async fn save_stats(&self, user_id: UserId, stats: &GameStats) -> StoreResult<()>;
}

/// Session store: persisted game sessions
#[async_trait]
pub trait GameRepository: Send + Sync {
    /// Persist a new session
    async fn insert(&self, session: &NewGameSession) -> StoreResult<GameSession>;

    /// Find session by ID regardless of owner
    async fn find_by_id(&self, session_id: SessionId) -> StoreResult<Option<GameSession>>;

    /// Find session by ID, only if owned by `user_id`
    async fn find_owned(
        &self,
        session_id: SessionId,
        user_id: UserId,
    ) -> StoreResult<Option<GameSession>>;

    /// The user's most recently created session, finished or not
    async fn find_latest_for_user(&self, user_id: UserId) -> StoreResult<Option<GameSession>>;

    /// Write back board, current player and game state
    async fn save(&self, session: &GameSession) -> StoreResult<()>;

    /// Check that the store is reachable
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

const USER_COLUMNS: &str = "id, email, password_hash, wins, losses, draws, refresh_token, created_at, updated_at";

const SESSION_COLUMNS: &str =
    "id, user_id, board, current_player, game_state, is_computer_first, created_at, updated_at";

fn user_from_row(row: &PgRow) -> StoreResult<User> {
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        stats: GameStats {
            wins: row.try_get("wins")?,
            losses: row.try_get("losses")?,
            draws: row.try_get("draws")?,
        },
        refresh_token: row.try_get("refresh_token")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

fn session_from_row(row: &PgRow) -> StoreResult<GameSession> {
    let current_player: String = row.try_get("current_player")?;
    let current_player: Symbol = current_player
        .parse()
        .map_err(|e| StoreError::Corrupt(format!("game_sessions.current_player: {e}")))?;

    Ok(GameSession {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        board: row.try_get::<Json<Board>, _>("board")?.0,
        current_player,
        game_state: row.try_get::<Json<GameState>, _>("game_state")?.0,
        is_computer_first: row.try_get("is_computer_first")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

/// Default PostgreSQL implementation of `UserRepository`
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create_user(&self, email: &str, password_hash: &str) -> StoreResult<User> {
        let row = sqlx::query(&format!(
            "INSERT INTO users (email, password_hash) VALUES ($1, $2) RETURNING {USER_COLUMNS}"
        ))
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;

        user_from_row(&row)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_id(&self, user_id: UserId) -> StoreResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn set_refresh_token(&self, user_id: UserId, token: Option<&str>) -> StoreResult<()> {
        sqlx::query("UPDATE users SET refresh_token = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn save_stats(&self, user_id: UserId, stats: &GameStats) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET wins = $2, losses = $3, draws = $4, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(stats.wins)
        .bind(stats.losses)
        .bind(stats.draws)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Default PostgreSQL implementation of `GameRepository`
pub struct PgGameRepository {
    pool: PgPool,
}

impl PgGameRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GameRepository for PgGameRepository {
    async fn insert(&self, session: &NewGameSession) -> StoreResult<GameSession> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO game_sessions (user_id, board, current_player, game_state, is_computer_first)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(session.user_id)
        .bind(Json(&session.board))
        .bind(session.current_player.as_str())
        .bind(Json(&session.game_state))
        .bind(session.is_computer_first)
        .fetch_one(&self.pool)
        .await?;

        session_from_row(&row)
    }

    async fn find_by_id(&self, session_id: SessionId) -> StoreResult<Option<GameSession>> {
        let row = sqlx::query(&format!(
            "SELECT {SESSION_COLUMNS} FROM game_sessions WHERE id = $1"
        ))
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(session_from_row).transpose()
    }

    async fn find_owned(
        &self,
        session_id: SessionId,
        user_id: UserId,
    ) -> StoreResult<Option<GameSession>> {
        let row = sqlx::query(&format!(
            "SELECT {SESSION_COLUMNS} FROM game_sessions WHERE id = $1 AND user_id = $2"
        ))
        .bind(session_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(session_from_row).transpose()
    }

    async fn find_latest_for_user(&self, user_id: UserId) -> StoreResult<Option<GameSession>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {SESSION_COLUMNS}
            FROM game_sessions
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(session_from_row).transpose()
    }

    async fn save(&self, session: &GameSession) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE game_sessions
            SET board = $2, current_player = $3, game_state = $4, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(session.id)
        .bind(Json(&session.board))
        .bind(session.current_player.as_str())
        .bind(Json(&session.game_state))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
