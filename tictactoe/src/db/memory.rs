//! In-process stores for tests and database-less local runs.
//!
//! Locks are never held across an `.await`.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::errors::{StoreError, StoreResult};
use super::repository::{GameRepository, UserRepository};
use crate::auth::{GameStats, User, UserId};
use crate::game::{GameSession, NewGameSession, SessionId};

struct Table<T> {
    rows: HashMap<i64, T>,
    next_id: i64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: HashMap::new(),
            next_id: 1,
        }
    }
}

fn lock<T>(table: &Mutex<Table<T>>) -> MutexGuard<'_, Table<T>> {
    // A panic while holding the lock cannot leave a row half-written.
    table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// In-memory `UserRepository`
#[derive(Clone, Default)]
pub struct MemoryUserRepository {
    users: Arc<Mutex<Table<User>>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users
    pub fn len(&self) -> usize {
        lock(&self.users).rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create_user(&self, email: &str, password_hash: &str) -> StoreResult<User> {
        let mut table = lock(&self.users);
        if table.rows.values().any(|u| u.email == email) {
            return Err(StoreError::Conflict("uq_users_email".to_string()));
        }

        let id = table.next_id;
        table.next_id += 1;

        let now = Utc::now();
        let user = User {
            id,
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            stats: GameStats::default(),
            refresh_token: None,
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let table = lock(&self.users);
        Ok(table.rows.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, user_id: UserId) -> StoreResult<Option<User>> {
        Ok(lock(&self.users).rows.get(&user_id).cloned())
    }

    async fn set_refresh_token(&self, user_id: UserId, token: Option<&str>) -> StoreResult<()> {
        if let Some(user) = lock(&self.users).rows.get_mut(&user_id) {
            user.refresh_token = token.map(str::to_string);
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn save_stats(&self, user_id: UserId, stats: &GameStats) -> StoreResult<()> {
        if let Some(user) = lock(&self.users).rows.get_mut(&user_id) {
            user.stats = *stats;
            user.updated_at = Utc::now();
        }
        Ok(())
    }
}

/// In-memory `GameRepository`
#[derive(Clone, Default)]
pub struct MemoryGameRepository {
    sessions: Arc<Mutex<Table<GameSession>>>,
}

impl MemoryGameRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions across all users
    pub fn len(&self) -> usize {
        lock(&self.sessions).rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl GameRepository for MemoryGameRepository {
    async fn insert(&self, session: &NewGameSession) -> StoreResult<GameSession> {
        let mut table = lock(&self.sessions);
        let id = table.next_id;
        table.next_id += 1;

        let now = Utc::now();
        let stored = GameSession {
            id,
            user_id: session.user_id,
            board: session.board,
            current_player: session.current_player,
            game_state: session.game_state,
            is_computer_first: session.is_computer_first,
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(id, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, session_id: SessionId) -> StoreResult<Option<GameSession>> {
        Ok(lock(&self.sessions).rows.get(&session_id).cloned())
    }

    async fn find_owned(
        &self,
        session_id: SessionId,
        user_id: UserId,
    ) -> StoreResult<Option<GameSession>> {
        Ok(lock(&self.sessions)
            .rows
            .get(&session_id)
            .filter(|s| s.user_id == user_id)
            .cloned())
    }

    async fn find_latest_for_user(&self, user_id: UserId) -> StoreResult<Option<GameSession>> {
        Ok(lock(&self.sessions)
            .rows
            .values()
            .filter(|s| s.user_id == user_id)
            .max_by_key(|s| (s.created_at, s.id))
            .cloned())
    }

    async fn save(&self, session: &GameSession) -> StoreResult<()> {
        if let Some(stored) = lock(&self.sessions).rows.get_mut(&session.id) {
            stored.board = session.board;
            stored.current_player = session.current_player;
            stored.game_state = session.game_state;
            stored.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Position, Symbol};

    #[tokio::test]
    async fn test_create_user_assigns_ids() {
        let repo = MemoryUserRepository::new();

        let first = repo.create_user("a@example.com", "hash").await.unwrap();
        let second = repo.create_user("b@example.com", "hash").await.unwrap();

        assert_eq!(first.id, 1, "First user should have ID 1");
        assert_eq!(second.id, 2, "Second user should have ID 2");
        assert_eq!(first.stats, GameStats::default());
        assert_eq!(repo.len(), 2);
    }

    #[tokio::test]
    async fn test_create_user_rejects_duplicate_email() {
        let repo = MemoryUserRepository::new();
        repo.create_user("a@example.com", "hash").await.unwrap();

        let result = repo.create_user("a@example.com", "other").await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_refresh_token_set_and_clear() {
        let repo = MemoryUserRepository::new();
        let user = repo.create_user("a@example.com", "hash").await.unwrap();

        repo.set_refresh_token(user.id, Some("tok")).await.unwrap();
        let stored = repo.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.refresh_token.as_deref(), Some("tok"));

        repo.set_refresh_token(user.id, None).await.unwrap();
        let stored = repo.find_by_email("a@example.com").await.unwrap().unwrap();
        assert!(stored.refresh_token.is_none());
    }

    #[tokio::test]
    async fn test_latest_session_is_most_recent_insert() {
        let repo = MemoryGameRepository::new();
        assert!(repo.find_latest_for_user(1).await.unwrap().is_none());

        let older = repo.insert(&NewGameSession::new(1, false)).await.unwrap();
        let newer = repo.insert(&NewGameSession::new(1, true)).await.unwrap();
        repo.insert(&NewGameSession::new(2, false)).await.unwrap();

        let latest = repo.find_latest_for_user(1).await.unwrap().unwrap();
        assert_eq!(latest.id, newer.id);
        assert_ne!(latest.id, older.id);
    }

    #[tokio::test]
    async fn test_find_owned_scopes_by_user() {
        let repo = MemoryGameRepository::new();
        let session = repo.insert(&NewGameSession::new(1, false)).await.unwrap();

        assert!(repo.find_owned(session.id, 1).await.unwrap().is_some());
        assert!(repo.find_owned(session.id, 2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_writes_board() {
        let repo = MemoryGameRepository::new();
        let mut session = repo.insert(&NewGameSession::new(1, false)).await.unwrap();

        session.board.place(Position::new(2, 2).unwrap(), Symbol::X);
        session.current_player = Symbol::O;
        repo.save(&session).await.unwrap();

        let stored = repo.find_by_id(session.id).await.unwrap().unwrap();
        assert_eq!(stored.board.filled_count(), 1);
        assert_eq!(stored.current_player, Symbol::O);
    }
}
