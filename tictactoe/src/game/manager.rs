//! Game manager: session lifecycle, move handling and statistics.

use log::{debug, info, warn};
use std::sync::Arc;

use super::{
    errors::{GameError, GameResult},
    models::{GameSession, NewGameSession, Outcome, Position, SessionId},
};
use crate::auth::{GameStats, UserId};
use crate::db::{GameRepository, UserRepository};
use crate::oracle::MoveOracle;

/// Orchestrates sessions between the stores and the move oracle
#[derive(Clone)]
pub struct GameManager {
    users: Arc<dyn UserRepository>,
    games: Arc<dyn GameRepository>,
    oracle: Arc<dyn MoveOracle>,
}

impl GameManager {
    /// Create a new game manager
    pub fn new(
        users: Arc<dyn UserRepository>,
        games: Arc<dyn GameRepository>,
        oracle: Arc<dyn MoveOracle>,
    ) -> Self {
        Self {
            users,
            games,
            oracle,
        }
    }

    /// Start a new session for a user
    ///
    /// # Arguments
    ///
    /// * `user_id` - Owner of the session
    /// * `is_computer_first` - Whether the computer opens (and plays X)
    ///
    /// # Returns
    ///
    /// * `GameResult<GameSession>` - The stored session; when the computer
    ///   opens it already carries the computer's first move
    ///
    /// # Errors
    ///
    /// * `GameError::Oracle` - The opening move could not be computed. The
    ///   empty session stays persisted.
    pub async fn create_session(
        &self,
        user_id: UserId,
        is_computer_first: bool,
    ) -> GameResult<GameSession> {
        let mut session = self
            .games
            .insert(&NewGameSession::new(user_id, is_computer_first))
            .await?;

        info!(
            "Created game session {} for user {} (computer first: {})",
            session.id, user_id, is_computer_first
        );

        if !is_computer_first {
            return Ok(session);
        }

        self.play_computer_turn(&mut session).await?;
        self.reload(session.id).await
    }

    /// The user's most recent session, if it is still in progress
    pub async fn active_session(&self, user_id: UserId) -> GameResult<Option<GameSession>> {
        let latest = self.games.find_latest_for_user(user_id).await?;
        Ok(latest.filter(|session| !session.is_over()))
    }

    /// Load a session owned by `user_id`
    pub async fn find_session(
        &self,
        session_id: SessionId,
        user_id: UserId,
    ) -> GameResult<GameSession> {
        self.games
            .find_owned(session_id, user_id)
            .await?
            .ok_or(GameError::SessionNotFound)
    }

    /// Apply the human's move and, unless that ended the game, the computer's reply
    ///
    /// # Arguments
    ///
    /// * `session_id` - Target session
    /// * `user_id` - Caller; must own the session
    /// * `row`, `col` - Zero-based cell coordinates
    ///
    /// # Errors
    ///
    /// * `GameError::InvalidPosition` - Coordinates outside the board
    /// * `GameError::SessionNotFound` - No such session for this user
    /// * `GameError::GameAlreadyOver` - Session is terminal
    /// * `GameError::CellOccupied` - Target cell already taken
    /// * `GameError::Oracle` / `GameError::NoMoveAvailable` - Computer reply
    ///   failed; the human's move stays persisted
    pub async fn apply_player_move(
        &self,
        session_id: SessionId,
        user_id: UserId,
        row: i64,
        col: i64,
    ) -> GameResult<GameSession> {
        let pos = Position::new(row, col).ok_or(GameError::InvalidPosition { row, col })?;
        let mut session = self.find_session(session_id, user_id).await?;

        if let Some(outcome) = session.game_state.outcome() {
            return Err(GameError::GameAlreadyOver(outcome));
        }

        if session.board.is_occupied(pos) {
            return Err(GameError::CellOccupied {
                row: pos.row(),
                col: pos.col(),
            });
        }

        session.board.place(pos, session.current_player);
        session.game_state = self.oracle.evaluate(&session.board).await?;
        self.games.save(&session).await?;

        debug!(
            "Session {}: {} played ({}, {})",
            session.id,
            session.current_player,
            pos.row(),
            pos.col()
        );

        if let Some(outcome) = session.game_state.tally() {
            self.record_outcome(user_id, outcome).await?;
            return Ok(session);
        }

        session.current_player = session.current_player.opponent();
        self.play_computer_turn(&mut session).await?;
        self.reload(session.id).await
    }

    /// Get a user's win/loss/draw counters
    pub async fn user_stats(&self, user_id: UserId) -> GameResult<GameStats> {
        self.users
            .find_by_id(user_id)
            .await?
            .map(|user| user.stats)
            .ok_or(GameError::UserNotFound)
    }

    /// Check that the session store is reachable
    pub async fn health_check(&self) -> GameResult<()> {
        self.games.ping().await?;
        Ok(())
    }

    async fn play_computer_turn(&self, session: &mut GameSession) -> GameResult<()> {
        let computer = session.computer_symbol();
        let pos = self
            .oracle
            .compute_move(&session.board, computer)
            .await?
            .ok_or(GameError::NoMoveAvailable)?;

        session.board.place(pos, computer);
        session.game_state = self.oracle.evaluate(&session.board).await?;
        session.current_player = session.human_symbol();
        self.games.save(session).await?;

        debug!(
            "Session {}: computer played {} at ({}, {})",
            session.id,
            computer,
            pos.row(),
            pos.col()
        );

        if let Some(outcome) = session.game_state.tally() {
            self.record_outcome(session.user_id, outcome).await?;
        }

        Ok(())
    }

    /// Credit a finished game to the user's counters.
    ///
    /// Which side the user played is read from their most recently created
    /// session, not from the session that just ended.
    async fn record_outcome(&self, user_id: UserId, outcome: Outcome) -> GameResult<()> {
        let Some(user) = self.users.find_by_id(user_id).await? else {
            warn!("Skipping stats for missing user {}", user_id);
            return Ok(());
        };

        let mut stats = user.stats;
        match outcome {
            Outcome::Draw => stats.draws += 1,
            Outcome::Winner(winner) => {
                let human = match self.games.find_latest_for_user(user_id).await? {
                    Some(latest) => latest.human_symbol(),
                    None => {
                        warn!("Skipping stats for user {} with no sessions", user_id);
                        return Ok(());
                    }
                };
                if human == winner {
                    stats.wins += 1;
                } else {
                    stats.losses += 1;
                }
            }
            Outcome::Undecided => {
                warn!("Game for user {} ended without a winner or draw", user_id);
                return Ok(());
            }
        }

        self.users.save_stats(user_id, &stats).await?;
        info!(
            "User {} stats now {}W/{}L/{}D",
            user_id, stats.wins, stats.losses, stats.draws
        );
        Ok(())
    }

    async fn reload(&self, session_id: SessionId) -> GameResult<GameSession> {
        self.games
            .find_by_id(session_id)
            .await?
            .ok_or(GameError::SessionNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryGameRepository, MemoryUserRepository};
    use crate::game::{Board, GameState, Symbol};
    use crate::oracle::{OracleResult, fake::FakeOracle};

    struct Harness {
        manager: GameManager,
        users: MemoryUserRepository,
        oracle: Arc<FakeOracle>,
        user_id: UserId,
    }

    async fn harness(oracle: FakeOracle) -> Harness {
        let users = MemoryUserRepository::new();
        let user = users.create_user("alice@example.com", "hash").await.unwrap();
        let oracle = Arc::new(oracle);
        let manager = GameManager::new(
            Arc::new(users.clone()),
            Arc::new(MemoryGameRepository::new()),
            oracle.clone(),
        );
        Harness {
            manager,
            users,
            oracle,
            user_id: user.id,
        }
    }

    #[tokio::test]
    async fn test_create_session_human_first() {
        let h = harness(FakeOracle::new()).await;

        let session = h.manager.create_session(h.user_id, false).await.unwrap();

        assert_eq!(session.board.filled_count(), 0);
        assert_eq!(session.current_player, Symbol::X);
        assert!(!session.is_over());
        assert_eq!(h.oracle.move_calls(), 0);
    }

    #[tokio::test]
    async fn test_create_session_computer_first() {
        let h = harness(FakeOracle::with_moves([(1, 1)])).await;

        let session = h.manager.create_session(h.user_id, true).await.unwrap();

        assert_eq!(session.board.filled_count(), 1);
        assert_eq!(session.board.get(Position::new(1, 1).unwrap()), Some(Symbol::X));
        assert_eq!(session.current_player, Symbol::O);
    }

    #[tokio::test]
    async fn test_move_gets_computer_reply() {
        let h = harness(FakeOracle::with_moves([(1, 1)])).await;
        let session = h.manager.create_session(h.user_id, false).await.unwrap();

        let after = h
            .manager
            .apply_player_move(session.id, h.user_id, 0, 0)
            .await
            .unwrap();

        assert_eq!(after.board.get(Position::new(0, 0).unwrap()), Some(Symbol::X));
        assert_eq!(after.board.get(Position::new(1, 1).unwrap()), Some(Symbol::O));
        assert_eq!(after.current_player, Symbol::X);
    }

    #[tokio::test]
    async fn test_move_out_of_bounds_rejected() {
        let h = harness(FakeOracle::new()).await;
        let session = h.manager.create_session(h.user_id, false).await.unwrap();

        let result = h.manager.apply_player_move(session.id, h.user_id, 3, 0).await;
        assert!(matches!(
            result,
            Err(GameError::InvalidPosition { row: 3, col: 0 })
        ));
    }

    #[tokio::test]
    async fn test_move_on_foreign_session_not_found() {
        let h = harness(FakeOracle::new()).await;
        let session = h.manager.create_session(h.user_id, false).await.unwrap();

        let result = h
            .manager
            .apply_player_move(session.id, h.user_id + 1, 0, 0)
            .await;
        assert!(matches!(result, Err(GameError::SessionNotFound)));
    }

    #[tokio::test]
    async fn test_occupied_cell_rejected() {
        let h = harness(FakeOracle::with_moves([(1, 1)])).await;
        let session = h.manager.create_session(h.user_id, true).await.unwrap();

        let result = h.manager.apply_player_move(session.id, h.user_id, 1, 1).await;
        assert!(matches!(
            result,
            Err(GameError::CellOccupied { row: 1, col: 1 })
        ));
    }

    #[tokio::test]
    async fn test_active_session_hides_finished_games() {
        // Human X takes the top row while the computer fills the middle row.
        let h = harness(FakeOracle::with_moves([(1, 0), (1, 1)])).await;
        let session = h.manager.create_session(h.user_id, false).await.unwrap();

        for col in 0..3 {
            h.manager
                .apply_player_move(session.id, h.user_id, 0, col)
                .await
                .unwrap();
        }

        assert!(h.manager.active_session(h.user_id).await.unwrap().is_none());
        let stats = h.manager.user_stats(h.user_id).await.unwrap();
        assert_eq!(stats, GameStats { wins: 1, losses: 0, draws: 0 });

        let result = h.manager.apply_player_move(session.id, h.user_id, 2, 2).await;
        match result {
            Err(err @ GameError::GameAlreadyOver(_)) => assert_eq!(
                err.to_string(),
                "Game is over. X wins! Start a new game to continue playing."
            ),
            other => panic!("expected GameAlreadyOver, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_computer_win_counts_as_loss() {
        // Computer X opens at (0,0) then completes the left column.
        let h = harness(FakeOracle::with_moves([(0, 0), (1, 0), (2, 0)])).await;
        let session = h.manager.create_session(h.user_id, true).await.unwrap();

        h.manager
            .apply_player_move(session.id, h.user_id, 0, 1)
            .await
            .unwrap();
        let after = h
            .manager
            .apply_player_move(session.id, h.user_id, 0, 2)
            .await
            .unwrap();

        assert_eq!(after.game_state.winner, Some(Symbol::X));
        let stats = h.users.find_by_id(h.user_id).await.unwrap().unwrap().stats;
        assert_eq!(stats, GameStats { wins: 0, losses: 1, draws: 0 });
    }

    #[tokio::test]
    async fn test_oracle_failure_keeps_player_move() {
        let h = harness(FakeOracle::new()).await;
        let session = h.manager.create_session(h.user_id, false).await.unwrap();
        h.oracle.fail_moves(true);

        let result = h.manager.apply_player_move(session.id, h.user_id, 2, 2).await;
        assert!(matches!(result, Err(GameError::Oracle(_))));

        let stored = h.manager.find_session(session.id, h.user_id).await.unwrap();
        assert_eq!(stored.board.get(Position::new(2, 2).unwrap()), Some(Symbol::X));
        assert_eq!(stored.board.filled_count(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_oracle_reports_no_move() {
        let h = harness(FakeOracle::new()).await;
        h.oracle.set_exhausted(true);

        let result = h.manager.create_session(h.user_id, true).await;
        assert!(matches!(result, Err(GameError::NoMoveAvailable)));
    }

    #[tokio::test]
    async fn test_stats_for_missing_user() {
        let h = harness(FakeOracle::new()).await;
        let result = h.manager.user_stats(h.user_id + 100).await;
        assert!(matches!(result, Err(GameError::UserNotFound)));
    }

    /// Plays the first empty cell and always reports a finished game with
    /// both a winner and the draw flag set.
    struct ContradictoryOracle;

    #[async_trait::async_trait]
    impl MoveOracle for ContradictoryOracle {
        async fn compute_move(
            &self,
            board: &Board,
            _player: Symbol,
        ) -> OracleResult<Option<Position>> {
            Ok(board.empty_positions().next())
        }

        async fn evaluate(&self, _board: &Board) -> OracleResult<GameState> {
            Ok(GameState {
                is_over: true,
                winner: Some(Symbol::X),
                is_draw: true,
            })
        }
    }

    #[tokio::test]
    async fn test_draw_flag_wins_over_winner_in_stats() {
        let users = MemoryUserRepository::new();
        let user = users.create_user("alice@example.com", "hash").await.unwrap();
        let manager = GameManager::new(
            Arc::new(users.clone()),
            Arc::new(MemoryGameRepository::new()),
            Arc::new(ContradictoryOracle),
        );
        let session = manager.create_session(user.id, false).await.unwrap();

        let after = manager
            .apply_player_move(session.id, user.id, 0, 0)
            .await
            .unwrap();

        assert!(after.is_over());
        let stats = manager.user_stats(user.id).await.unwrap();
        assert_eq!(stats, GameStats { wins: 0, losses: 0, draws: 1 });
    }
}
