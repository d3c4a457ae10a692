//! Integration tests for complete game flows.
//!
//! Sessions are driven through `GameManager` with in-memory stores and a
//! scripted oracle, from registration to a finished game.

use std::sync::Arc;
use tictactoe::auth::{AuthManager, AuthSecrets, GameStats, UserId};
use tictactoe::db::{MemoryGameRepository, MemoryUserRepository, UserRepository};
use tictactoe::game::{GameError, GameManager, Outcome, Position, Symbol};
use tictactoe::oracle::fake::FakeOracle;

struct TestEnv {
    auth: AuthManager,
    games: GameManager,
    users: MemoryUserRepository,
    sessions: MemoryGameRepository,
    oracle: Arc<FakeOracle>,
}

fn setup(oracle: FakeOracle) -> TestEnv {
    let users = MemoryUserRepository::new();
    let sessions = MemoryGameRepository::new();
    let oracle = Arc::new(oracle);

    let auth = AuthManager::new(
        Arc::new(users.clone()),
        AuthSecrets::new(
            "test-access-secret-0123456789abcdef",
            "test-refresh-secret-0123456789abcdef",
            "test-pepper-0123456789",
        ),
    );
    let games = GameManager::new(
        Arc::new(users.clone()),
        Arc::new(sessions.clone()),
        oracle.clone(),
    );

    TestEnv {
        auth,
        games,
        users,
        sessions,
        oracle,
    }
}

async fn register(env: &TestEnv, email: &str) -> UserId {
    env.auth.register(email, "pw123").await.unwrap().id
}

fn pos(row: i64, col: i64) -> Position {
    Position::new(row, col).unwrap()
}

#[tokio::test]
async fn test_new_session_properties() {
    let env = setup(FakeOracle::with_moves([(0, 0)]));
    let user_id = register(&env, "alice@example.com").await;

    let human_first = env.games.create_session(user_id, false).await.unwrap();
    assert_eq!(human_first.board.filled_count(), 0);
    assert_eq!(human_first.current_player, Symbol::X);
    assert!(!human_first.game_state.is_over);
    assert!(!human_first.is_computer_first);

    let computer_first = env.games.create_session(user_id, true).await.unwrap();
    assert_eq!(computer_first.board.filled_count(), 1);
    assert_eq!(computer_first.board.get(pos(0, 0)), Some(Symbol::X));
    assert_eq!(computer_first.current_player, Symbol::O);
    assert!(computer_first.is_computer_first);

    assert_eq!(env.sessions.len(), 2);
}

#[tokio::test]
async fn test_active_session_is_most_recent() {
    let env = setup(FakeOracle::new());
    let user_id = register(&env, "alice@example.com").await;

    assert!(env.games.active_session(user_id).await.unwrap().is_none());

    env.games.create_session(user_id, false).await.unwrap();
    let newer = env.games.create_session(user_id, false).await.unwrap();

    let active = env.games.active_session(user_id).await.unwrap().unwrap();
    assert_eq!(active.id, newer.id);
}

#[tokio::test]
async fn test_sessions_are_scoped_to_owner() {
    let env = setup(FakeOracle::new());
    let alice = register(&env, "alice@example.com").await;
    let bob = register(&env, "bob@example.com").await;

    let session = env.games.create_session(alice, false).await.unwrap();

    assert!(matches!(
        env.games.find_session(session.id, bob).await,
        Err(GameError::SessionNotFound)
    ));
    assert!(env.games.active_session(bob).await.unwrap().is_none());
}

#[tokio::test]
async fn test_occupied_cell_leaves_board_unchanged() {
    let env = setup(FakeOracle::with_moves([(1, 1)]));
    let user_id = register(&env, "alice@example.com").await;
    let session = env.games.create_session(user_id, false).await.unwrap();

    let after = env
        .games
        .apply_player_move(session.id, user_id, 0, 0)
        .await
        .unwrap();
    let calls_before = env.oracle.evaluate_calls();

    for (row, col) in [(0, 0), (1, 1)] {
        let result = env.games.apply_player_move(session.id, user_id, row, col).await;
        assert!(matches!(result, Err(GameError::CellOccupied { .. })));
    }

    let stored = env.games.find_session(session.id, user_id).await.unwrap();
    assert_eq!(stored.board, after.board);
    assert_eq!(
        env.oracle.evaluate_calls(),
        calls_before,
        "Rejected moves must not reach the oracle"
    );
}

#[tokio::test]
async fn test_out_of_bounds_moves_rejected() {
    let env = setup(FakeOracle::new());
    let user_id = register(&env, "alice@example.com").await;
    let session = env.games.create_session(user_id, false).await.unwrap();

    for (row, col) in [(-1, 0), (0, -1), (3, 0), (0, 3), (i64::MAX, 0)] {
        let result = env.games.apply_player_move(session.id, user_id, row, col).await;
        assert!(
            matches!(result, Err(GameError::InvalidPosition { .. })),
            "({row}, {col}) should be rejected"
        );
    }
    assert_eq!(env.oracle.evaluate_calls(), 0);
}

#[tokio::test]
async fn test_end_to_end_human_win() {
    // alice plays X down the main diagonal; the computer answers in row 0.
    let env = setup(FakeOracle::with_moves([(0, 1), (0, 2)]));
    let user_id = register(&env, "alice@example.com").await;
    let (_, tokens) = env.auth.login("alice@example.com", "pw123").await.unwrap();
    assert_eq!(env.auth.verify_access(&tokens.access_token).unwrap().sub, user_id);

    let session = env.games.create_session(user_id, false).await.unwrap();

    let s1 = env
        .games
        .apply_player_move(session.id, user_id, 0, 0)
        .await
        .unwrap();
    assert_eq!(s1.board.get(pos(0, 0)), Some(Symbol::X));
    assert_eq!(s1.board.get(pos(0, 1)), Some(Symbol::O));
    assert_eq!(s1.current_player, Symbol::X);

    env.games
        .apply_player_move(session.id, user_id, 1, 1)
        .await
        .unwrap();
    let moves_before_win = env.oracle.move_calls();

    let finished = env
        .games
        .apply_player_move(session.id, user_id, 2, 2)
        .await
        .unwrap();
    assert!(finished.game_state.is_over);
    assert_eq!(finished.game_state.winner, Some(Symbol::X));
    assert_eq!(
        env.oracle.move_calls(),
        moves_before_win,
        "No computer reply after the winning move"
    );

    let stats = env.games.user_stats(user_id).await.unwrap();
    assert_eq!(stats, GameStats { wins: 1, losses: 0, draws: 0 });
    assert!(env.games.active_session(user_id).await.unwrap().is_none());

    let result = env.games.apply_player_move(session.id, user_id, 1, 0).await;
    assert!(matches!(
        result,
        Err(GameError::GameAlreadyOver(Outcome::Winner(Symbol::X)))
    ));
}

#[tokio::test]
async fn test_draw_increments_draws() {
    // Final board:
    //   X O X
    //   X O O
    //   O X X
    let env = setup(FakeOracle::with_moves([(0, 1), (1, 1), (1, 2), (2, 0)]));
    let user_id = register(&env, "alice@example.com").await;
    let session = env.games.create_session(user_id, false).await.unwrap();

    let mut last = None;
    for (row, col) in [(0, 0), (0, 2), (1, 0), (2, 1), (2, 2)] {
        last = Some(
            env.games
                .apply_player_move(session.id, user_id, row, col)
                .await
                .unwrap(),
        );
    }
    let last = last.unwrap();

    assert!(last.game_state.is_over);
    assert!(last.game_state.is_draw);
    assert_eq!(last.game_state.winner, None);

    let stats = env.games.user_stats(user_id).await.unwrap();
    assert_eq!(stats, GameStats { wins: 0, losses: 0, draws: 1 });

    let result = env.games.apply_player_move(session.id, user_id, 0, 0).await;
    match result {
        Err(err @ GameError::GameAlreadyOver(Outcome::Draw)) => assert_eq!(
            err.to_string(),
            "Game is over. It's a draw! Start a new game to continue playing."
        ),
        other => panic!("expected draw rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_oracle_failure_keeps_player_move() {
    let env = setup(FakeOracle::new());
    let user_id = register(&env, "alice@example.com").await;
    let session = env.games.create_session(user_id, false).await.unwrap();

    env.oracle.fail_moves(true);
    let result = env.games.apply_player_move(session.id, user_id, 1, 1).await;
    assert!(matches!(result, Err(GameError::Oracle(_))));

    let stored = env.games.find_session(session.id, user_id).await.unwrap();
    assert_eq!(stored.board.get(pos(1, 1)), Some(Symbol::X));
    assert_eq!(stored.board.filled_count(), 1);
    assert!(!stored.game_state.is_over);
}

#[tokio::test]
async fn test_evaluation_failure_persists_nothing() {
    let env = setup(FakeOracle::new());
    let user_id = register(&env, "alice@example.com").await;
    let session = env.games.create_session(user_id, false).await.unwrap();

    env.oracle.fail_evaluations(true);
    let result = env.games.apply_player_move(session.id, user_id, 1, 1).await;
    assert!(matches!(result, Err(GameError::Oracle(_))));

    let stored = env.games.find_session(session.id, user_id).await.unwrap();
    assert_eq!(stored.board.filled_count(), 0);
}

#[tokio::test]
async fn test_stats_follow_latest_session_symbol() {
    // The loss is credited using the side the user plays in their most recent
    // session, which here is the one that just ended.
    let env = setup(FakeOracle::with_moves([(0, 0), (1, 0), (2, 0)]));
    let user_id = register(&env, "alice@example.com").await;
    let session = env.games.create_session(user_id, true).await.unwrap();

    env.games
        .apply_player_move(session.id, user_id, 0, 1)
        .await
        .unwrap();
    let finished = env
        .games
        .apply_player_move(session.id, user_id, 1, 1)
        .await
        .unwrap();

    assert_eq!(finished.game_state.winner, Some(Symbol::X));
    let user = env.users.find_by_id(user_id).await.unwrap().unwrap();
    assert_eq!(user.stats, GameStats { wins: 0, losses: 1, draws: 0 });
}

#[tokio::test]
async fn test_stats_use_side_of_newer_session() {
    // The user opens a computer-first game before finishing an older one, so
    // their latest session has them playing O when the older game's X win lands.
    let env = setup(FakeOracle::with_moves([(1, 0), (1, 1), (2, 2)]));
    let user_id = register(&env, "alice@example.com").await;
    let older = env.games.create_session(user_id, false).await.unwrap();

    env.games
        .apply_player_move(older.id, user_id, 0, 0)
        .await
        .unwrap();
    env.games
        .apply_player_move(older.id, user_id, 0, 1)
        .await
        .unwrap();

    let newer = env.games.create_session(user_id, true).await.unwrap();
    assert_eq!(newer.board.get(pos(2, 2)), Some(Symbol::X));

    let finished = env
        .games
        .apply_player_move(older.id, user_id, 0, 2)
        .await
        .unwrap();

    assert_eq!(finished.game_state.winner, Some(Symbol::X));
    let user = env.users.find_by_id(user_id).await.unwrap().unwrap();
    assert_eq!(user.stats, GameStats { wins: 0, losses: 1, draws: 0 });
}

#[tokio::test]
async fn test_stats_for_unknown_user() {
    let env = setup(FakeOracle::new());
    assert!(matches!(
        env.games.user_stats(42).await,
        Err(GameError::UserNotFound)
    ));
}
