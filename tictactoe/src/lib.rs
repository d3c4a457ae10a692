//! # Tic-Tac-Toe
//!
//! Account, session and orchestration layer for a tic-tac-toe backend where a
//! human plays against a computer opponent.
//!
//! Move selection and win/draw detection are not computed here. They are
//! delegated to an external Move Oracle reached over HTTP; this crate owns the
//! bookkeeping around it: who is playing, whose turn it is, when a session is
//! over, and how the result counts toward the player's statistics.
//!
//! ## Core Modules
//!
//! - [`auth`]: registration, login, refresh-token rotation and access-token verification
//! - [`db`]: connection pooling plus the credential and session stores
//! - [`game`]: board and session models and the [`GameManager`] orchestrator
//! - [`oracle`]: the [`MoveOracle`] boundary and its HTTP client
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tictactoe::{
//!     auth::{AuthManager, AuthSecrets},
//!     db::{Database, DatabaseConfig, PgGameRepository, PgUserRepository},
//!     game::GameManager,
//!     oracle::HttpMoveOracle,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&DatabaseConfig::from_env()).await?;
//!     let users = Arc::new(PgUserRepository::new(db.pool().clone()));
//!     let games = Arc::new(PgGameRepository::new(db.pool().clone()));
//!     let oracle = Arc::new(HttpMoveOracle::new("http://localhost:8000")?);
//!
//!     let secrets = AuthSecrets::new("access", "refresh", "pepper");
//!     let auth = AuthManager::new(users.clone(), secrets);
//!     let games = GameManager::new(users, games, oracle);
//!
//!     let user = auth.register("alice@example.com", "pw123").await?;
//!     let session = games.create_session(user.id, false).await?;
//!     println!("{}", session.board);
//!     Ok(())
//! }
//! ```

/// Authentication and token management.
pub mod auth;

/// Persistence: connection pool and record stores.
pub mod db;

/// Board, sessions and the game orchestrator.
pub mod game;

/// External move/state oracle boundary.
pub mod oracle;

pub use auth::{AuthError, AuthManager};
pub use game::{Board, GameError, GameManager, GameSession, GameState, Position, Symbol};
pub use oracle::{HttpMoveOracle, MoveOracle, OracleError};
