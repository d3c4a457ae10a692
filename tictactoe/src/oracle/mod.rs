//! Move oracle boundary.
//!
//! Legal-move selection and win/draw detection live in an external service.
//! The [`MoveOracle`] trait is the seam the game orchestrator talks to;
//! [`HttpMoveOracle`] is the production client.
//!
//! ## Wire contract
//!
//! ```text
//! POST {base}/move        {board, player} -> {move: {row, col}, board, game_state}
//! POST {base}/game-state  {board}         -> {board, game_state: {is_over, winner, is_draw}}
//! ```

use async_trait::async_trait;

use crate::game::{Board, GameState, Position, Symbol};

pub mod client;
pub mod errors;
#[cfg(any(test, feature = "test-util"))]
pub mod fake;
pub mod models;

pub use client::{HttpMoveOracle, DEFAULT_ORACLE_TIMEOUT};
pub use errors::{OracleError, OracleResult};

/// Source of computer moves and terminal-state verdicts
#[async_trait]
pub trait MoveOracle: Send + Sync {
    /// Pick a move for `player` on `board`; `None` if the oracle has no move to offer
    async fn compute_move(&self, board: &Board, player: Symbol) -> OracleResult<Option<Position>>;

    /// Report whether `board` is won, drawn or still in progress
    async fn evaluate(&self, board: &Board) -> OracleResult<GameState>;
}
