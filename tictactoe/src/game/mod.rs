//! Tic-tac-toe sessions between a user and the computer.
//!
//! Win and draw detection plus the computer's move selection are delegated to
//! an external [`MoveOracle`](crate::oracle::MoveOracle); this module owns the
//! session lifecycle, move validation and statistics attribution.
//!
//! A session moves from in-progress to over (won by X, won by O, or drawn).
//! Once over it never changes again.

pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{GameError, GameResult};
pub use manager::GameManager;
pub use models::{
    BOARD_SIZE, Board, BoardError, Cell, GameSession, GameState, NewGameSession, Outcome, Position,
    SessionId, Symbol,
};
