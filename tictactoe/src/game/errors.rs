//! Game orchestration error types.

use thiserror::Error;

use super::models::Outcome;
use crate::db::StoreError;
use crate::oracle::OracleError;

/// Game orchestration errors
#[derive(Debug, Error)]
pub enum GameError {
    /// Storage error
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// The move oracle failed or was unreachable
    #[error(transparent)]
    Oracle(#[from] OracleError),

    /// No session with that ID belongs to the caller
    #[error("Game session not found")]
    SessionNotFound,

    /// The session already reached a terminal state
    #[error("{}", game_over_message(.0))]
    GameAlreadyOver(Outcome),

    /// Target cell already holds a symbol
    #[error("Invalid move: cell ({row}, {col}) is already occupied")]
    CellOccupied { row: usize, col: usize },

    /// Target cell is outside the board
    #[error("Invalid move: position ({row}, {col}) is outside the board")]
    InvalidPosition { row: i64, col: i64 },

    /// The oracle returned no move for the computer
    #[error("No move returned from move oracle")]
    NoMoveAvailable,

    /// User not found
    #[error("User not found")]
    UserNotFound,
}

fn game_over_message(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Winner(symbol) => {
            format!("Game is over. {symbol} wins! Start a new game to continue playing.")
        }
        Outcome::Draw => "Game is over. It's a draw! Start a new game to continue playing.".to_string(),
        Outcome::Undecided => "Game is already over. Start a new game to continue playing.".to_string(),
    }
}

impl GameError {
    /// Get a client-safe error message that doesn't leak storage details
    pub fn client_message(&self) -> String {
        match self {
            GameError::Store(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }

    /// Whether the failure lies with storage or the oracle rather than the request
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            GameError::Store(_) | GameError::Oracle(_) | GameError::NoMoveAvailable
        )
    }
}

/// Result type for game operations
pub type GameResult<T> = Result<T, GameError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Symbol;

    #[test]
    fn test_game_over_messages() {
        assert_eq!(
            GameError::GameAlreadyOver(Outcome::Winner(Symbol::X)).to_string(),
            "Game is over. X wins! Start a new game to continue playing."
        );
        assert_eq!(
            GameError::GameAlreadyOver(Outcome::Draw).to_string(),
            "Game is over. It's a draw! Start a new game to continue playing."
        );
        assert_eq!(
            GameError::GameAlreadyOver(Outcome::Undecided).to_string(),
            "Game is already over. Start a new game to continue playing."
        );
    }

    #[test]
    fn test_oracle_errors_are_internal() {
        let err = GameError::from(OracleError::Unreachable("refused".to_string()));
        assert!(err.is_internal());
        assert!(err.client_message().contains("move oracle"));
        assert!(!GameError::SessionNotFound.is_internal());
    }
}
