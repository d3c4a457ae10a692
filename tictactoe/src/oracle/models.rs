//! Move oracle wire format.
//!
//! The oracle speaks snake_case JSON and encodes the board as rows of
//! `""`/`"X"`/`"O"` strings.

use serde::{Deserialize, Serialize};

use crate::game::{Board, GameState, Position, Symbol};

/// Body of `POST /move`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveRequest {
    pub board: Board,
    pub player: Symbol,
}

/// Body of `POST /game-state`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateRequest {
    pub board: Board,
}

/// Coordinates as sent by the oracle, before bounds checking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMove {
    pub row: i64,
    pub col: i64,
}

impl WireMove {
    pub fn position(&self) -> Option<Position> {
        Position::new(self.row, self.col)
    }
}

impl From<Position> for WireMove {
    fn from(pos: Position) -> Self {
        Self {
            row: pos.row() as i64,
            col: pos.col() as i64,
        }
    }
}

/// Terminal-state verdict in the oracle's field naming
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WireGameState {
    pub is_over: bool,
    pub winner: Option<Symbol>,
    pub is_draw: bool,
}

impl From<WireGameState> for GameState {
    fn from(wire: WireGameState) -> Self {
        GameState {
            is_over: wire.is_over,
            winner: wire.winner,
            is_draw: wire.is_draw,
        }
    }
}

impl From<GameState> for WireGameState {
    fn from(state: GameState) -> Self {
        WireGameState {
            is_over: state.is_over,
            winner: state.winner,
            is_draw: state.is_draw,
        }
    }
}

/// Response of both `POST /move` and `POST /game-state`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleResponse {
    #[serde(rename = "move", default, skip_serializing_if = "Option::is_none")]
    pub next_move: Option<WireMove>,
    pub board: Board,
    pub game_state: WireGameState,
}

/// Error body the oracle returns with non-2xx statuses
#[derive(Debug, Clone, Deserialize)]
pub struct OracleErrorBody {
    pub error: Option<String>,
}
