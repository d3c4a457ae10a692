//! Board, symbol and session data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

use crate::auth::UserId;

/// Session ID type
pub type SessionId = i64;

/// Side length of the square board.
pub const BOARD_SIZE: usize = 3;

/// A player's mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbol {
    X,
    O,
}

impl Symbol {
    /// The other player's symbol.
    pub fn opponent(self) -> Self {
        match self {
            Symbol::X => Symbol::O,
            Symbol::O => Symbol::X,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Symbol::X => "X",
            Symbol::O => "O",
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Symbol {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "X" => Ok(Symbol::X),
            "O" => Ok(Symbol::O),
            other => Err(BoardError::InvalidCell(other.to_string())),
        }
    }
}

/// A board cell: empty or holding a symbol.
pub type Cell = Option<Symbol>;

/// Board decoding errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("Board must have {BOARD_SIZE} rows, got {0}")]
    RowCount(usize),

    #[error("Board row {row} must have {BOARD_SIZE} cells, got {len}")]
    RowLength { row: usize, len: usize },

    #[error("Invalid cell value: {0:?}")]
    InvalidCell(String),
}

/// A validated coordinate on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Position {
    row: usize,
    col: usize,
}

impl Position {
    /// Build a position, returning `None` if either coordinate is off the board.
    pub fn new(row: i64, col: i64) -> Option<Self> {
        let size = BOARD_SIZE as i64;
        if (0..size).contains(&row) && (0..size).contains(&col) {
            Some(Self {
                row: row as usize,
                col: col as usize,
            })
        } else {
            None
        }
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn col(&self) -> usize {
        self.col
    }
}

/// The 3×3 grid.
///
/// Serialized as rows of strings (`""`, `"X"` or `"O"`), which is both the
/// client-facing shape and the oracle's wire shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<String>>", into = "Vec<Vec<String>>")]
pub struct Board {
    cells: [[Cell; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    /// An empty board.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, pos: Position) -> Cell {
        self.cells[pos.row][pos.col]
    }

    pub fn is_occupied(&self, pos: Position) -> bool {
        self.get(pos).is_some()
    }

    /// Write `symbol` into `pos`, overwriting whatever is there.
    ///
    /// Occupancy is checked by the caller; the oracle is the authority on legality.
    pub fn place(&mut self, pos: Position, symbol: Symbol) {
        self.cells[pos.row][pos.col] = Some(symbol);
    }

    /// Number of non-empty cells.
    pub fn filled_count(&self) -> usize {
        self.cells.iter().flatten().filter(|c| c.is_some()).count()
    }

    pub fn rows(&self) -> &[[Cell; BOARD_SIZE]; BOARD_SIZE] {
        &self.cells
    }

    /// Iterate over every empty position in row-major order.
    pub fn empty_positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..BOARD_SIZE).flat_map(move |row| {
            (0..BOARD_SIZE).filter_map(move |col| {
                let pos = Position { row, col };
                (!self.is_occupied(pos)).then_some(pos)
            })
        })
    }
}

impl TryFrom<Vec<Vec<String>>> for Board {
    type Error = BoardError;

    fn try_from(rows: Vec<Vec<String>>) -> Result<Self, Self::Error> {
        if rows.len() != BOARD_SIZE {
            return Err(BoardError::RowCount(rows.len()));
        }

        let mut board = Board::new();
        for (r, row) in rows.iter().enumerate() {
            if row.len() != BOARD_SIZE {
                return Err(BoardError::RowLength {
                    row: r,
                    len: row.len(),
                });
            }
            for (c, value) in row.iter().enumerate() {
                board.cells[r][c] = match value.as_str() {
                    "" => None,
                    other => Some(other.parse()?),
                };
            }
        }
        Ok(board)
    }
}

impl From<Board> for Vec<Vec<String>> {
    fn from(board: Board) -> Self {
        board
            .cells
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.map(Symbol::as_str).unwrap_or("").to_string())
                    .collect()
            })
            .collect()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.cells.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            let line: Vec<&str> = row
                .iter()
                .map(|cell| cell.map(Symbol::as_str).unwrap_or("."))
                .collect();
            write!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}

/// Terminal-state verdict for a board, as reported by the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub is_over: bool,
    pub winner: Option<Symbol>,
    pub is_draw: bool,
}

impl GameState {
    /// The state of a game that has not ended.
    pub fn in_progress() -> Self {
        Self::default()
    }

    /// How the game ended, or `None` while it is still in progress.
    pub fn outcome(&self) -> Option<Outcome> {
        if !self.is_over {
            return None;
        }
        Some(match (self.winner, self.is_draw) {
            (Some(symbol), _) => Outcome::Winner(symbol),
            (None, true) => Outcome::Draw,
            (None, false) => Outcome::Undecided,
        })
    }

    /// How the game counts toward statistics.
    ///
    /// Unlike [`outcome`](Self::outcome), a set draw flag takes precedence
    /// over a reported winner.
    pub fn tally(&self) -> Option<Outcome> {
        if !self.is_over {
            return None;
        }
        Some(match (self.is_draw, self.winner) {
            (true, _) => Outcome::Draw,
            (false, Some(symbol)) => Outcome::Winner(symbol),
            (false, None) => Outcome::Undecided,
        })
    }
}

/// Result of a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Winner(Symbol),
    Draw,
    /// Over, but the oracle reported neither a winner nor a draw.
    Undecided,
}

/// A persisted game between one user and the computer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSession {
    pub id: SessionId,
    pub user_id: UserId,
    pub board: Board,
    pub current_player: Symbol,
    pub game_state: GameState,
    pub is_computer_first: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GameSession {
    /// The computer always holds X when it opens, O otherwise.
    pub fn computer_symbol(&self) -> Symbol {
        computer_symbol(self.is_computer_first)
    }

    pub fn human_symbol(&self) -> Symbol {
        self.computer_symbol().opponent()
    }

    pub fn is_over(&self) -> bool {
        self.game_state.is_over
    }
}

pub(crate) fn computer_symbol(is_computer_first: bool) -> Symbol {
    if is_computer_first { Symbol::X } else { Symbol::O }
}

/// A session that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGameSession {
    pub user_id: UserId,
    pub board: Board,
    pub current_player: Symbol,
    pub game_state: GameState,
    pub is_computer_first: bool,
}

impl NewGameSession {
    /// A fresh game: empty board, X to play, not over.
    pub fn new(user_id: UserId, is_computer_first: bool) -> Self {
        Self {
            user_id,
            board: Board::new(),
            current_player: Symbol::X,
            game_state: GameState::in_progress(),
            is_computer_first,
        }
    }
}
