//! Scriptable in-process oracle for tests.
//!
//! Moves come from a queue, falling back to the first empty cell. The verdict
//! uses plain line checks so end-to-end flows can reach terminal states.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Mutex,
};

use super::{MoveOracle, OracleError, OracleResult};
use crate::game::{Board, GameState, Position, Symbol, BOARD_SIZE};

/// Test double for [`MoveOracle`]
#[derive(Debug, Default)]
pub struct FakeOracle {
    scripted: Mutex<VecDeque<Position>>,
    fail_moves: AtomicBool,
    fail_evaluations: AtomicBool,
    exhausted: AtomicBool,
    move_calls: AtomicUsize,
    evaluate_calls: AtomicUsize,
}

impl FakeOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue moves to hand out before falling back to first-empty-cell
    pub fn with_moves(moves: impl IntoIterator<Item = (i64, i64)>) -> Self {
        let oracle = Self::new();
        for (row, col) in moves {
            oracle.push_move(row, col);
        }
        oracle
    }

    /// Queue one more move
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are off the board.
    pub fn push_move(&self, row: i64, col: i64) {
        let pos = Position::new(row, col).expect("scripted move must be on the board");
        self.scripted.lock().unwrap().push_back(pos);
    }

    /// Make `compute_move` fail with an upstream error
    pub fn fail_moves(&self, fail: bool) {
        self.fail_moves.store(fail, Ordering::SeqCst);
    }

    /// Make `evaluate` fail with an upstream error
    pub fn fail_evaluations(&self, fail: bool) {
        self.fail_evaluations.store(fail, Ordering::SeqCst);
    }

    /// Make `compute_move` answer with no move
    pub fn set_exhausted(&self, exhausted: bool) {
        self.exhausted.store(exhausted, Ordering::SeqCst);
    }

    pub fn move_calls(&self) -> usize {
        self.move_calls.load(Ordering::SeqCst)
    }

    pub fn evaluate_calls(&self) -> usize {
        self.evaluate_calls.load(Ordering::SeqCst)
    }
}

fn upstream_failure() -> OracleError {
    OracleError::Upstream {
        status: 500,
        message: "fake oracle failure".to_string(),
    }
}

const LINES: [[(usize, usize); BOARD_SIZE]; 8] = [
    [(0, 0), (0, 1), (0, 2)],
    [(1, 0), (1, 1), (1, 2)],
    [(2, 0), (2, 1), (2, 2)],
    [(0, 0), (1, 0), (2, 0)],
    [(0, 1), (1, 1), (2, 1)],
    [(0, 2), (1, 2), (2, 2)],
    [(0, 0), (1, 1), (2, 2)],
    [(0, 2), (1, 1), (2, 0)],
];

fn line_winner(board: &Board) -> Option<Symbol> {
    let cells = board.rows();
    LINES.iter().find_map(|line| {
        let first = cells[line[0].0][line[0].1]?;
        line.iter()
            .all(|&(r, c)| cells[r][c] == Some(first))
            .then_some(first)
    })
}

#[async_trait]
impl MoveOracle for FakeOracle {
    async fn compute_move(&self, board: &Board, _player: Symbol) -> OracleResult<Option<Position>> {
        self.move_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_moves.load(Ordering::SeqCst) {
            return Err(upstream_failure());
        }
        if self.exhausted.load(Ordering::SeqCst) {
            return Ok(None);
        }

        let scripted = self.scripted.lock().unwrap().pop_front();
        Ok(scripted.or_else(|| board.empty_positions().next()))
    }

    async fn evaluate(&self, board: &Board) -> OracleResult<GameState> {
        self.evaluate_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_evaluations.load(Ordering::SeqCst) {
            return Err(upstream_failure());
        }

        let winner = line_winner(board);
        let full = board.filled_count() == BOARD_SIZE * BOARD_SIZE;
        Ok(GameState {
            is_over: winner.is_some() || full,
            winner,
            is_draw: winner.is_none() && full,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(raw: [[&str; 3]; 3]) -> Board {
        let rows: Vec<Vec<String>> = raw
            .iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect();
        Board::try_from(rows).unwrap()
    }

    #[tokio::test]
    async fn test_full_row_column_and_diagonal_win() {
        let oracle = FakeOracle::new();
        for (b, winner) in [
            (board([["X", "X", "X"], ["O", "O", ""], ["", "", ""]]), Symbol::X),
            (board([["O", "X", ""], ["O", "X", ""], ["O", "", "X"]]), Symbol::O),
            (board([["X", "O", ""], ["O", "X", ""], ["", "", "X"]]), Symbol::X),
            (board([["X", "X", "O"], ["X", "O", ""], ["O", "", ""]]), Symbol::O),
        ] {
            let state = oracle.evaluate(&b).await.unwrap();
            assert!(state.is_over);
            assert_eq!(state.winner, Some(winner));
            assert!(!state.is_draw);
        }
    }

    #[tokio::test]
    async fn test_full_board_without_line_is_draw() {
        let oracle = FakeOracle::new();
        let b = board([["X", "O", "X"], ["X", "O", "O"], ["O", "X", "X"]]);
        let state = oracle.evaluate(&b).await.unwrap();
        assert!(state.is_over);
        assert!(state.is_draw);
        assert_eq!(state.winner, None);
    }

    #[tokio::test]
    async fn test_scripted_then_first_empty() {
        let oracle = FakeOracle::with_moves([(2, 2)]);
        let b = Board::new();
        let first = oracle.compute_move(&b, Symbol::O).await.unwrap().unwrap();
        assert_eq!((first.row(), first.col()), (2, 2));
        let second = oracle.compute_move(&b, Symbol::O).await.unwrap().unwrap();
        assert_eq!((second.row(), second.col()), (0, 0));
        assert_eq!(oracle.move_calls(), 2);
    }

    #[tokio::test]
    async fn test_failure_modes() {
        let oracle = FakeOracle::new();
        oracle.set_exhausted(true);
        assert!(oracle.compute_move(&Board::new(), Symbol::X).await.unwrap().is_none());

        oracle.fail_moves(true);
        assert!(oracle.compute_move(&Board::new(), Symbol::X).await.is_err());
        assert!(oracle.evaluate(&Board::new()).await.is_ok());
    }
}
