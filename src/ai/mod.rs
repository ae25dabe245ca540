//! Computer opponent.

pub mod search;

use crate::board::Board;
use crate::rules::legal_moves;
use crate::types::{Color, Position};

pub use search::{SearchOutcome, Searcher, best_move, evaluate};

/// Chooses a move for the computer-controlled side.
pub trait MoveSelector: Send + Sync {
    fn select_move(&self, board: &Board, color: Color, depth: u8) -> Option<Position>;
}

/// The default opponent: fixed-depth alpha-beta over disk count.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlphaBetaSelector;

impl MoveSelector for AlphaBetaSelector {
    fn select_move(&self, board: &Board, color: Color, depth: u8) -> Option<Position> {
        best_move(board, color, depth.max(1)).choice
    }
}

/// Plays the first legal square in row-major order.
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstLegalMoveSelector;

impl MoveSelector for FirstLegalMoveSelector {
    fn select_move(&self, board: &Board, color: Color, _depth: u8) -> Option<Position> {
        legal_moves(board, color).into_iter().next()
    }
}
