//! Move legality and the capture (flip) algorithm.
//!
//! Both operations work on an explicit board snapshot. A candidate square is scanned
//! through each occupied neighbor of the opposite color: the run of opponent disks
//! starting at that neighbor must end on a disk of the mover's color, without hitting an
//! empty square or leaving the grid.

use once_cell::sync::Lazy;
use tracing::trace;

use crate::board::Board;
use crate::types::{BOARD_SIZE, Cell, Color, NUM_SQUARES, Position};

/// In-bounds Moore neighborhood of every square, in row-major order.
static NEIGHBORHOODS: Lazy<Vec<Vec<Position>>> = Lazy::new(|| {
    (0..NUM_SQUARES)
        .map(|idx| {
            let center = Position::from_index(idx);
            let mut around = Vec::with_capacity(8);
            for dr in -1i32..=1 {
                for dc in -1i32..=1 {
                    if dr == 0 && dc == 0 {
                        continue;
                    }
                    let (r, c) = (center.row as i32 + dr, center.col as i32 + dc);
                    if in_bounds(r, c) {
                        around.push(Position::from_index(r as usize * BOARD_SIZE + c as usize));
                    }
                }
            }
            around
        })
        .collect()
});

/// Returns whether `color` may place a disk at `(row, col)`.
///
/// Out-of-range coordinates and occupied squares are simply not legal.
pub fn is_legal(board: &Board, color: Color, row: usize, col: usize) -> bool {
    match Position::new(row, col) {
        Ok(pos) => is_legal_at(board, color, pos),
        Err(_) => false,
    }
}

pub fn is_legal_at(board: &Board, color: Color, pos: Position) -> bool {
    if board.get(pos) != Cell::Empty {
        return false;
    }
    opponent_neighbors(board, color, pos)
        .any(|neighbor| bracket(board, color, pos, neighbor).is_some())
}

/// Plays `color` at `(row, col)` and returns the resulting board.
///
/// Caller contract: the move has already passed [`is_legal`]. The input board is not
/// modified; an out-of-range square returns it unchanged.
pub fn apply_move(board: &Board, color: Color, row: usize, col: usize) -> Board {
    match Position::new(row, col) {
        Ok(pos) => apply_move_at(board, color, pos),
        Err(_) => *board,
    }
}

pub fn apply_move_at(board: &Board, color: Color, pos: Position) -> Board {
    debug_assert!(
        is_legal_at(board, color, pos),
        "apply_move requires a legal move at {pos:?}"
    );

    let mut next = *board;
    next.set_cell(pos, color);

    let mut flipped = 0usize;
    for neighbor in opponent_neighbors(board, color, pos) {
        if let Some(line) = bracket(board, color, pos, neighbor) {
            flipped += line.len();
            for disk in line {
                next.set_cell(disk, color);
            }
        }
    }

    trace!(?color, row = pos.row, col = pos.col, flipped, "applied move");
    next
}

/// All legal squares for `color`, row-major.
pub fn legal_moves(board: &Board, color: Color) -> Vec<Position> {
    (0..NUM_SQUARES)
        .map(Position::from_index)
        .filter(|&pos| is_legal_at(board, color, pos))
        .collect()
}

pub fn has_legal_move(board: &Board, color: Color) -> bool {
    (0..NUM_SQUARES)
        .map(Position::from_index)
        .any(|pos| is_legal_at(board, color, pos))
}

/// Occupied neighbors that can start a capture line. Own-color neighbors never can.
fn opponent_neighbors(
    board: &Board,
    color: Color,
    pos: Position,
) -> impl Iterator<Item = Position> + '_ {
    let opponent = Cell::from(color.opponent());
    NEIGHBORHOODS[pos.index()]
        .iter()
        .copied()
        .filter(move |&neighbor| board.get(neighbor) == opponent)
}

/// Walks from `origin` through `neighbor` and returns the opponent disks strictly between
/// `origin` and the first disk of `color`, or `None` when the run is not closed.
fn bracket(
    board: &Board,
    color: Color,
    origin: Position,
    neighbor: Position,
) -> Option<Vec<Position>> {
    let dr = neighbor.row as i32 - origin.row as i32;
    let dc = neighbor.col as i32 - origin.col as i32;
    let (mut r, mut c) = (neighbor.row as i32, neighbor.col as i32);
    let mut line = Vec::new();

    while in_bounds(r, c) {
        let square = Position::from_index(r as usize * BOARD_SIZE + c as usize);
        match board.get(square).color() {
            None => return None,
            Some(found) if found == color => return (!line.is_empty()).then_some(line),
            Some(_) => line.push(square),
        }
        r += dr;
        c += dc;
    }

    None
}

fn in_bounds(row: i32, col: i32) -> bool {
    (0..BOARD_SIZE as i32).contains(&row) && (0..BOARD_SIZE as i32).contains(&col)
}
