use serde::{Serialize, Serializer};

use crate::error::GameError;
use crate::types::{BOARD_SIZE, Cell, Color, NUM_SQUARES, Position, ScoreTally};

/// Reversi board state represented by two bitboards.
///
/// Bit `row * 8 + col` is set in `black` or `white` when that square holds a disk of
/// that color. The two masks never overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    black: u64,
    white: u64,
}

impl Board {
    /// Creates the initial board:
    /// (3,3)=white, (3,4)=black, (4,3)=black, (4,4)=white.
    pub fn initial() -> Self {
        Self {
            black: bit(28) | bit(35),
            white: bit(27) | bit(36),
        }
    }

    /// A board with no disks at all.
    pub fn empty() -> Self {
        Self { black: 0, white: 0 }
    }

    /// Builds a board from a row-major cell grid.
    pub fn from_cells(cells: [[Cell; BOARD_SIZE]; BOARD_SIZE]) -> Self {
        let mut board = Self::empty();
        for (row, line) in cells.iter().enumerate() {
            for (col, &cell) in line.iter().enumerate() {
                board.set(Position::from_index(row * BOARD_SIZE + col), cell);
            }
        }
        board
    }

    /// Returns the cell at `(row, col)`.
    pub fn cell_at(&self, row: usize, col: usize) -> Result<Cell, GameError> {
        Position::new(row, col).map(|pos| self.get(pos))
    }

    pub(crate) fn get(&self, pos: Position) -> Cell {
        let square = bit(pos.index());
        if (self.black & square) != 0 {
            Cell::Black
        } else if (self.white & square) != 0 {
            Cell::White
        } else {
            Cell::Empty
        }
    }

    /// Sets one square on a working copy. Only the move rule engine writes disks.
    pub(crate) fn set_cell(&mut self, pos: Position, color: Color) {
        self.set(pos, color.into());
    }

    fn set(&mut self, pos: Position, cell: Cell) {
        let square = bit(pos.index());
        self.black &= !square;
        self.white &= !square;
        match cell {
            Cell::Black => self.black |= square,
            Cell::White => self.white |= square,
            Cell::Empty => {}
        }
    }

    /// True iff no square is empty.
    pub fn is_full(&self) -> bool {
        (self.black | self.white) == u64::MAX
    }

    /// Counts disks per color. Empty squares count for neither side.
    pub fn tally(&self) -> ScoreTally {
        ScoreTally {
            black: self.black.count_ones() as u8,
            white: self.white.count_ones() as u8,
        }
    }

    /// Returns the number of empty squares.
    pub fn empty_count(&self) -> u8 {
        let tally = self.tally();
        NUM_SQUARES as u8 - tally.black - tally.white
    }

    /// Converts board to `[u8; 64]` where 0=empty, 1=black, 2=white.
    pub fn to_array(&self) -> [u8; NUM_SQUARES] {
        let mut board = [0u8; NUM_SQUARES];
        for (pos, cell) in board.iter_mut().enumerate() {
            *cell = self.get(Position::from_index(pos)).to_u8();
        }
        board
    }

    /// Returns the board as a row-major cell grid.
    pub fn to_cells(&self) -> [[Cell; BOARD_SIZE]; BOARD_SIZE] {
        let mut cells = [[Cell::Empty; BOARD_SIZE]; BOARD_SIZE];
        for (row, line) in cells.iter_mut().enumerate() {
            for (col, cell) in line.iter_mut().enumerate() {
                *cell = self.get(Position::from_index(row * BOARD_SIZE + col));
            }
        }
        cells
    }
}

#[cfg(test)]
impl Board {
    /// Parses a diagram of 8 rows using `B`, `W` and `.`.
    pub(crate) fn from_diagram(rows: [&str; BOARD_SIZE]) -> Self {
        let mut cells = [[Cell::Empty; BOARD_SIZE]; BOARD_SIZE];
        for (row, text) in rows.iter().enumerate() {
            assert_eq!(text.len(), BOARD_SIZE, "row {row} must have 8 squares");
            for (col, ch) in text.chars().enumerate() {
                cells[row][col] = match ch {
                    'B' => Cell::Black,
                    'W' => Cell::White,
                    '.' => Cell::Empty,
                    other => panic!("unexpected square {other:?}"),
                };
            }
        }
        Self::from_cells(cells)
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::initial()
    }
}

impl Serialize for Board {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_cells().serialize(serializer)
    }
}

fn bit(pos: usize) -> u64 {
    if pos < NUM_SQUARES { 1u64 << pos } else { 0 }
}
