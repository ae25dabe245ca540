use serde::{Deserialize, Serialize};

use crate::error::GameError;

pub const BOARD_SIZE: usize = 8;
pub const NUM_SQUARES: usize = BOARD_SIZE * BOARD_SIZE;

/// Occupancy of a single square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    #[serde(rename = "")]
    Empty,
    #[serde(rename = "black")]
    Black,
    #[serde(rename = "white")]
    White,
}

impl Cell {
    /// Returns the disk color, or `None` for an empty square.
    pub fn color(self) -> Option<Color> {
        match self {
            Self::Empty => None,
            Self::Black => Some(Color::Black),
            Self::White => Some(Color::White),
        }
    }

    /// 0=empty, 1=black, 2=white.
    pub fn to_u8(self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::Black => 1,
            Self::White => 2,
        }
    }
}

impl From<Color> for Cell {
    fn from(color: Color) -> Self {
        match color {
            Color::Black => Self::Black,
            Color::White => Self::White,
        }
    }
}

/// A player color. Black moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Black,
    White,
}

impl Color {
    pub fn opponent(self) -> Self {
        match self {
            Self::Black => Self::White,
            Self::White => Self::Black,
        }
    }

    /// Player index used by the save record: 0=black, 1=white.
    pub fn index(self) -> u8 {
        match self {
            Self::Black => 0,
            Self::White => 1,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Black),
            1 => Some(Self::White),
            _ => None,
        }
    }
}

/// A board coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub row: u8,
    pub col: u8,
}

impl Position {
    /// Checked constructor. Coordinates outside the 8x8 grid are a caller bug and fail loudly.
    pub fn new(row: usize, col: usize) -> Result<Self, GameError> {
        if row >= BOARD_SIZE || col >= BOARD_SIZE {
            return Err(GameError::OutOfBounds { row, col });
        }
        Ok(Self {
            row: row as u8,
            col: col as u8,
        })
    }

    pub(crate) fn from_index(idx: usize) -> Self {
        debug_assert!(idx < NUM_SQUARES);
        Self {
            row: (idx / BOARD_SIZE) as u8,
            col: (idx % BOARD_SIZE) as u8,
        }
    }

    pub fn index(self) -> usize {
        self.row as usize * BOARD_SIZE + self.col as usize
    }
}

/// Disk counts per color, computed on demand from a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreTally {
    pub black: u8,
    pub white: u8,
}

impl ScoreTally {
    pub fn of(self, color: Color) -> u8 {
        match color {
            Color::Black => self.black,
            Color::White => self.white,
        }
    }

    /// Strictly more disks wins; equal counts are a draw.
    pub fn outcome(self) -> Outcome {
        if self.black > self.white {
            Outcome::Winner(Color::Black)
        } else if self.white > self.black {
            Outcome::Winner(Color::White)
        } else {
            Outcome::Draw
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Winner(Color),
    Draw,
}

/// Flat game view returned from WASM APIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameSnapshot {
    /// Row-major cells: 0=empty, 1=black, 2=white.
    pub board: Vec<u8>,
    pub current_player: Color,
    pub black_count: u8,
    pub white_count: u8,
    pub awaiting_pass_ack: bool,
    pub is_game_over: bool,
    pub consecutive_passes: u8,
    pub ai_enabled: bool,
}

/// Final result after game over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GameResult {
    pub winner: Option<Color>,
    pub black_count: u8,
    pub white_count: u8,
}

impl From<ScoreTally> for GameResult {
    fn from(tally: ScoreTally) -> Self {
        Self {
            winner: match tally.outcome() {
                Outcome::Winner(color) => Some(color),
                Outcome::Draw => None,
            },
            black_count: tally.black,
            white_count: tally.white,
        }
    }
}
