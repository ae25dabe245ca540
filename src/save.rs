//! Save record exchanged with the persistence layer.
//!
//! ```json
//! {"ai_enabled":false,"active_player":0,"consecutive_passes":0,"ended":false,
//!  "board":[["","","","","","","",""], ...]}
//! ```
//!
//! Decoding is all-or-nothing: any shape violation is an [`GameError::InvalidSaveFormat`]
//! and no partial state is produced.

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::error::GameError;
use crate::game::GameState;
use crate::types::{BOARD_SIZE, Cell, Color};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SavedGame {
    pub ai_enabled: bool,
    pub active_player: u8,
    pub consecutive_passes: u8,
    pub ended: bool,
    pub board: Vec<Vec<Cell>>,
}

impl SavedGame {
    pub fn from_state(state: &GameState) -> Self {
        Self {
            ai_enabled: state.ai_enabled,
            active_player: state.active.index(),
            consecutive_passes: state.consecutive_passes,
            ended: state.ended,
            board: state.board.to_cells().iter().map(|row| row.to_vec()).collect(),
        }
    }

    /// Validates the record and builds the state it describes.
    pub fn into_state(self) -> Result<GameState, GameError> {
        if self.board.len() != BOARD_SIZE {
            return Err(invalid(format!(
                "board must have {BOARD_SIZE} rows, got {}",
                self.board.len()
            )));
        }

        let mut cells = [[Cell::Empty; BOARD_SIZE]; BOARD_SIZE];
        for (row, line) in self.board.iter().enumerate() {
            if line.len() != BOARD_SIZE {
                return Err(invalid(format!(
                    "row {row} must have {BOARD_SIZE} cells, got {}",
                    line.len()
                )));
            }
            cells[row].copy_from_slice(line);
        }

        let active = Color::from_index(self.active_player).ok_or_else(|| {
            invalid(format!(
                "active_player must be 0 or 1, got {}",
                self.active_player
            ))
        })?;

        let max_passes = if self.ended { 2 } else { 1 };
        if self.consecutive_passes > max_passes {
            return Err(invalid(format!(
                "consecutive_passes must be at most {max_passes}, got {}",
                self.consecutive_passes
            )));
        }

        Ok(GameState {
            board: Board::from_cells(cells),
            active,
            consecutive_passes: self.consecutive_passes,
            ai_enabled: self.ai_enabled,
            ended: self.ended,
        })
    }
}

pub fn encode(state: &GameState) -> Result<String, GameError> {
    serde_json::to_string(&SavedGame::from_state(state)).map_err(|err| invalid(err.to_string()))
}

pub fn decode(text: &str) -> Result<GameState, GameError> {
    let record: SavedGame = serde_json::from_str(text).map_err(|err| invalid(err.to_string()))?;
    record.into_state()
}

fn invalid(reason: String) -> GameError {
    GameError::InvalidSaveFormat(reason)
}
