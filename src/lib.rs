//! Reversi game engine: rules, turn flow and a fixed-depth alpha-beta opponent.
//!
//! Rendering, menus and file handling live in the host; the host talks to
//! [`GameController`] directly or through the [`wasm::ReversiGame`] facade.

use wasm_bindgen::prelude::*;

pub mod ai;
pub mod board;
pub mod config;
pub mod error;
pub mod game;
pub mod rules;
pub mod save;
pub mod scores;
pub mod types;
pub mod wasm;

pub use board::Board;
pub use config::GameConfig;
pub use error::{GameError, ScoreboardError};
pub use game::{GameController, GameEvent, GameState, Phase};
pub use types::{Cell, Color, Position, ScoreTally};

#[wasm_bindgen]
pub fn wasm_ready() -> bool {
    true
}
