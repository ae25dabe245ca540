//! JavaScript facade over [`GameController`].
//!
//! The renderer maps clicks to `(row, col)`, calls in here, then drains events and
//! redraws. Scoreboard bytes are handed back to the host to persist wherever it likes.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::ai::AlphaBetaSelector;
use crate::config::GameConfig;
use crate::error::GameError;
use crate::game::GameController;
use crate::scores::MemoryScoreRepository;

#[wasm_bindgen]
pub struct ReversiGame {
    controller: GameController,
    scores: MemoryScoreRepository,
}

#[wasm_bindgen]
impl ReversiGame {
    /// `config_json` may be omitted for defaults; `score_bytes` is a previously exported
    /// scoreboard.
    #[wasm_bindgen(constructor)]
    pub fn new(
        config_json: Option<String>,
        score_bytes: Option<Vec<u8>>,
    ) -> Result<ReversiGame, JsError> {
        let config = match config_json {
            Some(text) => GameConfig::from_json(&text)?,
            None => GameConfig::default(),
        };
        let scores = match score_bytes {
            Some(bytes) => MemoryScoreRepository::with_bytes(bytes),
            None => MemoryScoreRepository::new(),
        };
        let controller = GameController::new(
            config,
            Box::new(AlphaBetaSelector),
            Box::new(scores.clone()),
        )?;
        Ok(Self { controller, scores })
    }

    #[wasm_bindgen(js_name = startNewGame)]
    pub fn start_new_game(&mut self, vs_ai: bool) -> Result<(), JsError> {
        Ok(self.controller.start_new_game(vs_ai)?)
    }

    /// Returns `false` when the move was rejected; the game is unchanged in that case.
    #[wasm_bindgen(js_name = submitMove)]
    pub fn submit_move(&mut self, row: u32, col: u32) -> Result<bool, JsError> {
        match self.controller.submit_move(row as usize, col as usize) {
            Ok(()) => Ok(true),
            Err(GameError::IllegalMove { .. }) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    #[wasm_bindgen(js_name = acknowledgePass)]
    pub fn acknowledge_pass(&mut self) -> Result<(), JsError> {
        Ok(self.controller.acknowledge_pass()?)
    }

    #[wasm_bindgen(js_name = loadState)]
    pub fn load_state(&mut self, text: &str) -> Result<(), JsError> {
        Ok(self.controller.load_state(text)?)
    }

    #[wasm_bindgen(js_name = saveState)]
    pub fn save_state(&self) -> Result<String, JsError> {
        Ok(self.controller.save_state()?)
    }

    /// Current [`crate::types::GameSnapshot`].
    pub fn snapshot(&self) -> Result<JsValue, JsError> {
        to_js(&self.controller.snapshot())
    }

    #[wasm_bindgen(js_name = legalMoves)]
    pub fn legal_moves(&self) -> Result<JsValue, JsError> {
        to_js(&self.controller.legal_moves())
    }

    /// Events raised since the previous call, oldest first.
    #[wasm_bindgen(js_name = takeEvents)]
    pub fn take_events(&mut self) -> Result<JsValue, JsError> {
        to_js(&self.controller.drain_events())
    }

    /// `null` until the game has ended.
    pub fn result(&self) -> Result<JsValue, JsError> {
        to_js(&self.controller.result())
    }

    #[wasm_bindgen(js_name = recordResult)]
    pub fn record_result(&mut self, black_name: &str, white_name: &str) -> Result<(), JsError> {
        Ok(self.controller.record_result(black_name, white_name)?)
    }

    pub fn leaderboard(&self) -> Result<JsValue, JsError> {
        to_js(&self.controller.scoreboard().leaderboard())
    }

    /// Scoreboard blob to persist, once anything has been recorded.
    #[wasm_bindgen(js_name = exportScores)]
    pub fn export_scores(&self) -> Option<Vec<u8>> {
        self.scores.bytes()
    }
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsError> {
    serde_wasm_bindgen::to_value(value).map_err(|err| JsError::new(&err.to_string()))
}
