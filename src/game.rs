use serde::Serialize;
use tracing::{debug, info, warn};

use crate::ai::{AlphaBetaSelector, MoveSelector};
use crate::board::Board;
use crate::config::GameConfig;
use crate::error::GameError;
use crate::rules::{apply_move_at, has_legal_move, is_legal_at, legal_moves};
use crate::save;
use crate::scores::{MemoryScoreRepository, ScoreRepository, Scoreboard};
use crate::types::{Color, GameResult, GameSnapshot, Outcome, Position, ScoreTally};

/// Everything a saved game needs to resume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    pub board: Board,
    /// Player whose turn it is. While a pass is pending this is the player who moves once the
    /// pass is acknowledged; the passing player is its opponent.
    pub active: Color,
    pub consecutive_passes: u8,
    pub ai_enabled: bool,
    pub ended: bool,
}

impl GameState {
    pub fn new(ai_enabled: bool) -> Self {
        Self {
            board: Board::initial(),
            active: Color::Black,
            consecutive_passes: 0,
            ai_enabled,
            ended: false,
        }
    }

    pub fn phase(&self) -> Phase {
        if self.ended {
            Phase::Ended
        } else if self.consecutive_passes > 0 {
            Phase::AwaitingPassAck
        } else {
            Phase::InProgress
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    InProgress,
    /// The opponent of the active player has no legal move; the host must acknowledge the pass.
    AwaitingPassAck,
    Ended,
}

/// Notifications for the presentation layer, in the order they happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    BoardUpdated { board: Board },
    TurnChanged { active: Color },
    PassOccurred { player: Color },
    GameEnded { tally: ScoreTally, outcome: Outcome },
    MoveRejected { row: u8, col: u8 },
}

/// Owns the running game and drives turns, passes and the end of the game.
///
/// Human and computer moves go through the same accept path, so legality, flipping and
/// termination never differ between them.
pub struct GameController {
    state: GameState,
    config: GameConfig,
    selector: Box<dyn MoveSelector>,
    repository: Box<dyn ScoreRepository>,
    scoreboard: Scoreboard,
    recorded: bool,
    events: Vec<GameEvent>,
}

impl GameController {
    /// Builds a controller and loads the scoreboard from `repository`.
    pub fn new(
        config: GameConfig,
        selector: Box<dyn MoveSelector>,
        repository: Box<dyn ScoreRepository>,
    ) -> Result<Self, GameError> {
        config.validate()?;
        let scoreboard = repository.load()?;
        info!(entries = scoreboard.len(), "scoreboard loaded");

        Ok(Self {
            state: GameState::new(false),
            config,
            selector,
            repository,
            scoreboard,
            recorded: false,
            events: Vec::new(),
        })
    }

    /// Alpha-beta opponent, default config, in-memory scores.
    pub fn with_defaults() -> Result<Self, GameError> {
        Self::new(
            GameConfig::default(),
            Box::new(AlphaBetaSelector),
            Box::new(MemoryScoreRepository::new()),
        )
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn board(&self) -> &Board {
        &self.state.board
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn scoreboard(&self) -> &Scoreboard {
        &self.scoreboard
    }

    /// Current disk counts. Always recomputed from the board.
    pub fn score(&self) -> ScoreTally {
        self.state.board.tally()
    }

    pub fn is_computer_turn(&self) -> bool {
        self.state.ai_enabled && self.state.active == self.config.computer_color
    }

    /// Legal squares for the active player, row-major.
    pub fn legal_moves(&self) -> Vec<Position> {
        if self.phase() != Phase::InProgress {
            return Vec::new();
        }
        legal_moves(&self.state.board, self.state.active)
    }

    /// Takes all events raised since the last call.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Discards the current game and starts a fresh one.
    pub fn start_new_game(&mut self, vs_ai: bool) -> Result<(), GameError> {
        self.state = GameState::new(vs_ai);
        self.recorded = false;
        info!(vs_ai, "new game");
        self.emit(GameEvent::BoardUpdated {
            board: self.state.board,
        });
        self.emit(GameEvent::TurnChanged {
            active: self.state.active,
        });
        self.play_computer_turns()
    }

    /// Plays a human move for the active player.
    ///
    /// Out-of-range coordinates are an error. A move that is not playable right now
    /// (illegal square, computer's turn, pending pass, finished game) raises
    /// [`GameEvent::MoveRejected`], returns [`GameError::IllegalMove`] and changes nothing.
    pub fn submit_move(&mut self, row: usize, col: usize) -> Result<(), GameError> {
        let pos = Position::new(row, col)?;

        let playable = self.phase() == Phase::InProgress
            && !self.is_computer_turn()
            && is_legal_at(&self.state.board, self.state.active, pos);
        if !playable {
            warn!(row, col, phase = ?self.phase(), "move rejected");
            self.emit(GameEvent::MoveRejected {
                row: pos.row,
                col: pos.col,
            });
            return Err(GameError::IllegalMove {
                row: pos.row,
                col: pos.col,
            });
        }

        self.accept_move(pos);
        self.play_computer_turns()
    }

    /// Checks whether the active player must pass and returns `true` if so.
    ///
    /// With a pass already pending this counts as acknowledging it: if the active player is
    /// blocked as well, that is the second pass and the game ends.
    pub fn check_pass(&mut self) -> Result<bool, GameError> {
        if self.phase() == Phase::Ended {
            return Ok(false);
        }

        let passed = self.offer_turn(self.state.active);
        self.play_computer_turns()?;
        Ok(passed)
    }

    /// Confirms a pending pass. The active player moves again, or the game ends if they
    /// are blocked as well.
    pub fn acknowledge_pass(&mut self) -> Result<(), GameError> {
        if self.phase() != Phase::AwaitingPassAck {
            return Err(GameError::NoPendingPass);
        }

        self.offer_turn(self.state.active);
        self.play_computer_turns()
    }

    /// Final tally and winner, once the game has ended.
    pub fn result(&self) -> Option<GameResult> {
        (self.phase() == Phase::Ended).then(|| self.score().into())
    }

    /// Adds the finished game's disk counts to both nicknames and saves the scoreboard.
    /// Each game can be recorded once.
    pub fn record_result(&mut self, black_name: &str, white_name: &str) -> Result<(), GameError> {
        if self.phase() != Phase::Ended {
            return Err(GameError::GameNotOver);
        }
        if self.recorded {
            return Err(GameError::AlreadyRecorded);
        }

        let tally = self.score();
        let mut scoreboard = self.scoreboard.clone();
        scoreboard.add_result(black_name, white_name, tally);
        self.repository.save(&scoreboard)?;
        self.scoreboard = scoreboard;
        self.recorded = true;
        info!(black_name, white_name, "result recorded");
        Ok(())
    }

    pub fn save_state(&self) -> Result<String, GameError> {
        save::encode(&self.state)
    }

    /// Replaces the whole game with a saved one. On error nothing changes.
    pub fn load_state(&mut self, text: &str) -> Result<(), GameError> {
        let state = save::decode(text).inspect_err(|err| warn!(%err, "save rejected"))?;

        self.state = state;
        self.recorded = false;
        info!(phase = ?self.phase(), active = ?self.state.active, "game loaded");
        self.emit(GameEvent::BoardUpdated {
            board: self.state.board,
        });
        self.emit(GameEvent::TurnChanged {
            active: self.state.active,
        });

        if !self.state.ended && self.state.board.is_full() {
            self.finish();
            return Ok(());
        }

        match self.phase() {
            Phase::Ended => {
                self.emit_game_ended();
                Ok(())
            }
            Phase::AwaitingPassAck => {
                self.emit(GameEvent::PassOccurred {
                    player: self.state.active.opponent(),
                });
                Ok(())
            }
            Phase::InProgress => {
                self.offer_turn(self.state.active);
                self.play_computer_turns()
            }
        }
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let tally = self.score();
        GameSnapshot {
            board: self.state.board.to_array().to_vec(),
            current_player: self.state.active,
            black_count: tally.black,
            white_count: tally.white,
            awaiting_pass_ack: self.phase() == Phase::AwaitingPassAck,
            is_game_over: self.phase() == Phase::Ended,
            consecutive_passes: self.state.consecutive_passes,
            ai_enabled: self.state.ai_enabled,
        }
    }

    /// Applies an already validated move, then checks fullness and the next player's turn.
    fn accept_move(&mut self, pos: Position) {
        let mover = self.state.active;
        self.state.board = apply_move_at(&self.state.board, mover, pos);
        debug!(?mover, row = pos.row, col = pos.col, "move accepted");
        self.emit(GameEvent::BoardUpdated {
            board: self.state.board,
        });

        if self.state.board.is_full() {
            self.finish();
            return;
        }

        self.offer_turn(mover.opponent());
    }

    /// Gives the turn to `next` if it has a legal move. Otherwise records a pass for `next`
    /// and leaves the turn with its opponent; two passes in a row end the game.
    /// Returns `true` when `next` had to pass.
    fn offer_turn(&mut self, next: Color) -> bool {
        if has_legal_move(&self.state.board, next) {
            self.state.consecutive_passes = 0;
            self.set_active(next);
            return false;
        }

        self.state.consecutive_passes += 1;
        if self.state.consecutive_passes >= 2 {
            debug!("both players are blocked");
            self.finish();
        } else {
            debug!(player = ?next, "pass");
            self.emit(GameEvent::PassOccurred { player: next });
            self.set_active(next.opponent());
        }
        true
    }

    fn play_computer_turns(&mut self) -> Result<(), GameError> {
        while self.phase() == Phase::InProgress && self.is_computer_turn() {
            let color = self.state.active;
            let choice = self
                .selector
                .select_move(&self.state.board, color, self.config.search_depth)
                .ok_or_else(|| GameError::InvalidAiMove("no move selected".to_string()))?;

            if !is_legal_at(&self.state.board, color, choice) {
                return Err(GameError::InvalidAiMove(format!(
                    "({}, {}) is not legal for {color:?}",
                    choice.row, choice.col
                )));
            }

            self.accept_move(choice);
        }
        Ok(())
    }

    fn set_active(&mut self, color: Color) {
        if self.state.active != color {
            self.state.active = color;
            self.emit(GameEvent::TurnChanged { active: color });
        }
    }

    fn finish(&mut self) {
        self.state.ended = true;
        self.emit_game_ended();
    }

    fn emit_game_ended(&mut self) {
        let tally = self.score();
        info!(black = tally.black, white = tally.white, "game ended");
        self.emit(GameEvent::GameEnded {
            tally,
            outcome: tally.outcome(),
        });
    }

    fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::FirstLegalMoveSelector;
    use crate::types::Cell;

    struct FixedMoveSelector {
        mv: Option<Position>,
    }

    impl MoveSelector for FixedMoveSelector {
        fn select_move(&self, _board: &Board, _color: Color, _depth: u8) -> Option<Position> {
            self.mv
        }
    }

    fn controller() -> GameController {
        GameController::with_defaults().unwrap()
    }

    fn controller_with(selector: Box<dyn MoveSelector>) -> GameController {
        GameController::new(
            GameConfig::default(),
            selector,
            Box::new(MemoryScoreRepository::new()),
        )
        .unwrap()
    }

    fn set_position(game: &mut GameController, board: Board, active: Color) {
        game.state.board = board;
        game.state.active = active;
        game.state.consecutive_passes = 0;
        game.state.ended = false;
        game.drain_events();
    }

    #[test]
    fn initial_state_is_correct() {
        let game = controller();
        let snapshot = game.snapshot();

        assert_eq!(game.phase(), Phase::InProgress);
        assert_eq!(snapshot.current_player, Color::Black);
        assert_eq!(snapshot.black_count, 2);
        assert_eq!(snapshot.white_count, 2);
        assert_eq!(snapshot.consecutive_passes, 0);
        assert!(!snapshot.is_game_over);
        assert_eq!(game.legal_moves().len(), 4);
    }

    #[test]
    fn accepted_move_switches_turn_and_reports_board() {
        let mut game = controller();

        game.submit_move(2, 3).unwrap();

        assert_eq!(game.state().active, Color::White);
        assert_eq!(game.score(), ScoreTally { black: 4, white: 1 });
        assert_eq!(
            game.drain_events(),
            vec![
                GameEvent::BoardUpdated {
                    board: *game.board()
                },
                GameEvent::TurnChanged {
                    active: Color::White
                },
            ]
        );
    }

    #[test]
    fn illegal_move_is_rejected_without_state_change() {
        let mut game = controller();
        let before = game.state().clone();

        let err = game.submit_move(0, 0).unwrap_err();

        assert_eq!(err, GameError::IllegalMove { row: 0, col: 0 });
        assert_eq!(game.state(), &before);
        assert_eq!(
            game.drain_events(),
            vec![GameEvent::MoveRejected { row: 0, col: 0 }]
        );
    }

    #[test]
    fn out_of_bounds_move_fails_loudly() {
        let mut game = controller();

        assert_eq!(
            game.submit_move(8, 1),
            Err(GameError::OutOfBounds { row: 8, col: 1 })
        );
        assert!(game.drain_events().is_empty());
    }

    #[test]
    fn pass_keeps_the_turn_with_the_player_who_moved() {
        let mut game = controller();
        // White takes (0,1); black is left with nothing to bracket.
        let board = Board::from_diagram([
            ".BW...BW",
            "........",
            "........",
            "........",
            "........",
            "........",
            "........",
            "........",
        ]);
        set_position(&mut game, board, Color::White);

        game.submit_move(0, 0).unwrap();

        assert_eq!(game.phase(), Phase::AwaitingPassAck);
        assert_eq!(game.state().active, Color::White);
        assert_eq!(game.state().consecutive_passes, 1);
        assert!(game.legal_moves().is_empty());
        assert_eq!(
            game.drain_events(),
            vec![
                GameEvent::BoardUpdated {
                    board: *game.board()
                },
                GameEvent::PassOccurred {
                    player: Color::Black
                },
            ]
        );

        // Moves are refused until the pass is acknowledged.
        assert!(game.submit_move(7, 7).is_err());

        game.acknowledge_pass().unwrap();

        assert_eq!(game.phase(), Phase::InProgress);
        assert_eq!(game.state().active, Color::White);
        assert_eq!(game.state().consecutive_passes, 0);
        assert_eq!(game.legal_moves(), vec![Position::new(0, 5).unwrap()]);
        assert!(game.drain_events().is_empty());
    }

    #[test]
    fn reloaded_pending_pass_names_the_blocked_player() {
        let mut game = controller();
        let board = Board::from_diagram([
            ".BW...BW",
            "........",
            "........",
            "........",
            "........",
            "........",
            "........",
            "........",
        ]);
        set_position(&mut game, board, Color::White);
        game.submit_move(0, 0).unwrap();
        let text = game.save_state().unwrap();

        let mut other = controller();
        other.load_state(&text).unwrap();

        assert_eq!(other.phase(), Phase::AwaitingPassAck);
        assert_eq!(other.state().active, Color::White);
        assert_eq!(
            other.drain_events().last(),
            Some(&GameEvent::PassOccurred {
                player: Color::Black
            })
        );
    }

    #[test]
    fn acknowledge_without_pending_pass_is_an_error() {
        let mut game = controller();

        assert_eq!(game.acknowledge_pass(), Err(GameError::NoPendingPass));
    }

    #[test]
    fn double_pass_ends_the_game_with_manual_tally() {
        let mut game = controller();
        let board = Board::from_diagram([
            "BBBB....",
            "BB......",
            "........",
            "........",
            "........",
            "........",
            "......WW",
            "......W.",
        ]);
        set_position(&mut game, board, Color::Black);

        assert_eq!(game.check_pass(), Ok(true));
        assert_eq!(game.phase(), Phase::AwaitingPassAck);
        assert_eq!(game.state().active, Color::White);
        assert_eq!(game.check_pass(), Ok(true));

        assert_eq!(game.phase(), Phase::Ended);
        assert_eq!(game.state().consecutive_passes, 2);
        assert!(game.state().ended);
        assert_eq!(game.score(), ScoreTally { black: 6, white: 3 });
        let result = game.result().unwrap();
        assert_eq!(result.winner, Some(Color::Black));
        assert!(game.drain_events().contains(&GameEvent::GameEnded {
            tally: ScoreTally { black: 6, white: 3 },
            outcome: Outcome::Winner(Color::Black),
        }));
    }

    #[test]
    fn acknowledging_a_dead_position_ends_the_game() {
        let mut game = controller();
        let board = Board::from_diagram([
            "BBB.....",
            "........",
            "........",
            "........",
            "........",
            "........",
            "........",
            ".....WWW",
        ]);
        set_position(&mut game, board, Color::Black);

        assert_eq!(game.check_pass(), Ok(true));
        game.acknowledge_pass().unwrap();

        assert_eq!(game.phase(), Phase::Ended);
        assert_eq!(game.result().unwrap().winner, None);
        assert_eq!(game.check_pass(), Ok(false));
    }

    #[test]
    fn check_pass_is_false_while_the_player_can_move() {
        let mut game = controller();

        assert_eq!(game.check_pass(), Ok(false));
        assert_eq!(game.phase(), Phase::InProgress);
        assert_eq!(game.state().active, Color::Black);
        assert!(game.drain_events().is_empty());
    }

    #[test]
    fn full_board_ends_the_game_immediately() {
        let mut game = controller_with(Box::new(FixedMoveSelector {
            mv: Position::new(0, 0).ok(),
        }));
        let mut cells = [[Cell::White; 8]; 8];
        cells[0][0] = Cell::Empty;
        cells[0][1] = Cell::Black;
        game.state.ai_enabled = true;
        set_position(&mut game, Board::from_cells(cells), Color::Black);
        game.state.active = Color::White;

        game.play_computer_turns().unwrap();

        assert_eq!(game.phase(), Phase::Ended);
        assert_eq!(game.score(), ScoreTally { black: 0, white: 64 });
        assert_eq!(game.result().unwrap().winner, Some(Color::White));
    }

    #[test]
    fn computer_replies_after_a_human_move() {
        let mut game = controller();
        game.start_new_game(true).unwrap();
        game.drain_events();

        game.submit_move(2, 3).unwrap();

        assert_eq!(game.state().active, Color::Black);
        assert_eq!(game.score().black + game.score().white, 6);
        let turns: Vec<_> = game
            .drain_events()
            .into_iter()
            .filter(|event| matches!(event, GameEvent::TurnChanged { .. }))
            .collect();
        assert_eq!(
            turns,
            vec![
                GameEvent::TurnChanged { active: Color::White },
                GameEvent::TurnChanged { active: Color::Black },
            ]
        );
    }

    #[test]
    fn human_cannot_move_for_the_computer() {
        let mut game = controller();
        game.start_new_game(true).unwrap();
        game.state.active = Color::White;

        assert!(matches!(game.submit_move(2, 4), Err(GameError::IllegalMove { .. })));
    }

    #[test]
    fn computer_playing_black_opens_the_game() {
        let config = GameConfig {
            computer_color: Color::Black,
            ..GameConfig::default()
        };
        let mut game = GameController::new(
            config,
            Box::new(FirstLegalMoveSelector),
            Box::new(MemoryScoreRepository::new()),
        )
        .unwrap();

        game.start_new_game(true).unwrap();

        assert_eq!(game.state().active, Color::White);
        assert_eq!(game.board().cell_at(2, 3), Ok(Cell::Black));
    }

    #[test]
    fn selector_returning_an_illegal_move_is_reported() {
        let mut game = controller_with(Box::new(FixedMoveSelector {
            mv: Position::new(0, 0).ok(),
        }));
        game.start_new_game(true).unwrap();

        let err = game.submit_move(2, 3).unwrap_err();

        assert!(matches!(err, GameError::InvalidAiMove(_)));
        assert_eq!(game.state().active, Color::White);
        assert_eq!(game.score(), ScoreTally { black: 4, white: 1 });
    }

    #[test]
    fn start_new_game_resets_everything() {
        let mut game = controller();
        game.submit_move(2, 3).unwrap();

        game.start_new_game(false).unwrap();

        assert_eq!(game.state(), &GameState::new(false));
        assert_eq!(game.phase(), Phase::InProgress);
    }

    #[test]
    fn save_and_load_reproduce_the_game() {
        let mut game = controller();
        game.submit_move(2, 3).unwrap();
        game.submit_move(2, 2).unwrap();
        let text = game.save_state().unwrap();
        let saved = game.state().clone();

        let mut other = controller();
        other.load_state(&text).unwrap();

        assert_eq!(other.state(), &saved);
        assert_eq!(other.board(), &saved.board);
        assert_eq!(other.state().active, saved.active);
        assert_eq!(other.state().consecutive_passes, saved.consecutive_passes);
    }

    #[test]
    fn rejected_load_leaves_the_game_untouched() {
        let mut game = controller();
        game.submit_move(2, 3).unwrap();
        let before = game.state().clone();
        game.drain_events();

        let err = game.load_state(r#"{"ai_enabled":false}"#).unwrap_err();

        assert!(matches!(err, GameError::InvalidSaveFormat(_)));
        assert_eq!(game.state(), &before);
        assert!(game.drain_events().is_empty());
    }

    #[test]
    fn loading_a_full_board_ends_the_game() {
        let mut game = controller();
        let text = serde_json::json!({
            "ai_enabled": false,
            "active_player": 0,
            "consecutive_passes": 1,
            "ended": false,
            "board": vec![vec!["white"; 8]; 8],
        })
        .to_string();

        game.load_state(&text).unwrap();

        assert_eq!(game.phase(), Phase::Ended);
        let result = game.result().unwrap();
        assert_eq!((result.black_count, result.white_count), (0, 64));
        assert_eq!(result.winner, Some(Color::White));
        assert!(matches!(
            game.drain_events().last(),
            Some(GameEvent::GameEnded { .. })
        ));
    }

    #[test]
    fn record_result_requires_a_finished_game() {
        let mut game = controller();

        assert_eq!(game.record_result("a", "b"), Err(GameError::GameNotOver));
        assert!(game.scoreboard().is_empty());
    }

    #[test]
    fn record_result_updates_and_saves_the_scoreboard() {
        let repository = MemoryScoreRepository::new();
        let mut game = GameController::new(
            GameConfig::default(),
            Box::new(AlphaBetaSelector),
            Box::new(repository.clone()),
        )
        .unwrap();
        let board = Board::from_diagram([
            "BBBBBBBB",
            "........",
            "........",
            "........",
            "........",
            "........",
            "........",
            "WW......",
        ]);
        set_position(&mut game, board, Color::White);
        game.state.ended = true;

        game.record_result("ala", "bob").unwrap();

        assert_eq!(game.scoreboard().total("ala"), Some(8));
        assert_eq!(game.scoreboard().total("bob"), Some(2));
        let stored = repository.load().unwrap();
        assert_eq!(&stored, game.scoreboard());
    }

    #[test]
    fn a_game_is_recorded_only_once() {
        let mut game = controller();
        let board = Board::from_diagram([
            "BBBBBBBB",
            "........",
            "........",
            "........",
            "........",
            "........",
            "........",
            "WW......",
        ]);
        set_position(&mut game, board, Color::White);
        game.state.ended = true;
        game.record_result("ala", "bob").unwrap();

        assert_eq!(
            game.record_result("ala", "cyd"),
            Err(GameError::AlreadyRecorded)
        );
        assert_eq!(game.scoreboard().total("ala"), Some(8));
        assert_eq!(game.scoreboard().total("cyd"), None);

        game.start_new_game(false).unwrap();
        set_position(&mut game, board, Color::White);
        game.state.ended = true;
        game.record_result("ala", "cyd").unwrap();

        assert_eq!(game.scoreboard().total("ala"), Some(16));
    }
}
