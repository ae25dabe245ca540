use tracing::debug;
use web_time::Instant;

use crate::board::Board;
use crate::rules::{apply_move_at, legal_moves};
use crate::types::{Color, Position};

const MIN_SCORE: i32 = i32::MIN;
const MAX_SCORE: i32 = i32::MAX;

/// Result of a search call.
///
/// `board` is the position after `choice`; at a leaf there is no choice and `board` is the
/// evaluated input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOutcome {
    pub score: i32,
    pub board: Board,
    pub choice: Option<Position>,
}

/// Fixed-depth minimax with alpha-beta pruning.
///
/// The evaluation perspective is fixed at construction and never follows the side to move
/// down the tree: nodes where `perspective` moves maximize, the others minimize.
pub struct Searcher {
    perspective: Color,
    nodes: u64,
}

impl Searcher {
    pub fn new(perspective: Color) -> Self {
        Self {
            perspective,
            nodes: 0,
        }
    }

    /// Nodes visited since construction.
    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    /// Searches `depth` plies with `to_move` on move.
    pub fn search(&mut self, board: &Board, to_move: Color, depth: u8) -> SearchOutcome {
        self.alphabeta(board, to_move, depth, MIN_SCORE, MAX_SCORE)
    }

    fn alphabeta(
        &mut self,
        board: &Board,
        to_move: Color,
        depth: u8,
        mut alpha: i32,
        mut beta: i32,
    ) -> SearchOutcome {
        self.nodes += 1;

        let children = successors(board, to_move);
        if depth == 0 || children.is_empty() {
            return SearchOutcome {
                score: evaluate(board, self.perspective),
                board: *board,
                choice: None,
            };
        }

        let maximizing = to_move == self.perspective;
        let mut best: Option<(i32, Position, Board)> = None;

        for (mv, next) in children {
            let score = self
                .alphabeta(&next, to_move.opponent(), depth - 1, alpha, beta)
                .score;

            // Strict comparison keeps the first generated move among equal scores.
            let improves = match best {
                None => true,
                Some((best_score, _, _)) if maximizing => score > best_score,
                Some((best_score, _, _)) => score < best_score,
            };
            if improves {
                best = Some((score, mv, next));
            }

            let best_score = best.map_or(score, |(s, _, _)| s);
            if maximizing {
                alpha = alpha.max(best_score);
            } else {
                beta = beta.min(best_score);
            }
            if beta <= alpha {
                break;
            }
        }

        match best {
            Some((score, mv, next)) => SearchOutcome {
                score,
                board: next,
                choice: Some(mv),
            },
            None => SearchOutcome {
                score: evaluate(board, self.perspective),
                board: *board,
                choice: None,
            },
        }
    }
}

/// Chooses a move for `mover` by searching `depth` plies.
///
/// Caller contract: `depth >= 1`, otherwise the outcome is a leaf and carries no choice.
pub fn best_move(board: &Board, mover: Color, depth: u8) -> SearchOutcome {
    let started = Instant::now();
    let mut searcher = Searcher::new(mover);
    let outcome = searcher.search(board, mover, depth);

    debug!(
        ?mover,
        depth,
        nodes = searcher.nodes(),
        score = outcome.score,
        choice = ?outcome.choice,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "search finished"
    );
    outcome
}

/// Material heuristic: `perspective` disks minus opponent disks.
pub fn evaluate(board: &Board, perspective: Color) -> i32 {
    let tally = board.tally();
    tally.of(perspective) as i32 - tally.of(perspective.opponent()) as i32
}

/// Legal moves and their resulting boards in row-major generation order.
fn successors(board: &Board, to_move: Color) -> Vec<(Position, Board)> {
    legal_moves(board, to_move)
        .into_iter()
        .map(|mv| (mv, apply_move_at(board, to_move, mv)))
        .collect()
}
