use thiserror::Error;

/// Errors raised by the game engine and controller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    /// Coordinate outside the 8x8 grid. Never clamped.
    #[error("position out of bounds: ({row}, {col})")]
    OutOfBounds { row: usize, col: usize },

    /// Expected outcome of a bad click; state is left untouched.
    #[error("illegal move at ({row}, {col})")]
    IllegalMove { row: u8, col: u8 },

    #[error("invalid save format: {0}")]
    InvalidSaveFormat(String),

    #[error("the game is not over")]
    GameNotOver,

    #[error("this game's result is already on the scoreboard")]
    AlreadyRecorded,

    #[error("no pass is pending")]
    NoPendingPass,

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("move selector returned an unusable move: {0}")]
    InvalidAiMove(String),

    #[error(transparent)]
    Scoreboard(#[from] ScoreboardError),
}

/// Errors from decoding or persisting the scoreboard.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScoreboardError {
    #[error("scoreboard data too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },

    #[error("invalid scoreboard magic (expected RVSB)")]
    BadMagic,

    #[error("unsupported scoreboard version: expected {expected}, got {actual}")]
    UnsupportedVersion { expected: u32, actual: u32 },

    #[error("CRC32 mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("unexpected EOF while reading {0}")]
    Truncated(&'static str),

    #[error("scoreboard entry #{0} has a non UTF-8 name")]
    InvalidUtf8(usize),

    #[error("scoreboard payload has trailing bytes")]
    TrailingBytes,

    #[error("scoreboard name too long: {0} bytes")]
    NameTooLong(usize),

    #[error("score repository failure: {0}")]
    Repository(String),
}
