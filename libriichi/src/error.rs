use crate::mjai::OutOfBoundError;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BotError>;

/// Errors surfaced by [`Bot`](crate::mjai::Bot) and
/// [`BotRegistry`](crate::registry::BotRegistry).
///
/// Every error is terminal for the failed call only, the bot stays at its
/// last good state.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("malformed input: {0}")]
    MalformedInput(#[from] serde_json::Error),

    #[error("malformed input: {0}")]
    OutOfBound(#[from] OutOfBoundError),

    #[error("inconsistent state: {0:#}")]
    InconsistentState(anyhow::Error),

    #[error("illegal action requested: index {index}")]
    IllegalActionRequested { index: usize },

    #[error("unsupported obs version {0}")]
    UnsupportedVersion(u32),

    #[error("invalid player id {0}")]
    InvalidPlayerId(u8),

    #[error("buffer size mismatch: expected {expected}, got {actual}")]
    BufferSize { expected: usize, actual: usize },

    #[error("unknown bot handle {0}")]
    UnknownHandle(u64),
}

impl BotError {
    /// Whether the error is about the input text itself rather than the game
    /// it describes.
    #[must_use]
    pub const fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedInput(_) | Self::OutOfBound(_))
    }
}
