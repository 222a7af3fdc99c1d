use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid FEN {0:?}: {1}")]
    InvalidFen(String, String),

    #[error("Unsupported variant: {0}")]
    UnsupportedVariant(String),

    #[error("Illegal move {san} at ply {ply}: {reason}")]
    IllegalMove {
        ply: usize,
        san: String,
        reason: String,
    },
}
