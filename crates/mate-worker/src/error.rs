//! Worker error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Invalid stored position for row {id}: {source}")]
    Position {
        id: i64,
        #[source]
        source: chess_core::GameError,
    },

    #[error("Failed to open {}: {source}", .path.display())]
    OpenPgn {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid PGN pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}
