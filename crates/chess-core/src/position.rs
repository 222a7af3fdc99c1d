//! FEN helpers around `shakmaty::Chess`.

use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, EnPassantMode};

use crate::error::GameError;

/// Render the full FEN of a position (placement, side to move, castling,
/// en passant, clocks). En passant squares are only written when a legal
/// capture exists.
pub fn to_fen(pos: &Chess) -> String {
    Fen::from_position(pos, EnPassantMode::Legal).to_string()
}

/// Parse a FEN into a playable position.
pub fn from_fen(fen: &str, mode: CastlingMode) -> Result<Chess, GameError> {
    let parsed: Fen = fen
        .trim()
        .parse()
        .map_err(|e| GameError::InvalidFen(fen.to_string(), format!("{e}")))?;
    parsed
        .into_position::<Chess>(mode)
        .map_err(|e| GameError::InvalidFen(fen.to_string(), format!("{e}")))
}
