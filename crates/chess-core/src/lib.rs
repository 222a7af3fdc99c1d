//! Game records and board replay shared by the mate-finding tools.

pub mod error;
pub mod game_record;
pub mod pgn;
pub mod position;

pub use error::GameError;
pub use game_record::{GameRecord, Replay};
pub use pgn::PgnGames;
pub use position::{from_fen, to_fen};
