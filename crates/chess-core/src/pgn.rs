//! Streaming PGN reader producing one `GameRecord` per game.
//!
//! Only the mainline is kept; variations, comments and NAGs are skipped.

use std::io::{self, BufReader, Read};
use std::ops::ControlFlow;

use pgn_reader::{RawTag, Reader, SanPlus, Skip, Visitor};
use shakmaty::{CastlingMode, Chess};

use crate::error::GameError;
use crate::game_record::GameRecord;
use crate::position::from_fen;

/// Headers that decide provenance and the starting position.
#[derive(Debug, Default)]
struct GameTags {
    site: Option<String>,
    fen: Option<String>,
    variant: Option<String>,
}

impl GameTags {
    fn castling_mode(&self) -> Result<CastlingMode, GameError> {
        let Some(variant) = self.variant.as_deref() else {
            return Ok(CastlingMode::Standard);
        };
        match variant.to_ascii_lowercase().as_str() {
            "" | "standard" | "chess" | "from position" | "fromposition" => {
                Ok(CastlingMode::Standard)
            }
            "chess960" | "chess 960" | "fischerandom" | "fischer random" => {
                Ok(CastlingMode::Chess960)
            }
            _ => Err(GameError::UnsupportedVariant(variant.to_string())),
        }
    }

    fn start_position(&self) -> Result<Chess, GameError> {
        let mode = self.castling_mode()?;
        match self.fen.as_deref() {
            Some(fen) => from_fen(fen, mode),
            None => Ok(Chess::default()),
        }
    }
}

/// Normalize a `Site` value: unknown placeholders become `None`.
fn site_value(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "?" {
        None
    } else {
        Some(trimmed.to_string())
    }
}

struct GameRecordVisitor;

impl Visitor for GameRecordVisitor {
    type Tags = GameTags;
    type Movetext = GameRecord;
    type Output = Result<GameRecord, GameError>;

    fn begin_tags(&mut self) -> ControlFlow<Self::Output, GameTags> {
        ControlFlow::Continue(GameTags::default())
    }

    fn tag(
        &mut self,
        tags: &mut GameTags,
        name: &[u8],
        value: RawTag<'_>,
    ) -> ControlFlow<Self::Output> {
        match name {
            b"Site" => tags.site = site_value(&value.decode_utf8_lossy()),
            b"FEN" => tags.fen = Some(value.decode_utf8_lossy().into_owned()),
            b"Variant" => tags.variant = Some(value.decode_utf8_lossy().trim().to_string()),
            _ => {}
        }
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, tags: GameTags) -> ControlFlow<Self::Output, GameRecord> {
        match tags.start_position() {
            Ok(start) => ControlFlow::Continue(GameRecord {
                site: tags.site,
                start,
                moves: Vec::new(),
            }),
            Err(e) => ControlFlow::Break(Err(e)),
        }
    }

    fn begin_variation(&mut self, _game: &mut GameRecord) -> ControlFlow<Self::Output, Skip> {
        ControlFlow::Continue(Skip(true))
    }

    fn san(&mut self, game: &mut GameRecord, san_plus: SanPlus) -> ControlFlow<Self::Output> {
        game.moves.push(san_plus.san);
        ControlFlow::Continue(())
    }

    fn end_game(&mut self, game: GameRecord) -> Self::Output {
        Ok(game)
    }
}

/// Games read one at a time from a PGN stream.
///
/// The outer `io::Result` is a failure of the stream itself; the inner
/// `Result` is a game whose headers could not be turned into a position.
pub struct PgnGames<R: Read> {
    reader: Reader<BufReader<R>>,
    visitor: GameRecordVisitor,
}

impl<R: Read> PgnGames<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: Reader::new(BufReader::new(reader)),
            visitor: GameRecordVisitor,
        }
    }

    pub fn next_game(&mut self) -> io::Result<Option<Result<GameRecord, GameError>>> {
        self.reader.read_game(&mut self.visitor)
    }
}

impl<R: Read> Iterator for PgnGames<R> {
    type Item = io::Result<Result<GameRecord, GameError>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_game().transpose()
    }
}
