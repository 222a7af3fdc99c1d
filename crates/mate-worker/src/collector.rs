//! Collector: replay recorded games and store positions with a confirmed
//! forced mate for the side to move.
//!
//! Each position gets a quick time-bounded scan. Only when the scan reports a
//! mate is a depth-bounded confirmation search run, and only a confirmed
//! positive mate (side to move delivers it) is stored.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use chess_core::{to_fen, GameRecord, PgnGames};
use shakmaty::Chess;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::db;
use crate::engine::{Analyser, Analysis, Limit};
use crate::error::WorkerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectOptions {
    pub scan_limit: Limit,
    pub confirm_limit: Limit,
    pub progress_every: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectSummary {
    pub games: u64,
    /// Games skipped because their headers gave no usable start position
    pub invalid_games: u64,
    pub positions: u64,
    pub mates_found: u64,
    pub analysis_errors: u64,
}

impl fmt::Display for CollectSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Processed {} games, found {} mate positions.",
            self.games, self.mates_found
        )
    }
}

/// Scan then confirm a single position.
///
/// Returns the confirmed mate distance with the confirming analysis, or `None`
/// when either stage finds no mate for the side to move. Engine failures are
/// reported to the caller.
async fn confirmed_mate<E: Analyser>(
    engine: &mut E,
    position: &Chess,
    options: &CollectOptions,
    game_index: u64,
    ply: usize,
) -> Result<Option<(u32, Analysis)>, WorkerError> {
    let scan = engine.analyse(position, options.scan_limit).await.map_err(|e| {
        warn!(game = game_index, ply, error = %e, "Error analyzing position");
        e
    })?;
    let Some(flagged) = scan.score.mate() else {
        return Ok(None);
    };
    debug!(game = game_index, ply, mate = flagged, "Mate flagged, confirming");

    let deep = engine.analyse(position, options.confirm_limit).await.map_err(|e| {
        warn!(game = game_index, ply, error = %e, "Error in deep analysis");
        e
    })?;
    Ok(deep
        .score
        .mate()
        .filter(|n| *n > 0)
        .map(|n| (n.unsigned_abs(), deep)))
}

/// Replay one game, analysing the position after every move.
///
/// Analysis failures are counted and skipped; store failures abort.
pub async fn collect_game<E: Analyser>(
    engine: &mut E,
    pool: &SqlitePool,
    game: &GameRecord,
    game_index: u64,
    options: &CollectOptions,
    summary: &mut CollectSummary,
) -> Result<(), WorkerError> {
    for (i, step) in game.replay().enumerate() {
        let ply = i + 1;
        let position = match step {
            Ok(position) => position,
            Err(e) => {
                warn!(game = game_index, error = %e, "Stopping replay");
                break;
            }
        };
        summary.positions += 1;

        let (n, deep) = match confirmed_mate(engine, &position, options, game_index, ply).await {
            Ok(Some(confirmed)) => confirmed,
            Ok(None) => continue,
            Err(_) => {
                summary.analysis_errors += 1;
                continue;
            }
        };

        let fen = to_fen(&position);
        let id = db::insert_mate_position(pool, game.site.as_deref(), &fen, n).await?;
        summary.mates_found += 1;
        info!(
            game = game_index,
            ply,
            id,
            n,
            depth = ?deep.depth,
            best_move = ?deep.best_move,
            fen = %fen,
            "Mate position recorded"
        );
    }

    Ok(())
}

/// Scan every game of a PGN stream.
pub async fn collect_from_reader<E: Analyser, R: Read>(
    engine: &mut E,
    pool: &SqlitePool,
    reader: R,
    options: &CollectOptions,
    summary: &mut CollectSummary,
) -> Result<(), WorkerError> {
    let mut games = PgnGames::new(reader);

    while let Some(game) = games.next_game()? {
        summary.games += 1;
        let game_index = summary.games;

        match game {
            Ok(game) => collect_game(engine, pool, &game, game_index, options, summary).await?,
            Err(e) => {
                summary.invalid_games += 1;
                warn!(game = game_index, error = %e, "Skipping game");
            }
        }

        if game_index % options.progress_every == 0 {
            info!(
                games = summary.games,
                positions = summary.positions,
                mates = summary.mates_found,
                "Progress"
            );
        }
    }

    Ok(())
}

/// Scan PGN files in order. Game indices run across all files.
pub async fn collect_files<E: Analyser>(
    engine: &mut E,
    pool: &SqlitePool,
    paths: &[PathBuf],
    options: &CollectOptions,
) -> Result<CollectSummary, WorkerError> {
    let mut summary = CollectSummary::default();

    for path in paths {
        info!(path = %path.display(), "Scanning PGN file");
        let file = File::open(path).map_err(|source| WorkerError::OpenPgn {
            path: path.clone(),
            source,
        })?;
        collect_from_reader(engine, pool, file, options, &mut summary).await?;
    }

    Ok(summary)
}
