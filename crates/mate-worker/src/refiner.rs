//! Refiner: re-check every stored mate position with a stronger search and
//! update or remove it.

use std::fmt;

use indicatif::{ProgressBar, ProgressStyle};
use shakmaty::CastlingMode;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::db::{self, MatePosition};
use crate::engine::{Analyser, Limit, Score};
use crate::error::WorkerError;

/// What a refined score means for a stored row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    Unchanged,
    Updated { from: u32, to: u32 },
    Removed,
}

/// Decide the fate of a row holding `stored_n` given the refined score.
///
/// No mate removes the row. Mate 0 (side to move is already checkmated) is
/// also removed rather than stored as `n = 0`, since a stored distance is
/// always positive. Any other mate distance replaces the stored one by its
/// absolute value.
pub fn classify(stored_n: u32, score: Score) -> RowOutcome {
    match score.mate().map(i32::unsigned_abs) {
        None | Some(0) => RowOutcome::Removed,
        Some(n) if n != stored_n => RowOutcome::Updated {
            from: stored_n,
            to: n,
        },
        Some(_) => RowOutcome::Unchanged,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefineSummary {
    pub total: u64,
    pub updated: u64,
    pub removed: u64,
    pub failed: u64,
}

impl fmt::Display for RefineSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Processed {} puzzles: Updated {}, Removed {}.",
            self.total, self.updated, self.removed
        )
    }
}

/// Re-analyse one row and apply the outcome to the store.
///
/// Stored FENs are read in Chess960 mode, which also covers standard
/// positions, so rows collected from Chess960 games keep their castling
/// rights. An unparsable stored FEN is an error; an engine failure is
/// returned as well and left to the caller to skip.
pub async fn refine_row<E: Analyser>(
    engine: &mut E,
    pool: &SqlitePool,
    row: &MatePosition,
    limit: Limit,
) -> Result<RowOutcome, WorkerError> {
    let position = chess_core::from_fen(&row.fen, CastlingMode::Chess960)
        .map_err(|source| WorkerError::Position { id: row.id, source })?;

    let analysis = engine.analyse(&position, limit).await?;
    let outcome = classify(row.n, analysis.score);

    match outcome {
        RowOutcome::Removed => db::delete_mate_position(pool, row.id).await?,
        RowOutcome::Updated { to, .. } => db::update_mate_distance(pool, row.id, to).await?,
        RowOutcome::Unchanged => {}
    }

    Ok(outcome)
}

fn progress_bar(len: u64) -> ProgressBar {
    let progress = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} puzzles ({per_sec}) {msg}")
    {
        progress.set_style(style);
    }
    progress
}

/// Refine all rows present when the pass starts.
pub async fn refine_all<E: Analyser>(
    engine: &mut E,
    pool: &SqlitePool,
    limit: Limit,
) -> Result<RefineSummary, WorkerError> {
    let rows = db::fetch_all(pool).await?;
    let mut summary = RefineSummary {
        total: rows.len() as u64,
        ..Default::default()
    };

    let progress = progress_bar(summary.total);

    for row in &rows {
        let result = refine_row(engine, pool, row, limit).await;
        progress.inc(1);

        match result {
            Ok(RowOutcome::Removed) => {
                summary.removed += 1;
                progress.suspend(|| info!(id = row.id, "Removed puzzle: no mate found"));
            }
            Ok(RowOutcome::Updated { from, to }) => {
                summary.updated += 1;
                progress.suspend(|| info!(id = row.id, from, to, "Updated puzzle"));
            }
            Ok(RowOutcome::Unchanged) => {}
            Err(WorkerError::Engine(e)) => {
                summary.failed += 1;
                progress.suspend(|| warn!(id = row.id, error = %e, "Error analyzing puzzle"));
            }
            Err(e) => {
                progress.abandon();
                return Err(e);
            }
        }
    }

    progress.finish_and_clear();
    Ok(summary)
}
