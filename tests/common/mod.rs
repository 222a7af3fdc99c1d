#![allow(dead_code)]

use std::time::Duration;

use chess_core::{to_fen, GameRecord};
use mate_worker::collector::CollectOptions;
use mate_worker::{db, Analyser, Analysis, Limit, Score, WorkerError};
use shakmaty::Chess;
use sqlx::SqlitePool;
use tempfile::TempDir;

/// Engine stand-in answering from a closure over (FEN, limit).
pub struct ScriptedEngine<F> {
    script: F,
    pub calls: Vec<(String, Limit)>,
}

impl<F> ScriptedEngine<F>
where
    F: FnMut(&str, Limit) -> Result<Score, WorkerError>,
{
    pub fn new(script: F) -> Self {
        Self {
            script,
            calls: Vec::new(),
        }
    }

    /// Number of depth-bounded (confirmation) searches requested.
    pub fn confirm_calls(&self) -> usize {
        self.calls
            .iter()
            .filter(|(_, limit)| limit.depth_limit().is_some())
            .count()
    }
}

impl<F> Analyser for ScriptedEngine<F>
where
    F: FnMut(&str, Limit) -> Result<Score, WorkerError>,
{
    async fn analyse(&mut self, position: &Chess, limit: Limit) -> Result<Analysis, WorkerError> {
        let fen = to_fen(position);
        self.calls.push((fen.clone(), limit));
        let score = (self.script)(&fen, limit)?;
        Ok(Analysis {
            score,
            depth: limit.depth_limit(),
            best_move: None,
        })
    }
}

/// True for the collector's confirmation search.
pub fn is_confirm(limit: Limit) -> bool {
    limit.depth_limit().is_some()
}

pub fn collect_options() -> CollectOptions {
    CollectOptions {
        scan_limit: Limit::time(Duration::from_millis(100)),
        confirm_limit: Limit::depth(30),
        progress_every: 1,
    }
}

/// Fresh database file in its own temp dir. Keep the dir alive for the test.
pub async fn temp_db() -> (TempDir, SqlitePool) {
    let dir = tempfile::tempdir().unwrap();
    let pool = db::connect(&dir.path().join("puzzles.db")).await.unwrap();
    (dir, pool)
}

/// FEN after each move of a game played from the standard start.
pub fn fens_after(sans: &[&str]) -> Vec<String> {
    GameRecord::from_san_moves(None, Chess::default(), sans)
        .unwrap()
        .replay()
        .map(|p| to_fen(&p.unwrap()))
        .collect()
}

pub fn engine_failure() -> WorkerError {
    WorkerError::Engine("Engine closed its output".into())
}
