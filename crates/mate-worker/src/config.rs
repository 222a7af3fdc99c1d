//! Command-line configuration for the two binaries.
//!
//! Engine and database paths fall back to `STOCKFISH_PATH` / `MATE_DB_PATH`,
//! which may also come from a `.env` file.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::collector::CollectOptions;
use crate::engine::{EngineOptions, Limit};
use crate::error::WorkerError;

const DEFAULT_ENGINE_PATH: &str = "/usr/local/bin/stockfish";
const DEFAULT_DB_PATH: &str = "puzzles.db";

fn seconds(value: f64) -> Result<Duration, WorkerError> {
    let invalid = || {
        WorkerError::Config(format!(
            "time limit must be a positive number of seconds, got {value}"
        ))
    };
    if value <= 0.0 {
        return Err(invalid());
    }
    Duration::try_from_secs_f64(value).map_err(|_| invalid())
}

#[derive(Parser, Debug, Clone)]
#[command(author, version)]
#[command(about = "Search PGN games for forced-mate positions using a UCI engine.")]
pub struct CollectArgs {
    /// PGN files to scan. Glob patterns are expanded.
    #[arg(long = "pgn", default_value = "lichess_games.pgn", num_args = 1..)]
    pub pgn: Vec<String>,

    /// Path to the UCI engine executable.
    #[arg(long, env = "STOCKFISH_PATH", default_value = DEFAULT_ENGINE_PATH)]
    pub engine: String,

    /// Scan time per position in seconds.
    #[arg(long, default_value_t = 0.1)]
    pub time: f64,

    /// Depth of the confirmation search once a mate is flagged.
    #[arg(long, default_value_t = 30)]
    pub confirm_depth: u32,

    /// Engine worker threads (engine default when omitted).
    #[arg(long)]
    pub threads: Option<u32>,

    /// Engine hash size in MB (engine default when omitted).
    #[arg(long)]
    pub hash: Option<u32>,

    /// Path to the SQLite database.
    #[arg(long, env = "MATE_DB_PATH", default_value = DEFAULT_DB_PATH)]
    pub db: PathBuf,

    /// Log progress every N games.
    #[arg(long, default_value_t = 100)]
    pub progress_every: u64,
}

impl CollectArgs {
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            threads: self.threads,
            hash_mb: self.hash,
        }
    }

    pub fn collect_options(&self) -> Result<CollectOptions, WorkerError> {
        Ok(CollectOptions {
            scan_limit: Limit::time(seconds(self.time)?),
            confirm_limit: Limit::depth(self.confirm_depth),
            progress_every: self.progress_every.max(1),
        })
    }

    /// Expand the `--pgn` arguments into concrete files, in argument order.
    /// A plain path that matches nothing is kept so opening it reports the error.
    pub fn pgn_paths(&self) -> Result<Vec<PathBuf>, WorkerError> {
        let mut paths = Vec::new();
        for pattern in &self.pgn {
            let matched: Vec<PathBuf> = glob::glob(pattern)?.filter_map(|p| p.ok()).collect();
            if matched.is_empty() {
                paths.push(PathBuf::from(pattern));
            } else {
                paths.extend(matched);
            }
        }
        Ok(paths)
    }
}

#[derive(Parser, Debug, Clone)]
#[command(author, version)]
#[command(about = "Update stored mate positions with deeper analysis.")]
pub struct RefineArgs {
    /// Path to the UCI engine executable.
    #[arg(long, env = "STOCKFISH_PATH", default_value = DEFAULT_ENGINE_PATH)]
    pub engine: String,

    /// Time limit per position in seconds.
    #[arg(long, default_value_t = 60.0)]
    pub time: f64,

    /// Depth limit per position.
    #[arg(long, default_value_t = 75)]
    pub depth: u32,

    /// Engine worker threads.
    #[arg(long, default_value_t = 10)]
    pub threads: u32,

    /// Engine hash size in MB.
    #[arg(long, default_value_t = 8192)]
    pub hash: u32,

    /// Path to the SQLite database.
    #[arg(long, env = "MATE_DB_PATH", default_value = DEFAULT_DB_PATH)]
    pub db: PathBuf,
}

impl RefineArgs {
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            threads: Some(self.threads),
            hash_mb: Some(self.hash),
        }
    }

    pub fn limit(&self) -> Result<Limit, WorkerError> {
        Ok(Limit::time_and_depth(seconds(self.time)?, self.depth))
    }
}
