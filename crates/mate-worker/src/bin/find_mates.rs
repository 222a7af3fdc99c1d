//! Scan PGN games for forced-mate positions and store the confirmed ones.
//!
//! Usage:
//!   cargo run -p mate-worker --bin find-mates -- --pgn 'games/*.pgn' --engine ./stockfish
//!
//! STOCKFISH_PATH and MATE_DB_PATH may be set in the environment or a .env file.

use clap::Parser;
use tracing::info;

use mate_worker::collector;
use mate_worker::config::CollectArgs;
use mate_worker::db;
use mate_worker::UciEngine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let _ = dotenvy::dotenv();
    let args = CollectArgs::parse();

    let options = args.collect_options()?;
    let paths = args.pgn_paths()?;
    let pool = db::connect(&args.db).await?;
    info!(db = %args.db.display(), files = paths.len(), "Database ready");

    let mut engine = UciEngine::spawn(&args.engine, &args.engine_options()).await?;
    info!(engine = %args.engine, "Engine ready");

    let result = collector::collect_files(&mut engine, &pool, &paths, &options).await;
    engine.quit().await;
    pool.close().await;

    let summary = result?;
    info!(
        games = summary.games,
        invalid_games = summary.invalid_games,
        positions = summary.positions,
        mates = summary.mates_found,
        analysis_errors = summary.analysis_errors,
        "Scan complete"
    );
    println!("{summary}");
    Ok(())
}
