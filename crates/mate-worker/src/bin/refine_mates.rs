//! Re-analyse stored mate positions with a deeper search, updating mate
//! distances and removing positions that no longer hold a forced mate.
//!
//! Usage:
//!   cargo run -p mate-worker --bin refine-mates -- --depth 75 --time 60 --db puzzles.db

use clap::Parser;
use tracing::info;

use mate_worker::config::RefineArgs;
use mate_worker::db;
use mate_worker::refiner;
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
    let args = RefineArgs::parse();

    let limit = args.limit()?;
    let pool = db::connect(&args.db).await?;

    let mut engine = UciEngine::spawn(&args.engine, &args.engine_options()).await?;
    info!(
        engine = %args.engine,
        threads = args.threads,
        hash_mb = args.hash,
        "Engine ready"
    );

    let result = refiner::refine_all(&mut engine, &pool, limit).await;
    engine.quit().await;
    pool.close().await;

    let summary = result?;
    info!(failed = summary.failed, "Refine complete");
    println!("{summary}");
    Ok(())
}
