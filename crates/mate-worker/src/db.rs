//! SQLite store for mate positions.
//!
//! Every write runs in its own implicit transaction, so each insert, update
//! or delete is committed before the call returns.

use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::error::WorkerError;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS mate_positions (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    game_url TEXT,
    fen      TEXT,
    n        INTEGER
);
"#;

/// A stored mate position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatePosition {
    pub id: i64,
    pub game_url: Option<String>,
    pub fen: String,
    /// Moves to mate for the side to move
    pub n: u32,
}

/// Open (creating if missing) the database file and make sure the table exists.
pub async fn connect(path: &Path) -> Result<SqlitePool, WorkerError> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);

    // Single writer
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), WorkerError> {
    sqlx::raw_sql(SCHEMA_SQL).execute(pool).await?;
    Ok(())
}

/// Insert a confirmed mate position, returning its id
pub async fn insert_mate_position(
    pool: &SqlitePool,
    game_url: Option<&str>,
    fen: &str,
    n: u32,
) -> Result<i64, WorkerError> {
    let result = sqlx::query("INSERT INTO mate_positions (game_url, fen, n) VALUES (?, ?, ?)")
        .bind(game_url)
        .bind(fen)
        .bind(n)
        .execute(pool)
        .await?;

    Ok(result.last_insert_rowid())
}

pub async fn update_mate_distance(pool: &SqlitePool, id: i64, n: u32) -> Result<(), WorkerError> {
    sqlx::query("UPDATE mate_positions SET n = ? WHERE id = ?")
        .bind(n)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete_mate_position(pool: &SqlitePool, id: i64) -> Result<(), WorkerError> {
    sqlx::query("DELETE FROM mate_positions WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Fetch every stored row, oldest first
pub async fn fetch_all(pool: &SqlitePool) -> Result<Vec<MatePosition>, WorkerError> {
    let rows: Vec<(i64, Option<String>, String, u32)> =
        sqlx::query_as("SELECT id, game_url, fen, n FROM mate_positions ORDER BY id")
            .fetch_all(pool)
            .await?;

    Ok(rows
        .into_iter()
        .map(|(id, game_url, fen, n)| MatePosition {
            id,
            game_url,
            fen,
            n,
        })
        .collect())
}
