//! UCI engine session (async I/O)

use std::time::Duration;

use shakmaty::Chess;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::debug;

use crate::error::WorkerError;

/// Bound on a single search. Always has a time bound, a depth bound, or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    time: Option<Duration>,
    depth: Option<u32>,
}

impl Limit {
    pub fn time(time: Duration) -> Self {
        Self {
            time: Some(time),
            depth: None,
        }
    }

    pub fn depth(depth: u32) -> Self {
        Self {
            time: None,
            depth: Some(depth),
        }
    }

    /// Search stops at whichever bound is hit first.
    pub fn time_and_depth(time: Duration, depth: u32) -> Self {
        Self {
            time: Some(time),
            depth: Some(depth),
        }
    }

    pub fn depth_limit(&self) -> Option<u32> {
        self.depth
    }

    /// Render as a UCI `go` command.
    pub fn go_command(&self) -> String {
        let mut cmd = String::from("go");
        if let Some(depth) = self.depth {
            cmd.push_str(&format!(" depth {depth}"));
        }
        if let Some(time) = self.time {
            let millis = time.as_millis().max(1);
            cmd.push_str(&format!(" movetime {millis}"));
        }
        cmd
    }
}

/// Engine score, from the point of view of the side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Cp(i32),
    /// Mate in N moves (positive = side to move mates, negative = gets mated)
    Mate(i32),
}

impl Score {
    pub fn mate(&self) -> Option<i32> {
        match self {
            Score::Mate(n) => Some(*n),
            Score::Cp(_) => None,
        }
    }
}

/// Result of a single position analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub score: Score,
    /// Deepest completed iteration reported by the engine
    pub depth: Option<u32>,
    /// Best move in UCI notation, `None` when the engine had no legal move
    pub best_move: Option<String>,
}

/// Anything that can evaluate a position under a search limit.
#[allow(async_fn_in_trait)]
pub trait Analyser {
    async fn analyse(&mut self, position: &Chess, limit: Limit) -> Result<Analysis, WorkerError>;
}

/// Resource options sent to the engine before the first search.
/// `None` keeps the engine's own default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineOptions {
    pub threads: Option<u32>,
    pub hash_mb: Option<u32>,
}

/// Long-lived UCI engine process
pub struct UciEngine {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl UciEngine {
    /// Spawn the engine and complete the UCI handshake
    pub async fn spawn(path: &str, options: &EngineOptions) -> Result<Self, WorkerError> {
        let mut process = Command::new(path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| WorkerError::Engine(format!("Failed to spawn engine {path}: {e}")))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| WorkerError::Engine("Engine stdin not captured".into()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| WorkerError::Engine("Engine stdout not captured".into()))?;

        let mut engine = Self {
            process,
            stdin,
            stdout: BufReader::new(stdout),
        };

        engine.send("uci").await?;
        engine.wait_for("uciok").await?;

        if let Some(threads) = options.threads {
            engine.send(&format!("setoption name Threads value {threads}")).await?;
        }
        if let Some(hash) = options.hash_mb {
            engine.send(&format!("setoption name Hash value {hash}")).await?;
        }
        engine.send("isready").await?;
        engine.wait_for("readyok").await?;

        Ok(engine)
    }

    async fn send(&mut self, cmd: &str) -> Result<(), WorkerError> {
        debug!(cmd, "engine <");
        self.stdin
            .write_all(format!("{cmd}\n").as_bytes())
            .await
            .map_err(|e| WorkerError::Engine(format!("Failed to write to engine: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| WorkerError::Engine(format!("Failed to flush engine stdin: {e}")))?;
        Ok(())
    }

    /// Next non-empty output line. End of stream means the engine is gone.
    async fn next_line(&mut self) -> Result<String, WorkerError> {
        let mut line = String::new();
        loop {
            line.clear();
            let read = self
                .stdout
                .read_line(&mut line)
                .await
                .map_err(|e| WorkerError::Engine(format!("Failed to read from engine: {e}")))?;
            if read == 0 {
                return Err(WorkerError::Engine("Engine closed its output".into()));
            }
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                debug!(line = trimmed, "engine >");
                return Ok(trimmed.to_string());
            }
        }
    }

    async fn wait_for(&mut self, expected: &str) -> Result<(), WorkerError> {
        while self.next_line().await? != expected {}
        Ok(())
    }

    /// Send `quit` and wait for the process to exit
    pub async fn quit(&mut self) {
        let _ = self.send("quit").await;
        let _ = self.process.wait().await;
    }
}

impl Analyser for UciEngine {
    async fn analyse(&mut self, position: &Chess, limit: Limit) -> Result<Analysis, WorkerError> {
        let fen = chess_core::to_fen(position);
        self.send(&format!("position fen {fen}")).await?;
        self.send(&limit.go_command()).await?;

        let mut score = None;
        let mut depth = None;
        let best_move;

        loop {
            let line = self.next_line().await?;
            if line.starts_with("info") {
                if let Some(s) = parse_score(&line) {
                    score = Some(s);
                    depth = parse_depth(&line).or(depth);
                }
            } else if line.starts_with("bestmove") {
                best_move = parse_best_move(&line);
                break;
            }
        }

        let score =
            score.ok_or_else(|| WorkerError::Engine(format!("No score reported for {fen}")))?;
        Ok(Analysis {
            score,
            depth,
            best_move,
        })
    }
}

impl Drop for UciEngine {
    fn drop(&mut self) {
        // Best-effort synchronous kill in drop
        let _ = self.process.start_kill();
    }
}

/// Token following `key` in an info line
fn field_after<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let mut parts = line.split_whitespace();
    parts.find(|part| *part == key)?;
    parts.next()
}

/// Exact score from an info line. Bound-only scores are ignored.
fn parse_score(line: &str) -> Option<Score> {
    let mut parts = line.split_whitespace();
    parts.find(|part| *part == "score")?;
    let kind = parts.next()?;
    let value: i32 = parts.next()?.parse().ok()?;
    if matches!(parts.next(), Some("lowerbound") | Some("upperbound")) {
        return None;
    }
    match kind {
        "cp" => Some(Score::Cp(value)),
        "mate" => Some(Score::Mate(value)),
        _ => None,
    }
}

fn parse_depth(line: &str) -> Option<u32> {
    field_after(line, "depth")?.parse().ok()
}

fn parse_best_move(line: &str) -> Option<String> {
    field_after(line, "bestmove")
        .filter(|mv| *mv != "(none)")
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cp() {
        let line = "info depth 20 seldepth 25 multipv 1 score cp 35 nodes 100000 pv e2e4";
        assert_eq!(parse_score(line), Some(Score::Cp(35)));
        assert_eq!(parse_depth(line), Some(20));
    }

    #[test]
    fn test_parse_mate() {
        let line = "info depth 20 score mate 3 nodes 100000 pv e2e4";
        assert_eq!(parse_score(line), Some(Score::Mate(3)));

        let line = "info depth 31 score mate -2 nodes 100000 pv g8h8";
        assert_eq!(parse_score(line), Some(Score::Mate(-2)));
    }

    #[test]
    fn test_checkmated_side_reports_mate_zero() {
        assert_eq!(parse_score("info depth 0 score mate 0"), Some(Score::Mate(0)));
        assert_eq!(parse_best_move("bestmove (none)"), None);
    }

    #[test]
    fn test_bound_scores_ignored() {
        assert_eq!(parse_score("info depth 18 score cp 120 lowerbound nodes 5 pv e2e4"), None);
        assert_eq!(parse_score("info depth 18 score mate 4 upperbound pv e2e4"), None);
        assert_eq!(parse_score("info string NNUE evaluation enabled"), None);
    }

    #[test]
    fn test_parse_best_move() {
        assert_eq!(parse_best_move("bestmove e2e4 ponder e7e5"), Some("e2e4".to_string()));
    }

    #[test]
    fn test_go_command() {
        assert_eq!(Limit::time(Duration::from_millis(100)).go_command(), "go movetime 100");
        assert_eq!(Limit::depth(30).go_command(), "go depth 30");
        assert_eq!(
            Limit::time_and_depth(Duration::from_secs(60), 75).go_command(),
            "go depth 75 movetime 60000"
        );
        // Sub-millisecond budgets still search
        assert_eq!(Limit::time(Duration::from_micros(10)).go_command(), "go movetime 1");
    }

    #[test]
    fn test_score_mate() {
        assert_eq!(Score::Mate(-4).mate(), Some(-4));
        assert_eq!(Score::Cp(900).mate(), None);
    }
}
