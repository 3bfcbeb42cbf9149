//! UCI engine wrapper (async I/O).
//!
//! Spawns an engine process, drives the UCI handshake and exposes a
//! restartable `go infinite` search. The caller reads `info` records
//! one at a time and interrupts with `stop`; the wrapper never kills a
//! search mid-stream except on drop.
//!
//! Engine output is consumed by a background task that queues complete
//! lines. Receiving from the queue is cancellation safe, so a caller
//! may race [`UciEngine::next_info`] against other events without a
//! half-read line (in particular a `bestmove`) being lost.

use std::collections::HashMap;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::AnalysisError;

/// One parsed `info` record from a running search.
#[derive(Debug, Clone)]
pub struct InfoLine {
    pub depth: u32,
    /// 1-based PV slot from multi-PV analysis.
    pub multipv: u32,
    /// Centipawn score from the side to move's perspective.
    pub cp: Option<i32>,
    /// Mate in N (negative when the side to move is getting mated).
    pub mate: Option<i32>,
    /// Principal variation in UCI notation.
    pub pv: Vec<String>,
}

pub struct UciEngine {
    process: Child,
    stdin: ChildStdin,
    lines: mpsc::Receiver<String>,
}

impl UciEngine {
    /// Spawn an engine process and complete the UCI handshake.
    pub async fn new(path: &str) -> Result<Self, AnalysisError> {
        let mut process = Command::new(path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map_err(|e| AnalysisError::Engine(format!("Failed to spawn engine: {e}")))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| AnalysisError::Engine("engine stdin unavailable".into()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| AnalysisError::Engine("engine stdout unavailable".into()))?;

        let mut engine = Self {
            process,
            stdin,
            lines: spawn_line_reader(stdout),
        };

        engine.send("uci").await?;
        engine.wait_for("uciok").await?;
        engine.send("setoption name UCI_AnalyseMode value true").await?;
        engine.send("isready").await?;
        engine.wait_for("readyok").await?;

        Ok(engine)
    }

    /// Apply user options from the options file. Reserved options are
    /// already filtered out by the loader.
    pub async fn configure(&mut self, options: &HashMap<String, Value>) -> Result<(), AnalysisError> {
        for (name, value) in options {
            self.send(&format!("setoption name {name} value {}", option_value(value)))
                .await?;
        }
        self.send("isready").await?;
        self.wait_for("readyok").await?;
        Ok(())
    }

    async fn send(&mut self, cmd: &str) -> Result<(), AnalysisError> {
        debug!(cmd, "engine <");
        self.stdin
            .write_all(format!("{cmd}\n").as_bytes())
            .await
            .map_err(|e| AnalysisError::Engine(format!("Failed to write to engine: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| AnalysisError::Engine(format!("Failed to flush stdin: {e}")))?;
        Ok(())
    }

    async fn read_line(&mut self) -> Result<String, AnalysisError> {
        match self.lines.recv().await {
            Some(line) => {
                let trimmed = line.trim().to_string();
                debug!(line = %trimmed, "engine >");
                Ok(trimmed)
            }
            None => Err(AnalysisError::Engine("engine closed its output".into())),
        }
    }

    async fn wait_for(&mut self, expected: &str) -> Result<(), AnalysisError> {
        loop {
            if self.read_line().await? == expected {
                return Ok(());
            }
        }
    }

    /// Begin an open-ended search of `fen` with the given number of PV
    /// lines. Ends only via [`stop`] or a terminal position.
    pub async fn start_search(&mut self, fen: &str, multipv: u32) -> Result<(), AnalysisError> {
        self.send(&format!("setoption name MultiPV value {multipv}"))
            .await?;
        self.send(&format!("position fen {fen}")).await?;
        self.send("go infinite").await?;
        Ok(())
    }

    /// Next `info` record of the running search, or `None` once the
    /// engine reports `bestmove`. Safe to race in a `select!`: a
    /// dropped call consumes nothing from the line queue.
    pub async fn next_info(&mut self) -> Result<Option<InfoLine>, AnalysisError> {
        loop {
            let line = self.read_line().await?;
            if line.starts_with("bestmove") {
                return Ok(None);
            }
            if line.starts_with("info") && line.contains(" pv ") {
                if let Some(info) = parse_info(&line) {
                    return Ok(Some(info));
                }
            }
        }
    }

    /// Interrupt the running search and drain it to its `bestmove`.
    /// A search that already ended on its own has the `bestmove` line
    /// queued, so the drain terminates either way.
    pub async fn stop(&mut self) -> Result<(), AnalysisError> {
        self.send("stop").await?;
        loop {
            if self.read_line().await?.starts_with("bestmove") {
                return Ok(());
            }
        }
    }

    /// Send quit and wait for the process to exit.
    pub async fn quit(&mut self) {
        let _ = self.send("quit").await;
        let _ = self.process.wait().await;
    }
}

impl Drop for UciEngine {
    fn drop(&mut self) {
        // Best-effort synchronous kill in drop
        let _ = self.process.start_kill();
    }
}

/// Read `stdout` line by line on a background task, queueing each
/// complete line. Partially read lines stay in the reader's buffer, so
/// a receive from the returned channel can be dropped mid-await without
/// losing data.
fn spawn_line_reader<R>(stdout: R) -> mpsc::Receiver<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(64);
    tokio::spawn(async move {
        let mut lines = BufReader::new(stdout).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).await.is_err() {
                break;
            }
        }
    });
    rx
}

fn option_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parse an `info ... pv ...` line into its interesting fields.
pub fn parse_info(line: &str) -> Option<InfoLine> {
    let pv = parse_pv(line);
    if pv.is_empty() {
        return None;
    }
    Some(InfoLine {
        depth: parse_field(line, "depth").unwrap_or(0),
        multipv: parse_field(line, "multipv").unwrap_or(1),
        cp: parse_field(line, "cp"),
        mate: parse_field(line, "mate"),
        pv,
    })
}

/// Parse the integer following a keyword in an info line.
fn parse_field<T: std::str::FromStr>(line: &str, keyword: &str) -> Option<T> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == keyword && i + 1 < parts.len() {
            return parts[i + 1].parse().ok();
        }
    }
    None
}

/// Parse PV moves from an info line.
fn parse_pv(line: &str) -> Vec<String> {
    let mut in_pv = false;
    let mut moves = Vec::new();
    for part in line.split_whitespace() {
        if part == "pv" {
            in_pv = true;
            continue;
        }
        if in_pv {
            if part == "string" {
                break;
            }
            moves.push(part.to_string());
        }
    }
    moves
}
