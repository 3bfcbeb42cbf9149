//! Analysis session loop.
//!
//! Owns the engine on a background task and keeps it pointed at a
//! target position. The UI side holds an [`AnalysisHandle`] to retarget
//! or pause, and an mpsc receiver of [`AnalysisUpdate`]s. Every update
//! carries the FEN it was computed for, so a late retarget can never
//! mislabel a stale line.

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::engine::{InfoLine, UciEngine};

/// What the engine should be searching right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub fen: String,
    pub multipv: u32,
}

/// One engine info record, tagged with the position it analyses.
#[derive(Debug, Clone)]
pub struct AnalysisUpdate {
    pub fen: String,
    pub line: InfoLine,
}

/// Control side of a running analysis task.
#[derive(Clone)]
pub struct AnalysisHandle {
    target: watch::Sender<Option<AnalysisRequest>>,
}

impl AnalysisHandle {
    /// Point the engine at a new position. The running search is
    /// stopped and restarted from `fen`.
    pub fn retarget(&self, fen: String, multipv: u32) {
        let _ = self.target.send(Some(AnalysisRequest { fen, multipv }));
    }

    /// Stop searching without shutting the engine down.
    pub fn pause(&self) {
        let _ = self.target.send(None);
    }
}

/// Spawn the analysis loop on a background task.
///
/// The loop exits when every [`AnalysisHandle`] clone is dropped or the
/// update receiver is closed; the engine is quit cleanly on the way
/// out.
pub fn spawn(
    engine: UciEngine,
    buffer: usize,
) -> (AnalysisHandle, mpsc::Receiver<AnalysisUpdate>, JoinHandle<()>) {
    let (target_tx, target_rx) = watch::channel(None);
    let (update_tx, update_rx) = mpsc::channel(buffer);
    let task = tokio::spawn(run(engine, target_rx, update_tx));
    (AnalysisHandle { target: target_tx }, update_rx, task)
}

async fn run(
    mut engine: UciEngine,
    mut targets: watch::Receiver<Option<AnalysisRequest>>,
    updates: mpsc::Sender<AnalysisUpdate>,
) {
    loop {
        // Drop the watch guard before awaiting on the receiver again.
        let current = targets.borrow_and_update().clone();
        let request = match current {
            Some(req) => req,
            None => {
                // Paused. Sleep until the target changes.
                if targets.changed().await.is_err() {
                    break;
                }
                continue;
            }
        };

        debug!(fen = %request.fen, multipv = request.multipv, "starting search");
        if let Err(e) = engine.start_search(&request.fen, request.multipv).await {
            warn!("failed to start search: {e}");
            break;
        }

        let searching = stream_search(&mut engine, &mut targets, &updates, &request).await;
        match searching {
            SearchOutcome::Retargeted => {
                if engine.stop().await.is_err() {
                    break;
                }
            }
            SearchOutcome::Finished => {
                // Terminal position; nothing to search until retargeted.
                if targets.changed().await.is_err() {
                    break;
                }
            }
            SearchOutcome::Shutdown => break,
        }
    }

    engine.quit().await;
}

enum SearchOutcome {
    /// Target changed while the search ran; caller must stop the engine.
    Retargeted,
    /// Engine reported bestmove on its own.
    Finished,
    /// Engine failed or all consumers are gone.
    Shutdown,
}

async fn stream_search(
    engine: &mut UciEngine,
    targets: &mut watch::Receiver<Option<AnalysisRequest>>,
    updates: &mpsc::Sender<AnalysisUpdate>,
    request: &AnalysisRequest,
) -> SearchOutcome {
    loop {
        tokio::select! {
            biased;
            changed = targets.changed() => {
                return match changed {
                    Ok(()) => SearchOutcome::Retargeted,
                    Err(_) => SearchOutcome::Shutdown,
                };
            }
            info = engine.next_info() => {
                match info {
                    Ok(Some(line)) => {
                        let update = AnalysisUpdate {
                            fen: request.fen.clone(),
                            line,
                        };
                        if updates.send(update).await.is_err() {
                            return SearchOutcome::Shutdown;
                        }
                    }
                    Ok(None) => return SearchOutcome::Finished,
                    Err(e) => {
                        warn!("engine read failed: {e}");
                        return SearchOutcome::Shutdown;
                    }
                }
            }
        }
    }
}
