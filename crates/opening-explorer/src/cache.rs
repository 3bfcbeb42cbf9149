//! FEN-keyed explorer cache.
//!
//! The masters database never changes within a session, so every
//! position is fetched at most once. The cache persists between runs as
//! a bincode file next to the user's other data.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, info};

use crate::client::{Continuation, ExplorerClient};
use crate::error::ExplorerError;

#[derive(Debug, Default)]
pub struct ExplorerCache {
    entries: HashMap<String, Vec<Continuation>>,
}

impl ExplorerCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, fen: &str) -> bool {
        self.entries.contains_key(fen)
    }

    pub fn get(&self, fen: &str) -> Option<&[Continuation]> {
        self.entries.get(fen).map(Vec::as_slice)
    }

    pub fn insert(&mut self, fen: String, moves: Vec<Continuation>) {
        self.entries.insert(fen, moves);
    }

    /// Cached continuations of `fen`, fetching on a miss. A failed
    /// fetch caches the empty list, so an offline session asks the
    /// network once per position at most.
    pub async fn get_or_fetch(&mut self, client: &ExplorerClient, fen: &str) -> &[Continuation] {
        if !self.entries.contains_key(fen) {
            let moves = client.continuations(fen).await;
            self.entries.insert(fen.to_string(), moves);
        }
        self.entries
            .get(fen)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Load a cache persisted by [`save`](Self::save). A missing file
    /// yields an empty cache.
    pub fn load(path: &Path) -> Result<Self, ExplorerError> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no explorer cache on disk");
                return Ok(Self::new());
            }
            Err(e) => return Err(e.into()),
        };
        let entries: HashMap<String, Vec<Continuation>> = bincode::deserialize(&bytes)?;
        info!(positions = entries.len(), "loaded explorer cache");
        Ok(Self { entries })
    }

    pub fn save(&self, path: &Path) -> Result<(), ExplorerError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, bincode::serialize(&self.entries)?)?;
        debug!(positions = self.entries.len(), "saved explorer cache");
        Ok(())
    }
}
