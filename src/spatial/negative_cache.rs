use std::collections::HashSet;

use super::placement::PlacementScheme;
use crate::types::ChunkPos;

/// Candidate positions already confirmed empty for one world seed
#[derive(Debug, Default)]
pub struct NegativeCache {
    seed: Option<u64>,
    entries: HashSet<(ChunkPos, PlacementScheme)>,
}

impl NegativeCache {
    /// Switch to `seed`, forgetting everything learned under another one
    pub fn ensure_seed(&mut self, seed: u64) {
        if self.seed != Some(seed) {
            if !self.entries.is_empty() {
                bevy::log::debug!(
                    "World seed changed, dropping {} negative cache entries",
                    self.entries.len()
                );
            }
            self.entries.clear();
            self.seed = Some(seed);
        }
    }

    pub fn contains(&self, chunk: ChunkPos, scheme: PlacementScheme) -> bool {
        self.entries.contains(&(chunk, scheme))
    }

    pub fn insert(&mut self, chunk: ChunkPos, scheme: PlacementScheme) {
        self.entries.insert((chunk, scheme));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
