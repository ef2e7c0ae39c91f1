use std::collections::HashMap;

use parking_lot::RwLock;

use super::{TerrainOracle, TerrainSample};

/// Memoizing wrapper around a terrain oracle.
///
/// The cache is flushed wholesale once it holds `capacity` columns.
pub struct CachedTerrain<T> {
    inner: T,
    capacity: usize,
    columns: RwLock<HashMap<(i32, i32), TerrainSample>>,
}

impl<T: TerrainOracle> CachedTerrain<T> {
    pub fn new(inner: T, capacity: usize) -> Self {
        Self {
            inner,
            capacity: capacity.max(1),
            columns: RwLock::new(HashMap::new()),
        }
    }

    /// Warm the cache for a rectangle of columns, inclusive on both ends
    pub fn prefetch(&self, min: (i32, i32), max: (i32, i32)) {
        for x in min.0..=max.0 {
            for z in min.1..=max.1 {
                self.sample(x, z);
            }
        }
    }

    pub fn cached_columns(&self) -> usize {
        self.columns.read().len()
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T: TerrainOracle> TerrainOracle for CachedTerrain<T> {
    fn sample(&self, x: i32, z: i32) -> TerrainSample {
        if let Some(sample) = self.columns.read().get(&(x, z)) {
            return *sample;
        }

        let sample = self.inner.sample(x, z);
        let mut columns = self.columns.write();
        if columns.len() >= self.capacity {
            columns.clear();
        }
        columns.insert((x, z), sample);
        sample
    }

    fn sea_level(&self) -> i32 {
        self.inner.sea_level()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::NoiseTerrain;

    #[test]
    fn cached_samples_match_the_source() {
        let source = NoiseTerrain::new(11);
        let cached = CachedTerrain::new(NoiseTerrain::new(11), 1024);

        for (x, z) in [(0, 0), (5, -9), (300, 12), (5, -9)] {
            assert_eq!(cached.sample(x, z), source.sample(x, z));
        }
        assert_eq!(cached.cached_columns(), 3);
    }

    #[test]
    fn cache_is_bounded() {
        let cached = CachedTerrain::new(NoiseTerrain::new(11), 16);
        cached.prefetch((0, 0), (9, 9));
        assert!(cached.cached_columns() <= 16);
    }
}
