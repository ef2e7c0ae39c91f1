//! Testing utilities for the road network
//!
//! Small deterministic stand-ins for the world: a terrain built from a height
//! function and a structure oracle backed by a fixed table. Both count their
//! calls so tests can assert on how much of the world was touched.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use bevy::math::IVec3;
use parking_lot::Mutex;

use crate::constants::DEFAULT_SEA_LEVEL;
use crate::spatial::{Probe, StructureOracle};
use crate::terrain::{Biome, TerrainOracle, TerrainSample};
use crate::types::{ChunkPos, StructureKind};

type HeightFn = Box<dyn Fn(i32, i32) -> i32 + Send + Sync>;

/// Terrain whose surface height is an arbitrary function of (x, z)
pub struct HeightFnTerrain {
    height: HeightFn,
    sea_level: i32,
    samples: AtomicUsize,
}

impl HeightFnTerrain {
    pub fn new(height: impl Fn(i32, i32) -> i32 + Send + Sync + 'static) -> Self {
        Self {
            height: Box::new(height),
            sea_level: DEFAULT_SEA_LEVEL,
            samples: AtomicUsize::new(0),
        }
    }

    /// Level ground at height `y`
    pub fn flat(y: i32) -> Self {
        Self::new(move |_, _| y)
    }

    pub fn with_sea_level(mut self, sea_level: i32) -> Self {
        self.sea_level = sea_level;
        self
    }

    pub fn sample_count(&self) -> usize {
        self.samples.load(Ordering::Relaxed)
    }
}

impl TerrainOracle for HeightFnTerrain {
    fn sample(&self, x: i32, z: i32) -> TerrainSample {
        self.samples.fetch_add(1, Ordering::Relaxed);
        let surface = (self.height)(x, z);
        let biome = if surface < self.sea_level {
            Biome::Ocean
        } else {
            Biome::Plains
        };
        TerrainSample { surface, biome }
    }

    fn sea_level(&self) -> i32 {
        self.sea_level
    }
}

/// Structure oracle answering from a table.
///
/// Chunks listed as ungenerated answer `Unknown` until forced.
pub struct FixedStructures {
    seed: u64,
    structures: HashMap<(ChunkPos, StructureKind), IVec3>,
    ungenerated: Mutex<HashSet<ChunkPos>>,
    probes: AtomicUsize,
    forced: Mutex<Vec<ChunkPos>>,
}

impl FixedStructures {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            structures: HashMap::new(),
            ungenerated: Mutex::new(HashSet::new()),
            probes: AtomicUsize::new(0),
            forced: Mutex::new(Vec::new()),
        }
    }

    pub fn with_structure(mut self, chunk: ChunkPos, kind: &str, position: IVec3) -> Self {
        self.structures
            .insert((chunk, StructureKind::new(kind)), position);
        self
    }

    pub fn with_ungenerated(self, chunk: ChunkPos) -> Self {
        self.ungenerated.lock().insert(chunk);
        self
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::Relaxed)
    }

    pub fn forced_chunks(&self) -> Vec<ChunkPos> {
        self.forced.lock().clone()
    }
}

impl StructureOracle for FixedStructures {
    fn world_seed(&self) -> u64 {
        self.seed
    }

    fn probe(&self, chunk: ChunkPos, kind: &StructureKind) -> Probe {
        self.probes.fetch_add(1, Ordering::Relaxed);
        if self.ungenerated.lock().contains(&chunk) {
            return Probe::Unknown;
        }
        match self.structures.get(&(chunk, kind.clone())) {
            Some(position) => Probe::Present(*position),
            None => Probe::Absent,
        }
    }

    fn force_structures(&self, chunk: ChunkPos) {
        self.ungenerated.lock().remove(&chunk);
        self.forced.lock().push(chunk);
    }
}

/// Unit-step points from `(x0, z0)` along +z, `len` points long, at height `y`
pub fn line_along_z(x: i32, y: i32, z0: i32, len: i32) -> Vec<IVec3> {
    (0..len).map(|i| IVec3::new(x, y, z0 + i)).collect()
}

/// Unit-step points from `(x0, z)` along +x, `len` points long, at height `y`
pub fn line_along_x(x0: i32, y: i32, z: i32, len: i32) -> Vec<IVec3> {
    (0..len).map(|i| IVec3::new(x0 + i, y, z)).collect()
}
