#![allow(dead_code)]

use std::collections::HashSet;

use bevy::math::IVec3;
use roadnet::spatial::{
    Placement, Probe, RandomSpread, SpreadType, StructureOracle, StructureRegistry, StructureSet,
};
use roadnet::terrain::{Biome, TerrainOracle, TerrainSample};
use roadnet::types::{ChunkPos, StructureKind};

pub const SEA_LEVEL: i32 = 63;

/// Terrain defined by a height function
pub struct FnTerrain<F> {
    height: F,
}

impl<F: Fn(i32, i32) -> i32 + Send + Sync> FnTerrain<F> {
    pub fn new(height: F) -> Self {
        Self { height }
    }
}

pub fn flat(y: i32) -> FnTerrain<impl Fn(i32, i32) -> i32 + Send + Sync> {
    FnTerrain::new(move |_, _| y)
}

impl<F: Fn(i32, i32) -> i32 + Send + Sync> TerrainOracle for FnTerrain<F> {
    fn sample(&self, x: i32, z: i32) -> TerrainSample {
        let surface = (self.height)(x, z);
        TerrainSample {
            surface,
            biome: if surface < SEA_LEVEL {
                Biome::Ocean
            } else {
                Biome::Plains
            },
        }
    }

    fn sea_level(&self) -> i32 {
        SEA_LEVEL
    }
}

pub fn village() -> StructureKind {
    StructureKind::new("test:village")
}

/// Every chunk is a candidate, so the oracle alone decides what exists
pub fn dense_registry() -> StructureRegistry {
    StructureRegistry::new()
        .with_set(StructureSet {
            name: "test:villages".to_string(),
            placement: Placement::RandomSpread(RandomSpread {
                spacing: 1,
                separation: 0,
                salt: 3,
                spread: SpreadType::Linear,
            }),
            kinds: vec![village()],
        })
        .with_tag("test:settlements", vec![village()])
}

/// Villages at the centre of the listed chunks
pub struct VillageWorld {
    seed: u64,
    y: i32,
    chunks: HashSet<ChunkPos>,
}

impl VillageWorld {
    pub fn new(seed: u64, y: i32, chunks: &[(i32, i32)]) -> Self {
        Self {
            seed,
            y,
            chunks: chunks.iter().map(|&(x, z)| ChunkPos::new(x, z)).collect(),
        }
    }

    pub fn positions(&self) -> Vec<IVec3> {
        self.chunks.iter().map(|c| c.center_block(self.y)).collect()
    }
}

impl StructureOracle for VillageWorld {
    fn world_seed(&self) -> u64 {
        self.seed
    }

    fn probe(&self, chunk: ChunkPos, kind: &StructureKind) -> Probe {
        if kind == &village() && self.chunks.contains(&chunk) {
            Probe::Present(chunk.center_block(self.y))
        } else {
            Probe::Absent
        }
    }

    fn force_structures(&self, _chunk: ChunkPos) {}
}

/// Consecutive points never jump more than one block in X or Z
pub fn is_unit_stepped(points: &[IVec3]) -> bool {
    points
        .windows(2)
        .all(|w| (w[1].x - w[0].x).abs() <= 1 && (w[1].z - w[0].z).abs() <= 1)
}

pub fn temp_file(name: &str) -> std::path::PathBuf {
    std::env::temp_dir()
        .join(format!("roadnet-tests-{}", std::process::id()))
        .join(name)
}
