//! Terrain oracle consumed by the path search and post-processing
//!
//! The oracle is idempotent: sampling the same column twice always yields the
//! same answer, which is what makes [`CachedTerrain`] safe.

use bevy::math::IVec3;
use serde::{Deserialize, Serialize};

pub mod cache;
pub mod noise_terrain;

pub use cache::CachedTerrain;
pub use noise_terrain::NoiseTerrain;

/// Coarse biome classification of a terrain column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Biome {
    Ocean,
    River,
    Beach,
    Plains,
    Farmland,
    Forest,
    Desert,
    Swamp,
    Hills,
    Mountains,
}

impl Biome {
    pub fn is_water(self) -> bool {
        matches!(self, Biome::Ocean | Biome::River)
    }
}

/// Result of sampling one terrain column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerrainSample {
    /// Y of the topmost solid block
    pub surface: i32,
    pub biome: Biome,
}

/// Source of surface heights and biomes.
///
/// Implementations must be cheap to call from many worker threads at once.
pub trait TerrainOracle: Send + Sync {
    fn sample(&self, x: i32, z: i32) -> TerrainSample;

    /// Y of the water surface; columns whose surface is below it are flooded
    fn sea_level(&self) -> i32;

    fn is_underwater(&self, x: i32, z: i32) -> bool {
        self.sample(x, z).surface < self.sea_level()
    }

    /// Height a road sits at: on the ground, or on the water surface
    fn road_height(&self, x: i32, z: i32) -> i32 {
        self.sample(x, z).surface.max(self.sea_level())
    }

    /// Block a road occupies in column (x, z)
    fn road_point(&self, x: i32, z: i32) -> IVec3 {
        IVec3::new(x, self.road_height(x, z), z)
    }
}
