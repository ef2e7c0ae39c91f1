//! Structure placement schemes
//!
//! Both schemes are pure functions of the world seed, so candidates can be
//! enumerated on any thread without touching the world.

use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::Arc;

use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::types::ChunkPos;

const RING_SALT: u64 = 0x5EED_0F_21_9C;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PlacementScheme {
    RandomSpread,
    ConcentricRings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpreadType {
    #[default]
    Linear,
    /// Average of two draws, biased towards the middle of the region
    Triangular,
}

/// One candidate per `spacing x spacing` region, jittered inside it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomSpread {
    pub spacing: i32,
    pub separation: i32,
    pub salt: u64,
    pub spread: SpreadType,
}

impl RandomSpread {
    fn region_rng(&self, seed: u64, region_x: i32, region_z: i32) -> StdRng {
        let mixed = seed
            ^ (region_x as i64 as u64).wrapping_mul(341_873_128_712)
            ^ (region_z as i64 as u64).wrapping_mul(132_897_987_541)
            ^ self.salt;
        StdRng::seed_from_u64(mixed)
    }

    fn jitter(&self, rng: &mut StdRng) -> i32 {
        let range = self.spacing - self.separation;
        if range <= 0 {
            return 0;
        }
        match self.spread {
            SpreadType::Linear => rng.random_range(0..range),
            SpreadType::Triangular => (rng.random_range(0..range) + rng.random_range(0..range)) / 2,
        }
    }

    /// The single candidate chunk of a region
    pub fn candidate_in_region(&self, seed: u64, region_x: i32, region_z: i32) -> ChunkPos {
        let mut rng = self.region_rng(seed, region_x, region_z);
        let dx = self.jitter(&mut rng);
        let dz = self.jitter(&mut rng);
        ChunkPos::new(region_x * self.spacing + dx, region_z * self.spacing + dz)
    }

    /// Candidates inside the inclusive chunk rectangle `min..=max`
    pub fn candidates_in(&self, seed: u64, min: ChunkPos, max: ChunkPos) -> Vec<ChunkPos> {
        let spacing = self.spacing.max(1);
        let mut out = Vec::new();
        for rx in min.x.div_euclid(spacing)..=max.x.div_euclid(spacing) {
            for rz in min.z.div_euclid(spacing)..=max.z.div_euclid(spacing) {
                let chunk = self.candidate_in_region(seed, rx, rz);
                if (min.x..=max.x).contains(&chunk.x) && (min.z..=max.z).contains(&chunk.z) {
                    out.push(chunk);
                }
            }
        }
        out
    }
}

/// A fixed number of positions spiralling out from the world origin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcentricRings {
    /// Ring spacing in chunks
    pub distance: i32,
    pub count: usize,
    /// Positions on the first ring
    pub spread: usize,
}

impl ConcentricRings {
    pub fn layout(&self, seed: u64) -> Vec<ChunkPos> {
        let mut rng = StdRng::seed_from_u64(seed ^ RING_SALT);
        let mut positions = Vec::with_capacity(self.count);
        let distance = self.distance as f64;

        let mut angle = rng.random::<f64>() * PI * 2.0;
        let mut ring = 0usize;
        let mut on_ring = 0usize;
        let mut per_ring = self.spread.max(1);

        for placed in 0..self.count {
            let radius = 4.0 * distance
                + distance * ring as f64 * 6.0
                + (rng.random::<f64>() - 0.5) * distance * 2.5;
            positions.push(ChunkPos::new(
                (angle.cos() * radius).round() as i32,
                (angle.sin() * radius).round() as i32,
            ));

            angle += 2.0 * PI / per_ring as f64;
            on_ring += 1;
            if on_ring == per_ring {
                ring += 1;
                on_ring = 0;
                per_ring += 2 * per_ring / (ring + 1);
                per_ring = per_ring.min(self.count - placed - 1).max(1);
                angle += rng.random::<f64>() * PI * 2.0;
            }
        }
        positions
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Placement {
    RandomSpread(RandomSpread),
    ConcentricRings(ConcentricRings),
}

impl Placement {
    pub fn scheme(&self) -> PlacementScheme {
        match self {
            Placement::RandomSpread(_) => PlacementScheme::RandomSpread,
            Placement::ConcentricRings(_) => PlacementScheme::ConcentricRings,
        }
    }
}

/// Ring layouts computed once per (seed, structure set) and shared
#[derive(Default)]
pub struct RingCache {
    layouts: RwLock<HashMap<(u64, String), Arc<Vec<ChunkPos>>>>,
}

impl RingCache {
    pub fn layout(&self, seed: u64, set: &str, rings: &ConcentricRings) -> Arc<Vec<ChunkPos>> {
        let key = (seed, set.to_string());
        if let Some(layout) = self.layouts.read().get(&key) {
            return layout.clone();
        }
        self.layouts
            .write()
            .entry(key)
            .or_insert_with(|| Arc::new(rings.layout(seed)))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.layouts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
