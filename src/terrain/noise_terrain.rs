use noise::{Fbm, MultiFractal, NoiseFn, Perlin};

use super::{Biome, TerrainOracle, TerrainSample};
use crate::constants::DEFAULT_SEA_LEVEL;

/// Perlin-noise terrain used when no host terrain is plugged in
#[derive(Clone)]
pub struct NoiseTerrain {
    elevation_noise: Fbm<Perlin>,
    moisture_noise: Perlin,
    temperature_noise: Perlin,
    sea_level: i32,
    /// Blocks per noise unit
    scale: f64,
    /// Height difference between the deepest and highest column
    relief: f64,
}

impl NoiseTerrain {
    pub fn new(seed: u32) -> Self {
        Self {
            // Different seeds for each layer so they do not correlate
            elevation_noise: Fbm::<Perlin>::new(seed).set_octaves(4),
            moisture_noise: Perlin::new(seed.wrapping_add(1000)),
            temperature_noise: Perlin::new(seed.wrapping_add(2000)),
            sea_level: DEFAULT_SEA_LEVEL,
            scale: 512.0,
            relief: 96.0,
        }
    }

    pub fn with_sea_level(mut self, sea_level: i32) -> Self {
        self.sea_level = sea_level;
        self
    }

    /// Noise values are in [-1, 1]; map them to [0, 1]
    fn unit(value: f64) -> f64 {
        ((value + 1.0) / 2.0).clamp(0.0, 1.0)
    }

    /// Elevation in [0, 1], where the sea surface sits at 0.4
    fn elevation(&self, x: i32, z: i32) -> f64 {
        let p = [x as f64 / self.scale, z as f64 / self.scale];
        Self::unit(self.elevation_noise.get(p))
    }

    fn height_from_elevation(&self, elevation: f64) -> i32 {
        self.sea_level + ((elevation - 0.4) * self.relief).round() as i32
    }

    fn classify(&self, elevation: f64, moisture: f64, temperature: f64) -> Biome {
        if elevation < 0.3 {
            return Biome::Ocean;
        }
        if elevation < 0.4 {
            // Shallow basins: inland ones read as rivers
            return if moisture > 0.5 {
                Biome::River
            } else {
                Biome::Ocean
            };
        }
        if elevation < 0.42 {
            return Biome::Beach;
        }
        if elevation > 0.7 {
            return Biome::Mountains;
        }
        if elevation > 0.6 {
            return Biome::Hills;
        }

        if moisture > 0.6 && temperature > 0.4 {
            Biome::Forest
        } else if moisture < 0.35 && temperature > 0.6 {
            Biome::Desert
        } else if moisture > 0.35 && moisture < 0.55 && temperature > 0.3 && temperature < 0.7 {
            Biome::Farmland
        } else if moisture > 0.7 && temperature < 0.3 {
            Biome::Swamp
        } else {
            Biome::Plains
        }
    }
}

impl Default for NoiseTerrain {
    fn default() -> Self {
        Self::new(42)
    }
}

impl TerrainOracle for NoiseTerrain {
    fn sample(&self, x: i32, z: i32) -> TerrainSample {
        let elevation = self.elevation(x, z);
        let p = [x as f64 / (self.scale * 0.75), z as f64 / (self.scale * 0.75)];
        let moisture = Self::unit(self.moisture_noise.get(p));
        let temperature = Self::unit(self.temperature_noise.get([p[1], p[0]]));

        TerrainSample {
            surface: self.height_from_elevation(elevation),
            biome: self.classify(elevation, moisture, temperature),
        }
    }

    fn sea_level(&self) -> i32 {
        self.sea_level
    }
}
