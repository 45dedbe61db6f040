use serde::{Deserialize, Serialize};

use crate::blocks::{BlockId, BlockTable};
use crate::chunk::ChunkData;
use crate::error::ConfigError;
use crate::noise_field::{NoiseField, OctaveConfig};

// Thresholds and octave settings of the layered terrain.
// Defaults reproduce the demo world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainParams {
    pub bedrock_below: i32, // y below this is always bedrock
    pub height: OctaveConfig,
    pub height_amplitude: f64, // height noise to blocks
    pub cave: OctaveConfig,
    pub cave_threshold: f64,
    pub cave_floor: i32,  // caves only open strictly above this y
    pub cave_margin: i32, // caves stay this many blocks under the surface
    pub stone: OctaveConfig,
    pub stone_threshold: f64,
    pub grass_depth: i32,
    pub dirt_depth: i32,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            bedrock_below: -15,
            height: OctaveConfig::new(4, 0.5, 0.02),
            height_amplitude: 15.0,
            cave: OctaveConfig::new(3, 0.6, 0.05),
            cave_threshold: 0.3,
            cave_floor: -10,
            cave_margin: 2,
            stone: OctaveConfig::new(2, 0.4, 0.03),
            stone_threshold: 0.1,
            grass_depth: 1,
            dirt_depth: 4,
        }
    }
}

impl TerrainParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.height.validate("terrain.height")?;
        self.cave.validate("terrain.cave")?;
        self.stone.validate("terrain.stone")?;
        Ok(())
    }
}

// Raw field values behind one classification, for inspection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoxelSample {
    pub terrain_height: i32,
    pub cave_noise: f64,
    pub stone_noise: f64,
    pub is_cave: bool,
}

// Decides which block occupies a voxel.
// Pure given its field, block ids and params; share it behind an Arc.
#[derive(Clone)]
pub struct TerrainClassifier {
    field: NoiseField,
    blocks: BlockTable,
    params: TerrainParams,
}

impl TerrainClassifier {
    pub fn new(field: NoiseField, blocks: BlockTable, params: TerrainParams) -> Self {
        Self {
            field,
            blocks,
            params,
        }
    }

    pub fn with_defaults(field: NoiseField, blocks: BlockTable) -> Self {
        Self::new(field, blocks, TerrainParams::default())
    }

    pub fn field(&self) -> &NoiseField {
        &self.field
    }

    pub fn blocks(&self) -> &BlockTable {
        &self.blocks
    }

    pub fn params(&self) -> &TerrainParams {
        &self.params
    }

    // Surface height of column (x, z): voxels at or above it are air
    pub fn terrain_height(&self, x: i32, z: i32) -> i32 {
        let n = self
            .field
            .fbm(x as f64, 0.0, z as f64, &self.params.height);
        (n * self.params.height_amplitude).floor() as i32
    }

    pub fn classify(&self, x: i32, y: i32, z: i32) -> BlockId {
        if y < self.params.bedrock_below {
            return self.blocks.bedrock;
        }
        let height = self.terrain_height(x, z);
        self.classify_column(x, y, z, height)
    }

    // Classification with the column height already known.
    // Noise is only sampled for the rules that still decide the outcome.
    fn classify_column(&self, x: i32, y: i32, z: i32, height: i32) -> BlockId {
        let p = &self.params;
        if y < p.bedrock_below {
            return self.blocks.bedrock;
        }
        if y >= height {
            return BlockId::EMPTY;
        }
        if self.cave_at(x, y, z, height) {
            return BlockId::EMPTY;
        }
        if y >= height - p.grass_depth {
            return self.blocks.grass;
        }
        if y >= height - p.dirt_depth {
            return self.blocks.dirt;
        }
        if self.stone_noise(x, y, z) > p.stone_threshold {
            self.blocks.stone
        } else {
            self.blocks.dirt
        }
    }

    fn cave_noise(&self, x: i32, y: i32, z: i32) -> f64 {
        self.field
            .fbm(x as f64, y as f64, z as f64, &self.params.cave)
    }

    fn stone_noise(&self, x: i32, y: i32, z: i32) -> f64 {
        self.field
            .fbm(x as f64, y as f64, z as f64, &self.params.stone)
    }

    fn cave_at(&self, x: i32, y: i32, z: i32, height: i32) -> bool {
        let p = &self.params;
        y > p.cave_floor
            && y < height - p.cave_margin
            && self.cave_noise(x, y, z) > p.cave_threshold
    }

    // Every field value classify would consult at (x, y, z)
    pub fn sample(&self, x: i32, y: i32, z: i32) -> VoxelSample {
        let p = &self.params;
        let terrain_height = self.terrain_height(x, z);
        let cave_noise = self.cave_noise(x, y, z);
        VoxelSample {
            terrain_height,
            cave_noise,
            stone_noise: self.stone_noise(x, y, z),
            is_cave: cave_noise > p.cave_threshold
                && y > p.cave_floor
                && y < terrain_height - p.cave_margin,
        }
    }

    // Fill `data` so cell (i, j, k) holds classify(origin + (i, j, k)).
    // Column heights are computed once per (i, k).
    pub fn fill_chunk(&self, origin: [i32; 3], data: &mut ChunkData) {
        let [sx, sy, sz] = data.shape();
        let voxels = data.voxels_mut();
        for i in 0..sx {
            let x = origin[0] + i as i32;
            for k in 0..sz {
                let z = origin[2] + k as i32;
                let height = self.terrain_height(x, z);
                for j in 0..sy {
                    let y = origin[1] + j as i32;
                    voxels[[i, j, k]] = self.classify_column(x, y, z, height);
                }
            }
        }
    }
}
