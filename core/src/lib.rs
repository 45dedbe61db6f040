// worldgen holds the terrain core of the hello-world voxel demo:
// seeded gradient noise, block registration, per-voxel classification
// and the seams the host engine calls through.
pub mod blocks;
pub mod chunk;
pub mod config;
pub mod error;
pub mod host;
pub mod input;
pub mod noise_field;
pub mod preview;
pub mod terrain;

pub use blocks::{BlockId, BlockRegistry, BlockTable, BlockTypeRegistry, Material};
pub use chunk::{ChunkData, ChunkKey, ChunkRequest};
pub use config::WorldConfig;
pub use error::{ConfigError, InputError, RegistryError};
pub use host::{VoxelView, WorldDataHandler, WorldHost, WorldMutation};
pub use input::{
    BlockEdit, InputAction, InputHandler, KeyBindings, PlayerSession, TargetedBlock,
};
pub use noise_field::{Fbm, NoiseField, OctaveConfig};
pub use preview::{SurfaceColumn, SurfaceMap, SurfaceRegion, scan_surface};
pub use terrain::{TerrainClassifier, TerrainParams, VoxelSample};

// Anything that can be sampled as a scalar field in 3D.
// 2D sampling reads the horizontal plane at y = 0, which is how
// height maps are taken from 3D noise.
pub trait NoiseGenerator {
    // Sample 3D noise at (x, y, z).
    fn get3(&self, x: f64, y: f64, z: f64) -> f64;

    // Sample the y = 0 plane at (x, z).
    fn get2(&self, x: f64, z: f64) -> f64 {
        self.get3(x, 0.0, z)
    }
}
