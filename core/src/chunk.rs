use std::fmt;

use ndarray::Array3;

use crate::blocks::BlockId;

// Chunk coordinates: world position divided by the chunk size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkKey {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl ChunkKey {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    // Chunk holding the voxel at `pos`
    pub fn containing(pos: [i32; 3], chunk_size: usize) -> Self {
        let size = chunk_size as i32;
        Self {
            x: pos[0].div_euclid(size),
            y: pos[1].div_euclid(size),
            z: pos[2].div_euclid(size),
        }
    }

    // World coordinate of the chunk's minimum corner
    pub fn origin(&self, chunk_size: usize) -> [i32; 3] {
        let size = chunk_size as i32;
        [self.x * size, self.y * size, self.z * size]
    }

    // Euclidean distance in chunk units
    pub fn distance(&self, other: &ChunkKey) -> f32 {
        let dx = (self.x - other.x) as f32;
        let dy = (self.y - other.y) as f32;
        let dz = (self.z - other.z) as f32;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

impl fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}|{}", self.x, self.y, self.z)
    }
}

// A terrain request from the host: which chunk, and where its buffer starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRequest {
    pub key: ChunkKey,
    pub origin: [i32; 3],
}

impl ChunkRequest {
    pub fn for_key(key: ChunkKey, chunk_size: usize) -> Self {
        Self {
            key,
            origin: key.origin(chunk_size),
        }
    }
}

// Voxel buffer of one chunk, indexed (i, j, k) from the chunk origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkData {
    voxels: Array3<BlockId>,
}

impl ChunkData {
    pub fn new(shape: [usize; 3]) -> Self {
        Self {
            voxels: Array3::from_elem((shape[0], shape[1], shape[2]), BlockId::EMPTY),
        }
    }

    pub fn cube(size: usize) -> Self {
        Self::new([size; 3])
    }

    pub fn shape(&self) -> [usize; 3] {
        let s = self.voxels.shape();
        [s[0], s[1], s[2]]
    }

    pub fn get(&self, i: usize, j: usize, k: usize) -> Option<BlockId> {
        self.voxels.get((i, j, k)).copied()
    }

    // Returns false when (i, j, k) is outside the buffer
    pub fn set(&mut self, i: usize, j: usize, k: usize, id: BlockId) -> bool {
        match self.voxels.get_mut((i, j, k)) {
            Some(slot) => {
                *slot = id;
                true
            }
            None => false,
        }
    }

    pub fn voxels(&self) -> &Array3<BlockId> {
        &self.voxels
    }

    pub(crate) fn voxels_mut(&mut self) -> &mut Array3<BlockId> {
        &mut self.voxels
    }

    pub fn count(&self, id: BlockId) -> usize {
        self.voxels.iter().filter(|&&v| v == id).count()
    }

    // True when every voxel is air
    pub fn is_air(&self) -> bool {
        self.voxels.iter().all(|v| v.is_empty())
    }
}
