use std::sync::Arc;

use log::debug;

use crate::blocks::BlockId;
use crate::chunk::{ChunkData, ChunkKey, ChunkRequest};
use crate::terrain::TerrainClassifier;

// Receives finished chunk buffers, keyed by the chunk they were requested for.
pub trait WorldHost {
    fn set_chunk_data(&mut self, key: ChunkKey, data: ChunkData);
}

// The host's world-mutation API.
pub trait WorldMutation {
    // Returns false when the target voxel is not loaded
    fn set_block(&mut self, id: BlockId, position: [i32; 3]) -> bool;
}

// Read access to voxels by world position.
pub trait VoxelView {
    fn block_at(&self, position: [i32; 3]) -> BlockId;
}

impl VoxelView for TerrainClassifier {
    fn block_at(&self, position: [i32; 3]) -> BlockId {
        self.classify(position[0], position[1], position[2])
    }
}

// Answers the host's terrain requests.
// Holds only the shared classifier, so one handler can serve every worker.
pub struct WorldDataHandler {
    classifier: Arc<TerrainClassifier>,
}

impl WorldDataHandler {
    pub fn new(classifier: Arc<TerrainClassifier>) -> Self {
        Self { classifier }
    }

    pub fn classifier(&self) -> &Arc<TerrainClassifier> {
        &self.classifier
    }

    // Fill the host-provided buffer and hand it back under the request's key.
    pub fn on_world_data_needed<H>(&self, request: &ChunkRequest, mut data: ChunkData, host: &mut H)
    where
        H: WorldHost + ?Sized,
    {
        self.classifier.fill_chunk(request.origin, &mut data);
        debug!(
            "generated chunk {} at {:?} ({} solid voxels)",
            request.key,
            request.origin,
            data.shape().iter().product::<usize>() - data.count(BlockId::EMPTY)
        );
        host.set_chunk_data(request.key, data);
    }

    // Generate a fresh buffer of `shape` for the request
    pub fn generate(&self, request: &ChunkRequest, shape: [usize; 3]) -> ChunkData {
        let mut data = ChunkData::new(shape);
        self.classifier.fill_chunk(request.origin, &mut data);
        data
    }
}
