// Stand-in for the host engine's world: loaded chunks, streaming around a
// focus point, and block edits.

use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::Arc;

use log::{debug, info};
use tokio::runtime::{Builder, Runtime};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use worldgen::{
    BlockId, ChunkData, ChunkKey, ChunkRequest, VoxelView, WorldConfig, WorldDataHandler,
    WorldHost, WorldMutation,
};

type Delivery = (ChunkKey, ChunkData);

// Host sink living on a worker thread; forwards finished chunks to the world
struct ChunkSender(UnboundedSender<Delivery>);

impl WorldHost for ChunkSender {
    fn set_chunk_data(&mut self, key: ChunkKey, data: ChunkData) {
        if self.0.send((key, data)).is_err() {
            debug!("world closed before chunk {} arrived", key);
        }
    }
}

pub struct ChunkWorld {
    chunk_size: usize,
    add_distance: f32,
    remove_distance: f32,
    chunks: HashMap<ChunkKey, ChunkData>,
    pending: HashSet<ChunkKey>,
    handler: Arc<WorldDataHandler>,
    runtime: Option<Runtime>, // taken on drop
    tx: UnboundedSender<Delivery>,
    rx: UnboundedReceiver<Delivery>,
}

impl ChunkWorld {
    pub fn new(config: &WorldConfig, handler: Arc<WorldDataHandler>) -> io::Result<Self> {
        // Generation runs on the blocking pool; nothing here needs the reactor
        let runtime = Builder::new_current_thread().build()?;
        let (tx, rx) = unbounded_channel();
        Ok(Self {
            chunk_size: config.chunk_size,
            add_distance: config.chunk_add_distance,
            remove_distance: config.chunk_remove_distance,
            chunks: HashMap::new(),
            pending: HashSet::new(),
            handler,
            runtime: Some(runtime),
            tx,
            rx,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn loaded(&self) -> usize {
        self.chunks.len()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn chunk(&self, key: &ChunkKey) -> Option<&ChunkData> {
        self.chunks.get(key)
    }

    // Request every chunk within the add distance of `focus` and drop
    // loaded or in-flight chunks beyond the remove distance.
    pub fn update_focus(&mut self, focus: [i32; 3]) {
        let center = ChunkKey::containing(focus, self.chunk_size);
        let reach = self.add_distance.ceil() as i32;

        for dx in -reach..=reach {
            for dy in -reach..=reach {
                for dz in -reach..=reach {
                    let key = ChunkKey::new(center.x + dx, center.y + dy, center.z + dz);
                    if center.distance(&key) > self.add_distance
                        || self.chunks.contains_key(&key)
                        || self.pending.contains(&key)
                    {
                        continue;
                    }
                    self.request(key);
                }
            }
        }

        let remove = self.remove_distance;
        let before = self.chunks.len();
        self.chunks.retain(|key, _| center.distance(key) <= remove);
        self.pending.retain(|key| center.distance(key) <= remove);
        if self.chunks.len() < before {
            info!("unloaded {} chunks around {}", before - self.chunks.len(), center);
        }
    }

    fn request(&mut self, key: ChunkKey) {
        self.pending.insert(key);
        let request = ChunkRequest::for_key(key, self.chunk_size);
        let data = ChunkData::cube(self.chunk_size);
        let handler = Arc::clone(&self.handler);
        let mut sender = ChunkSender(self.tx.clone());
        if let Some(runtime) = &self.runtime {
            runtime.spawn_blocking(move || {
                handler.on_world_data_needed(&request, data, &mut sender);
            });
        }
    }

    // Move finished chunks into the world, returning the keys that were loaded
    pub fn poll(&mut self) -> Vec<ChunkKey> {
        let mut arrived = Vec::new();
        while let Ok((key, data)) = self.rx.try_recv() {
            if self.pending.contains(&key) {
                arrived.push(key);
            }
            self.set_chunk_data(key, data);
        }
        arrived
    }

    fn locate(&self, position: [i32; 3]) -> (ChunkKey, [usize; 3]) {
        let size = self.chunk_size as i32;
        let key = ChunkKey::containing(position, self.chunk_size);
        let local = position.map(|c| c.rem_euclid(size) as usize);
        (key, local)
    }
}

impl Drop for ChunkWorld {
    // Chunks still generating finish on their own threads; their deliveries
    // go nowhere once the receiver is gone.
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl WorldHost for ChunkWorld {
    fn set_chunk_data(&mut self, key: ChunkKey, data: ChunkData) {
        if self.pending.remove(&key) {
            self.chunks.insert(key, data);
        } else {
            debug!("discarding chunk {}: no longer requested", key);
        }
    }
}

impl VoxelView for ChunkWorld {
    // Unloaded voxels read as air
    fn block_at(&self, position: [i32; 3]) -> BlockId {
        let (key, [i, j, k]) = self.locate(position);
        self.chunks
            .get(&key)
            .and_then(|chunk| chunk.get(i, j, k))
            .unwrap_or(BlockId::EMPTY)
    }
}

impl WorldMutation for ChunkWorld {
    fn set_block(&mut self, id: BlockId, position: [i32; 3]) -> bool {
        let (key, [i, j, k]) = self.locate(position);
        match self.chunks.get_mut(&key) {
            Some(chunk) => chunk.set(i, j, k, id),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    use worldgen::{
        BlockId, BlockRegistry, BlockTable, ChunkData, ChunkKey, VoxelView, WorldConfig,
        WorldDataHandler, WorldHost, WorldMutation,
    };

    use super::ChunkWorld;

    fn small_world() -> ChunkWorld {
        world_with(WorldConfig {
            chunk_size: 8,
            chunk_add_distance: 1.0,
            chunk_remove_distance: 1.5,
            ..WorldConfig::default()
        })
    }

    fn world_with(config: WorldConfig) -> ChunkWorld {
        let mut registry = BlockRegistry::new();
        let blocks = BlockTable::register(&mut registry).unwrap();
        let handler = WorldDataHandler::new(Arc::new(config.classifier(blocks)));
        ChunkWorld::new(&config, Arc::new(handler)).unwrap()
    }

    fn wait_for_chunks(world: &mut ChunkWorld) {
        let deadline = Instant::now() + Duration::from_secs(30);
        while world.pending() > 0 {
            world.poll();
            assert!(Instant::now() < deadline, "chunks never arrived");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn streams_chunks_around_focus() {
        let mut world = small_world();
        world.update_focus([0, 0, 0]);
        // Center plus its six face neighbours
        assert_eq!(world.pending(), 7);
        wait_for_chunks(&mut world);
        assert_eq!(world.loaded(), 7);

        let classifier = world.handler.classifier().clone();
        for pos in [[0, -1, 0], [7, -5, 3], [-8, 2, 1], [3, 12, 5], [2, -8, 3]] {
            assert_eq!(world.block_at(pos), classifier.classify(pos[0], pos[1], pos[2]));
        }
        assert!(world.chunk(&ChunkKey::new(1, 1, 0)).is_none());
    }

    #[test]
    fn moving_focus_unloads_far_chunks() {
        let mut world = small_world();
        world.update_focus([0, 0, 0]);
        wait_for_chunks(&mut world);

        world.update_focus([40, 0, 0]);
        assert!(world.chunk(&ChunkKey::new(0, 0, 0)).is_none());
        wait_for_chunks(&mut world);
        assert_eq!(world.loaded(), 7);
        assert!(world.chunk(&ChunkKey::new(5, 0, 0)).is_some());
    }

    #[test]
    fn edits_apply_to_loaded_chunks_only() {
        let mut world = small_world();
        world.update_focus([0, 0, 0]);
        wait_for_chunks(&mut world);

        assert!(world.set_block(BlockId(3), [-1, 4, 2]));
        assert_eq!(world.block_at([-1, 4, 2]), BlockId(3));
        assert!(!world.set_block(BlockId(3), [100, 0, 0]));
        assert_eq!(world.block_at([100, 0, 0]), BlockId::EMPTY);
    }

    #[test]
    fn poll_reports_arrived_keys() {
        let mut world = small_world();
        world.update_focus([0, 0, 0]);

        let deadline = Instant::now() + Duration::from_secs(30);
        let mut arrived = Vec::new();
        while world.pending() > 0 {
            arrived.extend(world.poll());
            assert!(Instant::now() < deadline, "chunks never arrived");
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(arrived.len(), 7);
        assert!(arrived.contains(&ChunkKey::new(0, -1, 0)));
        assert!(world.poll().is_empty());
    }

    #[test]
    fn unrequested_chunks_are_discarded() {
        let mut world = small_world();
        world.update_focus([0, 0, 0]);
        wait_for_chunks(&mut world);

        let stray = ChunkKey::new(9, 9, 9);
        world.set_chunk_data(stray, ChunkData::cube(8));
        assert!(world.chunk(&stray).is_none());
        assert_eq!(world.loaded(), 7);
    }

    #[test]
    fn chunks_for_an_abandoned_focus_never_load() {
        let mut world = small_world();
        world.update_focus([0, 0, 0]);
        world.update_focus([400, 0, 0]);
        assert_eq!(world.pending(), 7);
        wait_for_chunks(&mut world);

        // Give the abandoned requests time to deliver, then drain them
        thread::sleep(Duration::from_millis(200));
        assert!(world.poll().is_empty());
        assert!(world.chunk(&ChunkKey::new(0, 0, 0)).is_none());
        assert!(world.chunk(&ChunkKey::new(50, 0, 0)).is_some());
        assert_eq!(world.loaded(), 7);
    }

    #[test]
    fn dropping_the_world_does_not_wait_for_generation() {
        // Large chunks with caves and stone noise all the way down
        let mut config = WorldConfig {
            chunk_size: 128,
            chunk_add_distance: 1.0,
            chunk_remove_distance: 1.5,
            ..WorldConfig::default()
        };
        config.terrain.bedrock_below = i32::MIN;
        config.terrain.cave_floor = i32::MIN;
        let mut world = world_with(config);
        world.update_focus([0, -64, 0]);
        assert_eq!(world.pending(), 7);

        let start = Instant::now();
        drop(world);
        assert!(
            start.elapsed() < Duration::from_millis(100),
            "drop blocked for {:?}",
            start.elapsed()
        );
    }
}
