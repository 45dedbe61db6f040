use std::collections::HashMap;
use std::fmt;

use log::info;
use palette::Srgb;
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

// Voxel type identifier handed out by the host's block registry.
// 0 is air and is never registered.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BlockId(pub u16);

impl BlockId {
    pub const EMPTY: BlockId = BlockId(0);

    pub fn is_empty(self) -> bool {
        self == Self::EMPTY
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Flat-colored block material.
#[derive(Debug, Clone, Copy)]
pub struct Material {
    pub color: Srgb<f32>,
}

impl Material {
    pub fn from_rgb(red: f32, green: f32, blue: f32) -> Self {
        Self {
            color: Srgb::new(red, green, blue),
        }
    }

    pub fn rgb8(&self) -> [u8; 3] {
        let c: Srgb<u8> = self.color.into_format();
        [c.red, c.green, c.blue]
    }

    fn same_as(&self, other: &Material) -> bool {
        self.color.into_components() == other.color.into_components()
    }
}

// The host's block-type table as seen from the world script.
pub trait BlockTypeRegistry {
    fn register_material(&mut self, name: &str, material: Material) -> Result<(), RegistryError>;

    // Register a block type that renders with `material`, returning its id.
    fn register_block(&mut self, name: &str, material: &str) -> Result<BlockId, RegistryError>;
}

#[derive(Debug, Clone)]
struct BlockEntry {
    name: String,
    material: String,
}

// In-memory block registry.
//
// Ids are assigned densely from 1 in registration order. Registration is
// idempotent: the same name with the same definition returns what was
// registered before, a different definition under a taken name is rejected.
#[derive(Debug, Clone, Default)]
pub struct BlockRegistry {
    materials: HashMap<String, Material>,
    blocks: Vec<BlockEntry>, // index = id - 1
    by_name: HashMap<String, BlockId>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self, name: &str) -> Option<BlockId> {
        self.by_name.get(name).copied()
    }

    // Air is always recognized
    pub fn contains(&self, id: BlockId) -> bool {
        id.is_empty() || self.entry(id).is_some()
    }

    pub fn name(&self, id: BlockId) -> Option<&str> {
        self.entry(id).map(|e| e.name.as_str())
    }

    pub fn material(&self, id: BlockId) -> Option<&Material> {
        self.entry(id)
            .and_then(|e| self.materials.get(&e.material))
    }

    pub fn color(&self, id: BlockId) -> Option<Srgb<f32>> {
        self.material(id).map(|m| m.color)
    }

    // Number of registered block types, air excluded
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    fn entry(&self, id: BlockId) -> Option<&BlockEntry> {
        (id.0 as usize)
            .checked_sub(1)
            .and_then(|index| self.blocks.get(index))
    }
}

impl BlockTypeRegistry for BlockRegistry {
    fn register_material(&mut self, name: &str, material: Material) -> Result<(), RegistryError> {
        match self.materials.get(name) {
            Some(existing) if existing.same_as(&material) => Ok(()),
            Some(_) => Err(RegistryError::MaterialConflict(name.to_string())),
            None => {
                self.materials.insert(name.to_string(), material);
                Ok(())
            }
        }
    }

    fn register_block(&mut self, name: &str, material: &str) -> Result<BlockId, RegistryError> {
        if let Some(&id) = self.by_name.get(name) {
            let existing = &self.blocks[id.0 as usize - 1].material;
            if existing == material {
                return Ok(id);
            }
            return Err(RegistryError::BlockConflict {
                name: name.to_string(),
                existing: existing.clone(),
            });
        }
        if !self.materials.contains_key(material) {
            return Err(RegistryError::UnknownMaterial {
                block: name.to_string(),
                material: material.to_string(),
            });
        }

        let id = u16::try_from(self.blocks.len() + 1)
            .map(BlockId)
            .map_err(|_| RegistryError::IdsExhausted)?;
        self.blocks.push(BlockEntry {
            name: name.to_string(),
            material: material.to_string(),
        });
        self.by_name.insert(name.to_string(), id);
        Ok(id)
    }
}

// Material colors of the demo world
pub const DEFAULT_MATERIALS: [(&str, [f32; 3]); 4] = [
    ("dirt", [0.45, 0.36, 0.22]),
    ("grass", [0.1, 0.8, 0.2]),
    ("stone", [0.5, 0.5, 0.5]),
    ("bedrock", [0.3, 0.2, 0.1]),
];

// Ids of the block types the terrain generator emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockTable {
    pub dirt: BlockId,
    pub grass: BlockId,
    pub stone: BlockId,
    pub bedrock: BlockId,
}

impl BlockTable {
    // Register the demo materials and block types with the host.
    // Must run before any terrain is requested.
    pub fn register<R>(registry: &mut R) -> Result<Self, RegistryError>
    where
        R: BlockTypeRegistry + ?Sized,
    {
        for (name, [r, g, b]) in DEFAULT_MATERIALS {
            registry.register_material(name, Material::from_rgb(r, g, b))?;
        }

        let table = Self {
            dirt: registry.register_block("dirt", "dirt")?,
            grass: registry.register_block("grass", "grass")?,
            stone: registry.register_block("stone", "stone")?,
            bedrock: registry.register_block("bedrock", "bedrock")?,
        };
        info!(
            "registered blocks: dirt={} grass={} stone={} bedrock={}",
            table.dirt, table.grass, table.stone, table.bedrock
        );
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::{BlockId, BlockRegistry, BlockTable, BlockTypeRegistry, Material};
    use crate::error::RegistryError;

    #[test]
    fn default_ids_follow_registration_order() {
        let mut registry = BlockRegistry::new();
        let table = BlockTable::register(&mut registry).unwrap();
        assert_eq!(table.dirt, BlockId(1));
        assert_eq!(table.grass, BlockId(2));
        assert_eq!(table.stone, BlockId(3));
        assert_eq!(table.bedrock, BlockId(4));
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.name(table.stone), Some("stone"));
    }

    #[test]
    fn registering_twice_returns_same_id() {
        let mut registry = BlockRegistry::new();
        let first = BlockTable::register(&mut registry).unwrap();
        let second = BlockTable::register(&mut registry).unwrap();
        assert_eq!(first, second);
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.register_block("dirt", "dirt"), Ok(first.dirt));
    }

    #[test]
    fn conflicting_definitions_are_rejected() {
        let mut registry = BlockRegistry::new();
        BlockTable::register(&mut registry).unwrap();

        assert_eq!(
            registry.register_block("dirt", "stone"),
            Err(RegistryError::BlockConflict {
                name: "dirt".into(),
                existing: "dirt".into(),
            })
        );
        assert_eq!(
            registry.register_material("grass", Material::from_rgb(1.0, 0.0, 0.0)),
            Err(RegistryError::MaterialConflict("grass".into()))
        );
        assert_eq!(
            registry.register_block("sand", "sand"),
            Err(RegistryError::UnknownMaterial {
                block: "sand".into(),
                material: "sand".into(),
            })
        );
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn empty_is_reserved() {
        let mut registry = BlockRegistry::new();
        let table = BlockTable::register(&mut registry).unwrap();
        assert!(registry.contains(BlockId::EMPTY));
        assert!(registry.contains(table.bedrock));
        assert!(!registry.contains(BlockId(5)));
        assert_eq!(registry.name(BlockId::EMPTY), None);
        assert!(registry.color(BlockId::EMPTY).is_none());
    }

    #[test]
    fn material_colors() {
        let mut registry = BlockRegistry::new();
        let table = BlockTable::register(&mut registry).unwrap();
        let [r, g, b] = registry.material(table.grass).unwrap().rgb8();
        assert!(g > 200 && r < 30 && b < 60);
        let [r, g, b] = registry.material(table.stone).unwrap().rgb8();
        assert!(r == g && g == b && (127..=128).contains(&r));
    }
}
