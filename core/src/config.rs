use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::blocks::BlockTable;
use crate::error::ConfigError;
use crate::noise_field::NoiseField;
use crate::terrain::{TerrainClassifier, TerrainParams};

// Everything needed to reproduce a world. Missing fields fall back to the
// demo world: seed 12345, 32-voxel chunks, add/remove distance 2.5/3.5.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub seed: i64,
    pub chunk_size: usize,
    pub chunk_add_distance: f32,    // in chunks
    pub chunk_remove_distance: f32, // in chunks
    pub terrain: TerrainParams,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 12345,
            chunk_size: 32,
            chunk_add_distance: 2.5,
            chunk_remove_distance: 3.5,
            terrain: TerrainParams::default(),
        }
    }
}

impl WorldConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        if !(self.chunk_remove_distance >= self.chunk_add_distance) {
            return Err(ConfigError::Distances {
                add: self.chunk_add_distance,
                remove: self.chunk_remove_distance,
            });
        }
        self.terrain.validate()
    }

    // Classifier for this world's seed and terrain parameters
    pub fn classifier(&self, blocks: BlockTable) -> TerrainClassifier {
        TerrainClassifier::new(NoiseField::new(self.seed), blocks, self.terrain.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::WorldConfig;
    use crate::blocks::{BlockRegistry, BlockTable};
    use crate::error::ConfigError;

    #[test]
    fn defaults_match_demo_world() {
        let config = WorldConfig::default();
        assert_eq!(config.seed, 12345);
        assert_eq!(config.chunk_size, 32);
        assert_eq!(config.chunk_add_distance, 2.5);
        assert_eq!(config.chunk_remove_distance, 3.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config =
            WorldConfig::from_json(r#"{ "seed": 7, "terrain": { "stone_threshold": 0.25 } }"#)
                .unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.chunk_size, 32);
        assert_eq!(config.terrain.stone_threshold, 0.25);
        assert_eq!(config.terrain.height.octaves, 4);
    }

    #[test]
    fn json_round_trip() {
        let config = WorldConfig {
            seed: -42,
            ..WorldConfig::default()
        };
        let text = config.to_json().unwrap();
        assert_eq!(WorldConfig::from_json(&text).unwrap(), config);
    }

    #[test]
    fn invalid_configs_are_rejected() {
        assert!(matches!(
            WorldConfig::from_json(r#"{ "chunk_size": 0 }"#),
            Err(ConfigError::ZeroChunkSize)
        ));
        assert!(matches!(
            WorldConfig::from_json(r#"{ "chunk_add_distance": 4.0 }"#),
            Err(ConfigError::Distances { .. })
        ));
        assert!(matches!(
            WorldConfig::from_json(
                r#"{ "terrain": { "cave": { "octaves": 0, "persistence": 0.6, "scale": 0.05 } } }"#
            ),
            Err(ConfigError::NoOctaves {
                field: "terrain.cave"
            })
        ));
        assert!(matches!(
            WorldConfig::from_json(
                r#"{ "terrain": { "stone": { "octaves": 2, "persistence": -0.4, "scale": 0.03 } } }"#
            ),
            Err(ConfigError::Persistence { .. })
        ));
        assert!(matches!(
            WorldConfig::from_json("{ seed: 1 }"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_reports_missing_file() {
        assert!(matches!(
            WorldConfig::load("/nonexistent/world.json"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn classifier_uses_seed() {
        let mut registry = BlockRegistry::new();
        let blocks = BlockTable::register(&mut registry).unwrap();
        let config = WorldConfig {
            seed: 99,
            ..WorldConfig::default()
        };
        assert_eq!(config.classifier(blocks).field().seed(), 99);
    }
}
