use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::grid::GridMap;

/// How a world and its session are set up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)] // if we add new fields, give them default values when deserializing old configs
pub struct WorldConfig {
    /// Side length of the square grid
    pub size: usize,
    /// Number of obstacle draws, duplicates included
    pub obstacles: usize,
    /// Fixed seed for reproducible worlds, a fresh one is drawn when absent
    pub seed: Option<u64>,
    /// Labels dealt to the obstacles
    pub labels: Vec<String>,
    /// The label that scores a detection
    pub target_label: String,
    /// Pause between playback steps
    pub playback_delay_ms: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            size: 10,
            obstacles: 20,
            seed: None,
            labels: ["bird", "dog", "car", "ice cream", "rain", "flower"]
                .into_iter()
                .map(String::from)
                .collect(),
            target_label: "flower".to_owned(),
            playback_delay_ms: 600,
        }
    }
}

impl WorldConfig {
    /// The rng for this config: seeded if a seed is set, from entropy otherwise
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    pub fn create_world(&self, rng: &mut StdRng) -> GridMap {
        GridMap::random(self.size, self.obstacles, rng)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: WorldConfig = serde_json::from_str(r#"{ "size": 6, "seed": 42 }"#).unwrap();

        assert_eq!(config.size, 6);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.obstacles, 20);
        assert_eq!(config.target_label, "flower");
        assert_eq!(config.labels.len(), 6);
    }

    #[test]
    fn test_seeded_worlds_repeat() {
        let config = WorldConfig {
            seed: Some(9),
            ..Default::default()
        };

        let a = config.create_world(&mut config.rng());
        let b = config.create_world(&mut config.rng());
        assert_eq!(a, b);
        assert_eq!(a.rows, 10);
    }
}
