// src/config.rs

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    ENGINE_DEPTH, EXCELLENT_FITNESS, FRESH_BLOOD_CHANCE, GENERATIONS, MUTATION_CHANCE,
    POPULATION_SIZE, TARGET_MATE_DEPTHS,
};

const PROFILES_DIR: &str = "profiles";

/// Tunable knobs of one generation run. The defaults are the empirically
/// chosen values from `constants.rs`; they are configuration, not semantics,
/// and can be persisted as named JSON profiles.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GaConfig {
    pub population_size: usize,
    pub generations: u32,
    /// Chance that a bred child is additionally mutated.
    pub mutation_chance: f64,
    /// Chance to inject one freshly sampled board per generation.
    pub fresh_blood_chance: f64,
    pub engine_depth: u32,
    /// Mate distances (in moves) accepted as puzzle material.
    pub target_mate_depths: Vec<u32>,
    /// Early-stop threshold; at default weights this means mate in 1-3.
    pub excellent_fitness: i32,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: POPULATION_SIZE,
            generations: GENERATIONS,
            mutation_chance: MUTATION_CHANCE,
            fresh_blood_chance: FRESH_BLOOD_CHANCE,
            engine_depth: ENGINE_DEPTH,
            target_mate_depths: TARGET_MATE_DEPTHS.to_vec(),
            excellent_fitness: EXCELLENT_FITNESS,
        }
    }
}

pub fn save_profile(name: &str, config: &GaConfig) -> io::Result<()> {
    save_profile_in(Path::new(PROFILES_DIR), name, config)
}

pub fn load_profile(name: &str) -> io::Result<GaConfig> {
    load_profile_in(Path::new(PROFILES_DIR), name)
}

pub fn save_profile_in(dir: &Path, name: &str, config: &GaConfig) -> io::Result<()> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{name}.json"));
    let json = serde_json::to_string_pretty(config)?;
    fs::File::create(path)?.write_all(json.as_bytes())
}

pub fn load_profile_in(dir: &Path, name: &str) -> io::Result<GaConfig> {
    let path = dir.join(format!("{name}.json"));
    let json = fs::read_to_string(path)?;
    serde_json::from_str(&json).map_err(io::Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_profile_round_trip() {
        let dir = tempdir().unwrap();
        let config = GaConfig {
            population_size: 8,
            generations: 3,
            target_mate_depths: vec![1, 2],
            ..GaConfig::default()
        };
        save_profile_in(dir.path(), "short-run", &config).unwrap();
        let loaded = load_profile_in(dir.path(), "short-run").unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_profile_fails() {
        let dir = tempdir().unwrap();
        assert!(load_profile_in(dir.path(), "nope").is_err());
    }
}
