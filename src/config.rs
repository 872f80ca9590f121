//! Settings of the trainer, read from a yaml file.

use crate::error::ConfigError;
use crate::store::SetFormat;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding one file per set.
    pub sets_dir: PathBuf,

    /// Encoding of the set files.
    pub format: SetFormat,

    /// Fixed seed for shuffling, random if not set.
    pub seed: Option<u64>,

    /// Clear the terminal between menus.
    pub clear_screen: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            sets_dir: PathBuf::from("Sets"),
            format: SetFormat::Json,
            seed: None,
            clear_screen: true,
        }
    }
}

impl Config {
    /// Load the config, a missing file gives the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Default::default());
        }
        let file = std::fs::File::open(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_yaml::from_reader(file).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// The random source used for shuffling.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}
