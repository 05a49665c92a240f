//! Analysis configuration.
//!
//! Every entry point takes an `AnalysisConfig` explicitly. Files may be JSON
//! or YAML; the format is picked from the extension.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::hash::{ExclusionList, HashMode, StackHasher};
use crate::model::{Architecture, ProcessorFlags};

pub const DEFAULT_MAX_BLOCK_INSTRUCTIONS: usize = 64;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unsupported config file extension for {0} (expected .json, .yaml or .yml)")]
    UnsupportedFormat(PathBuf),

    #[error("max_block_instructions must be at least 1")]
    EmptyBlockLimit,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub architecture: Architecture,
    /// Also treat the faulting instruction's destination-pointer registers
    /// as initial taint.
    pub taint_destination_pointers: bool,
    /// Processor flags at the faulting instruction.
    pub flags: ProcessorFlags,
    pub max_block_instructions: usize,
    pub hash_mode: HashMode,
    /// Wildcard patterns excluded from stack hashes in addition to the
    /// built-in list.
    pub excluded_symbols: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            architecture: Architecture::default(),
            taint_destination_pointers: false,
            flags: ProcessorFlags::default(),
            max_block_instructions: DEFAULT_MAX_BLOCK_INSTRUCTIONS,
            hash_mode: HashMode::default(),
            excluded_symbols: Vec::new(),
        }
    }
}

impl AnalysisConfig {
    /// Load a config from a `.json`, `.yaml` or `.yml` file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let extension =
            path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase());
        let bytes = fs::read(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;

        let config: AnalysisConfig = match extension.as_deref() {
            Some("json") => serde_json::from_slice(&bytes)?,
            Some("yaml") | Some("yml") => serde_yaml::from_slice(&bytes)?,
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_block_instructions == 0 {
            return Err(ConfigError::EmptyBlockLimit);
        }
        Ok(())
    }

    pub fn stack_hasher(&self) -> StackHasher {
        StackHasher::new(self.hash_mode, ExclusionList::new(self.excluded_symbols.iter().cloned()))
    }
}
