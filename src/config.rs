//! Runtime configuration.
//!
//! Layered the usual way: an optional config file first, then
//! `PARAMTREE_`-prefixed environment variables on top. The embedding
//! service decides where the file lives; the loader is a thin facade over
//! the `config` crate.

use crate::logging::LoggingConfig;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration for an embedding service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Device document to load at startup.
    pub device_file: PathBuf,

    /// Override for the import resource directory. Defaults to the
    /// sibling `params` directory of `device_file`.
    #[serde(default)]
    pub params_dir: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a specific file plus environment overrides.
    pub fn load_from_file(path: &Path) -> Result<ModelConfig, ConfigError> {
        Config::builder()
            .add_source(File::from(path))
            .add_source(Environment::with_prefix("PARAMTREE").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Load configuration from the environment alone; `device_file` is
    /// still required.
    pub fn load() -> Result<ModelConfig, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("PARAMTREE").separator("__"))
            .build()?
            .try_deserialize()
    }
}
