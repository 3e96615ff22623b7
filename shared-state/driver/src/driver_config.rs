// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use serde::Deserialize;
use shared_state_core::{StoreBackend, WorkloadConfig, DEFAULT_REQUEST_CAPACITY};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub backend: StoreBackend,
    /// Request channel depth of the actor backend
    pub channel_capacity: usize,
    pub workload: WorkloadConfig,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            channel_capacity: DEFAULT_REQUEST_CAPACITY,
            workload: WorkloadConfig::default(),
        }
    }
}

impl DriverConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
