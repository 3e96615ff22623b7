// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Which `KeyValueStore` implementation a driver runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Guarded,
    Actor,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown store backend '{0}': expected guarded or actor")]
pub struct BackendParseError(pub String);

impl FromStr for StoreBackend {
    type Err = BackendParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "guarded" | "mutex" => Ok(StoreBackend::Guarded),
            "actor" => Ok(StoreBackend::Actor),
            other => Err(BackendParseError(other.to_string())),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Guarded => write!(f, "guarded"),
            StoreBackend::Actor => write!(f, "actor"),
        }
    }
}
